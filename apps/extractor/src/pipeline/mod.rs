//! Batch pipeline: flatten decoded résumés into report rows and drive the
//! download → extract → dispatch → persist loop over a URL list.

pub mod batch;
pub mod flatten;
pub mod report;
