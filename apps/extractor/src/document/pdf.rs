use std::panic;
use std::path::Path;

use super::DocumentError;

/// Extracts text from every page in order.
///
/// `pdf-extract` panics on some malformed inputs instead of returning an
/// error, so the call is isolated with `catch_unwind`.
pub(super) fn extract(path: &Path) -> Result<String, DocumentError> {
    let bytes = std::fs::read(path)?;

    let outcome = panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes));
    match outcome {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(DocumentError::Pdf(e.to_string())),
        Err(_) => Err(DocumentError::Pdf(
            "parser aborted on malformed document".to_string(),
        )),
    }
}
