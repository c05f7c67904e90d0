use std::io::Write;

use anyhow::Context;
use axum::extract::{Multipart, State};
use axum::response::Html;
use tracing::info;

use crate::document;
use crate::errors::AppError;
use crate::llm_client::{decode_response, Provider};
use crate::routes::upload::parse_upload;
use crate::state::AppState;
use crate::template;

/// GET /
pub async fn index_handler() -> Html<String> {
    template::render_index(None)
}

/// POST /process
/// Extracts one uploaded résumé and renders either the record or an error.
pub async fn process_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Html<String>, AppError> {
    let upload = parse_upload(multipart).await?;
    let provider: Provider = upload.provider.parse()?;

    // Staged under a unique name so concurrent uploads never collide; the
    // file is gone as soon as `staged` drops at the end of the closure.
    let upload_dir = state.config.upload_dir.clone();
    let kind = upload.kind;
    let data = upload.data;
    let text = tokio::task::spawn_blocking(move || -> anyhow::Result<Option<String>> {
        std::fs::create_dir_all(&upload_dir)
            .with_context(|| format!("Failed to create {}", upload_dir.display()))?;
        let mut staged = tempfile::Builder::new()
            .prefix("upload_")
            .suffix(&format!(".{}", kind.extension()))
            .tempfile_in(&upload_dir)?;
        staged.write_all(&data)?;
        staged.flush()?;
        Ok(document::read_text(staged.path(), kind))
    })
    .await
    .context("text extraction task failed")??;

    let text = text.ok_or(AppError::UnreadableDocument)?;
    info!(
        "Extracted {} characters, dispatching to {}",
        text.len(),
        provider
    );

    // Failures come back in-band as an error envelope and decode to
    // `ExtractionError::Reported`.
    let raw = state.dispatcher.dispatch_json(provider.as_str(), &text).await;
    let extracted = decode_response(&raw)?;

    Ok(template::render_result(
        provider.as_str(),
        &extracted.record,
        &extracted.raw,
    ))
}
