use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::llm_client::ExtractionError;
use crate::template;

/// Front-end error type. Every variant renders as the upload page with a
/// user-facing message; internal details only go to the log.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Could not extract text from the file. The file might be empty or corrupted.")]
    UnreadableDocument,

    #[error("The model failed to respond usefully ({provider}): {message}")]
    Extraction { provider: String, message: String },

    #[error("Failed to parse the response from the AI. Raw response: {0}")]
    Decode(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::Decode { raw, .. } => AppError::Decode(raw),
            unknown @ ExtractionError::UnknownProvider(_) => AppError::Validation(unknown.to_string()),
            other => AppError::Extraction {
                provider: other.provider_label(),
                message: other.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::UnreadableDocument => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            AppError::Extraction { .. } | AppError::Decode(_) => {
                tracing::error!("Extraction error: {self}");
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred".to_string(),
                )
            }
        };

        (status, template::render_index(Some(&message))).into_response()
    }
}
