use axum::extract::Multipart;

use crate::document::DocumentKind;
use crate::errors::AppError;

const FILE_FIELD: &str = "pdf_doc";
const DEFAULT_PROVIDER: &str = "gemini";

/// An uploaded résumé with its form fields.
pub struct ResumeUpload {
    pub kind: DocumentKind,
    pub data: Vec<u8>,
    pub provider: String,
}

/// Parse the upload form: one file (`pdf_doc`) plus an optional `provider`.
pub async fn parse_upload(mut multipart: Multipart) -> Result<ResumeUpload, AppError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut provider: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read form field: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            FILE_FIELD => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read file data: {e}")))?;
                file = Some((filename, data.to_vec()));
            }
            "provider" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read provider: {e}")))?;
                if !value.trim().is_empty() {
                    provider = Some(value);
                }
            }
            _ => {
                // Unknown fields are drained but a broken body still fails the form
                field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read form field {name}: {e}"))
                })?;
            }
        }
    }

    let (filename, data) =
        file.ok_or_else(|| AppError::Validation("No file part in the request.".to_string()))?;
    if filename.trim().is_empty() {
        return Err(AppError::Validation("No file selected.".to_string()));
    }
    let kind = DocumentKind::from_file_name(&filename).map_err(|_| {
        AppError::Validation("Invalid file type. Please upload a PDF or DOCX.".to_string())
    })?;

    Ok(ResumeUpload {
        kind,
        data,
        provider: provider.unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
    })
}
