//! Document Text Extractor: turns an uploaded or downloaded résumé file into
//! one plain-text string.
//!
//! Parsing is delegated to `pdf-extract` (PDF) and a zip + XML walk over the
//! OOXML package (DOCX). Callers own the file: nothing here moves or deletes it.

use std::path::Path;

use thiserror::Error;
use tracing::{error, warn};

mod docx;
mod pdf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Maps a file name to a kind by extension (case-insensitive).
    /// Legacy `.doc` and anything else yield an `Unsupported` error.
    pub fn from_file_name(name: &str) -> Result<Self, DocumentError> {
        let lower = name.to_lowercase();
        match lower.rsplit_once('.').map(|(_, ext)| ext) {
            Some("pdf") => Ok(DocumentKind::Pdf),
            Some("docx") => Ok(DocumentKind::Docx),
            Some(ext) => Err(DocumentError::Unsupported(format!(".{ext}"))),
            None => Err(DocumentError::Unsupported("no extension".to_string())),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Docx => "docx",
        }
    }
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Unsupported document type: {0}")]
    Unsupported(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("DOCX package error: {0}")]
    Package(#[from] zip::result::ZipError),

    #[error("DOCX XML error: {0}")]
    Xml(String),

    #[error("Document contains no extractable text")]
    Empty,
}

/// Extracts the text of `path`, parsed as `kind`.
///
/// PDF pages are concatenated in page order; DOCX paragraphs are joined with
/// newlines. A document that parses but yields only whitespace is reported as
/// `DocumentError::Empty`, never as an empty success.
pub fn extract_text(path: &Path, kind: DocumentKind) -> Result<String, DocumentError> {
    let text = match kind {
        DocumentKind::Pdf => pdf::extract(path)?,
        DocumentKind::Docx => docx::extract(path)?,
    };

    if text.trim().is_empty() {
        return Err(DocumentError::Empty);
    }
    Ok(text)
}

/// Boundary form used by the pipelines: the cause is logged, the caller only
/// learns whether text came back.
pub fn read_text(path: &Path, kind: DocumentKind) -> Option<String> {
    match extract_text(path, kind) {
        Ok(text) => Some(text),
        Err(DocumentError::Empty) => {
            warn!("No text extracted from {}", path.display());
            None
        }
        Err(e) => {
            error!("Could not read text from {}. Error: {e}", path.display());
            None
        }
    }
}

/// Same as [`read_text`] but resolves the kind from the file name first.
pub fn read_text_by_name(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_string_lossy();
    match DocumentKind::from_file_name(&name) {
        Ok(kind) => read_text(path, kind),
        Err(e) => {
            warn!(
                "Skipping {}: {e}. Please convert to DOCX or PDF for processing.",
                path.display()
            );
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    /// Builds a minimal DOCX package whose body holds one `<w:p>` per paragraph.
    pub(crate) fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| format!(r#"<w:p><w:r><w:t xml:space="preserve">{p}</w:t></w:r></w:p>"#))
            .collect();
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );

        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("[Content_Types].xml", options).unwrap();
        writer.write_all(b"<Types/>").unwrap();
        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    /// Builds a minimal PDF with one Helvetica text line per page, pages in
    /// the given order. Cross-reference offsets are computed as the file is
    /// assembled.
    pub(crate) fn pdf_bytes(pages: &[&str]) -> Vec<u8> {
        let font_id = 3;
        let page_ids: Vec<usize> = (0..pages.len()).map(|i| 4 + 2 * i).collect();

        let mut objects: Vec<String> = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                page_ids
                    .iter()
                    .map(|id| format!("{id} 0 R"))
                    .collect::<Vec<_>>()
                    .join(" "),
                pages.len()
            ),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
        ];
        for (page, id) in pages.iter().zip(&page_ids) {
            let content = format!("BT /F1 18 Tf 72 720 Td ({page}) Tj ET");
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 {font_id} 0 R >> >> /Contents {} 0 R >>",
                id + 1
            ));
            objects.push(format!(
                "<< /Length {} >>\nstream\n{content}\nendstream",
                content.len()
            ));
        }

        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
        }

        let xref_at = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets {
            out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
                objects.len() + 1
            )
            .as_bytes(),
        );
        out
    }

    #[test]
    fn test_pdf_pages_concatenated_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cv.pdf");
        std::fs::write(&path, pdf_bytes(&["AlphaPage", "OmegaPage"])).unwrap();

        let text = extract_text(&path, DocumentKind::Pdf).unwrap();
        let first = text.find("AlphaPage").expect("first page text");
        let second = text.find("OmegaPage").expect("second page text");
        assert!(first < second, "pages out of order: {text:?}");
        assert!(path.exists(), "extractor must not remove the file");
    }

    #[test]
    fn test_kind_from_file_name() {
        assert_eq!(
            DocumentKind::from_file_name("CV.PDF").unwrap(),
            DocumentKind::Pdf
        );
        assert_eq!(
            DocumentKind::from_file_name("jane doe.docx").unwrap(),
            DocumentKind::Docx
        );
        assert!(matches!(
            DocumentKind::from_file_name("Resume Roly Sinha.doc"),
            Err(DocumentError::Unsupported(ext)) if ext == ".doc"
        ));
        assert!(DocumentKind::from_file_name("README").is_err());
    }

    #[test]
    fn test_docx_paragraphs_joined_with_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cv.docx");
        std::fs::write(&path, docx_bytes(&["Jane Doe", "jane@x.com"])).unwrap();

        let text = extract_text(&path, DocumentKind::Docx).unwrap();
        assert_eq!(text, "Jane Doe\njane@x.com");
        assert!(path.exists(), "extractor must not remove the file");
    }

    #[test]
    fn test_blank_docx_is_empty_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.docx");
        std::fs::write(&path, docx_bytes(&["   ", ""])).unwrap();

        assert!(matches!(
            extract_text(&path, DocumentKind::Docx),
            Err(DocumentError::Empty)
        ));
        assert!(read_text(&path, DocumentKind::Docx).is_none());
    }

    #[test]
    fn test_corrupt_files_fail_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("broken.pdf");
        let docx = dir.path().join("broken.docx");
        std::fs::write(&pdf, b"%PDF-1.4 this is not really a pdf").unwrap();
        std::fs::write(&docx, b"not a zip archive").unwrap();

        assert!(read_text(&pdf, DocumentKind::Pdf).is_none());
        assert!(matches!(
            extract_text(&docx, DocumentKind::Docx),
            Err(DocumentError::Package(_))
        ));
    }

    #[test]
    fn test_read_text_by_name_rejects_doc() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.doc");
        std::fs::write(&path, b"\xD0\xCF\x11\xE0").unwrap();

        assert!(read_text_by_name(&path).is_none());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.docx");
        assert!(matches!(
            extract_text(&path, DocumentKind::Docx),
            Err(DocumentError::Io(_))
        ));
    }
}
