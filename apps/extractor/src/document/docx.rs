use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use super::DocumentError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Reads the main document part of a DOCX package and returns its paragraphs
/// in document order, one per line.
pub(super) fn extract(path: &Path) -> Result<String, DocumentError> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let mut xml = String::new();
    archive.by_name(DOCUMENT_PART)?.read_to_string(&mut xml)?;

    Ok(paragraphs(&xml)?.join("\n"))
}

/// Walks WordprocessingML, collecting the text runs (`w:t`) of each `w:p`.
///
/// Paragraphs nest: a text box (`w:txbxContent`) sits inside a run of its
/// anchor paragraph, so open paragraphs are kept on a stack and each one is
/// emitted when it closes. `mc:Fallback` repeats the `mc:Choice` content of
/// the same drawing and is skipped. Tabs and explicit breaks are preserved.
fn paragraphs(xml: &str) -> Result<Vec<String>, DocumentError> {
    let mut reader = Reader::from_str(xml);

    let mut out = Vec::new();
    let mut open: Vec<String> = Vec::new();
    let mut in_text = false;
    let mut fallback_depth = 0usize;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| DocumentError::Xml(e.to_string()))?;

        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Fallback" => fallback_depth += 1,
                _ if fallback_depth > 0 => {}
                b"p" => open.push(String::new()),
                b"t" if !open.is_empty() => in_text = true,
                _ => {}
            },
            Event::Empty(e) if fallback_depth == 0 => {
                let current = open.last_mut();
                match (e.local_name().as_ref(), current) {
                    (b"p", _) => out.push(String::new()),
                    (b"tab", Some(current)) => current.push('\t'),
                    (b"br" | b"cr", Some(current)) => current.push('\n'),
                    _ => {}
                }
            }
            Event::Text(t) if in_text && fallback_depth == 0 => {
                let text = t
                    .unescape()
                    .map_err(|e| DocumentError::Xml(e.to_string()))?;
                if let Some(current) = open.last_mut() {
                    current.push_str(&text);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"Fallback" => fallback_depth = fallback_depth.saturating_sub(1),
                _ if fallback_depth > 0 => {}
                b"t" => in_text = false,
                b"p" => {
                    in_text = false;
                    if let Some(done) = open.pop() {
                        out.push(done);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(out)
}
