//! Batch Runner: processes a list of remote résumé URLs into per-candidate
//! JSON files and one CSV report.
//!
//! Each URL moves through download → text extraction → dispatch → save and
//! always ends as exactly one report row, whatever happens. A failing URL
//! never stops the run. Downloads are staged as `tempfile` files that are
//! removed when the item finishes, on every exit path.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tempfile::NamedTempFile;
use tracing::{error, info, warn};

use super::flatten::{file_stem_for, flatten, FlatRecord};
use super::report::{save_json, write_report};
use crate::document;
use crate::llm_client::{Dispatcher, ExtractedResume, ExtractionError, Provider};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(20);

/// Terminal state of one URL. `Display` gives the exact report string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    Processed,
    InvalidUrl,
    DownloadFailed,
    TextExtractionFailed,
    ParserError(String),
    JsonDecode,
    SaveFailed,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemStatus::Processed => f.write_str("Processed"),
            ItemStatus::InvalidUrl => f.write_str("Skipped - Invalid URL"),
            ItemStatus::DownloadFailed => f.write_str("Failed - Download"),
            ItemStatus::TextExtractionFailed => {
                f.write_str("Failed - Text Extraction or Unsupported .doc")
            }
            ItemStatus::ParserError(message) => write!(f, "Failed - Parser Error: {message}"),
            ItemStatus::JsonDecode => f.write_str("Failed - JSON Decode"),
            ItemStatus::SaveFailed => f.write_str("Failed - Save JSON"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub provider: Provider,
    pub report_path: PathBuf,
    pub output_dir: PathBuf,
    pub download_dir: PathBuf,
    /// Items in flight at once; 1 processes strictly one after another.
    pub concurrency: usize,
}

pub struct BatchRunner {
    http: Client,
    dispatcher: Dispatcher,
    settings: BatchSettings,
}

impl BatchRunner {
    pub fn new(http: Client, dispatcher: Dispatcher, settings: BatchSettings) -> Self {
        Self {
            http,
            dispatcher,
            settings,
        }
    }

    /// Processes every URL and writes the report. Rows come back in input
    /// order, one per URL. An empty list writes nothing.
    pub async fn run(&self, urls: &[String]) -> Result<Vec<FlatRecord>> {
        if urls.is_empty() {
            warn!("The URL list is empty. Nothing to process.");
            return Ok(Vec::new());
        }

        for dir in [&self.settings.output_dir, &self.settings.download_dir] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let rows: Vec<FlatRecord> = stream::iter(urls)
            .map(|url| self.process_url(url))
            .buffered(self.settings.concurrency.max(1))
            .collect()
            .await;

        write_report(&self.settings.report_path, &rows)?;
        let processed = rows.iter().filter(|r| r.status == "Processed").count();
        info!(
            "--- Extraction complete: {processed}/{} processed. Report saved to '{}' ---",
            rows.len(),
            self.settings.report_path.display()
        );
        Ok(rows)
    }

    async fn process_url(&self, url: &str) -> FlatRecord {
        info!("--- Processing URL: {url} ---");

        if !is_valid_url(url) {
            warn!("Skipping invalid URL: {url}");
            return FlatRecord::failed(url, ItemStatus::InvalidUrl.to_string());
        }

        let staged = match self.download(url).await {
            Ok(file) => {
                info!("Downloaded: {url}");
                file
            }
            Err(e) => {
                error!("Download failed for {url}. Error: {e:#}");
                return FlatRecord::failed(url, ItemStatus::DownloadFailed.to_string());
            }
        };

        // `staged` lives until the end of this function; dropping it deletes
        // the file no matter which branch returns.
        let path = staged.path().to_path_buf();
        let text = tokio::task::spawn_blocking(move || document::read_text_by_name(&path))
            .await
            .ok()
            .flatten();
        let Some(text) = text else {
            return FlatRecord::failed(url, ItemStatus::TextExtractionFailed.to_string());
        };

        match self.dispatcher.extract(self.settings.provider, &text).await {
            Ok(extracted) => self.persist(url, &extracted),
            Err(ExtractionError::Decode { raw, source }) => {
                error!("Could not decode response for {url}: {source}. Raw: {raw}");
                FlatRecord::failed(url, ItemStatus::JsonDecode.to_string())
            }
            Err(e) => FlatRecord::failed(url, ItemStatus::ParserError(e.to_string()).to_string()),
        }
    }

    /// Fetches `url` into a uniquely named temp file in the download
    /// directory, keeping the extension the document kind is inferred from.
    async fn download(&self, url: &str) -> Result<NamedTempFile> {
        let response = self
            .http
            .get(url)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_lowercase();
        let name = download_file_name(url, &content_type);
        let bytes = response.bytes().await?;

        let suffix = name
            .rsplit_once('.')
            .map(|(_, ext)| format!(".{ext}"))
            .unwrap_or_default();
        let mut file = tempfile::Builder::new()
            .prefix("resume_")
            .suffix(&suffix)
            .tempfile_in(&self.settings.download_dir)?;
        file.write_all(&bytes)?;
        file.flush()?;
        Ok(file)
    }

    /// Saves the model's JSON verbatim and flattens it into a row. Two
    /// candidates with the same sanitized name share one file; the later
    /// write wins.
    fn persist(&self, url: &str, extracted: &ExtractedResume) -> FlatRecord {
        let stem = file_stem_for(&extracted.record);
        match save_json(&self.settings.output_dir, &stem, &extracted.raw) {
            Ok(path) => {
                info!("Saved parsed JSON to {}", path.display());
                flatten(&extracted.record, url, &ItemStatus::Processed.to_string())
            }
            Err(e) => {
                error!("Could not save JSON for {url}: {e:#}");
                FlatRecord::failed(url, ItemStatus::SaveFailed.to_string())
            }
        }
    }
}

fn is_valid_url(url: &str) -> bool {
    url.starts_with("http") && reqwest::Url::parse(url).is_ok()
}

/// Local file name for a download: the last path segment without the query,
/// with `.pdf` / `.docx` appended when the content type says so and the name
/// lacks a matching extension.
fn download_file_name(url: &str, content_type: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let last = without_query.rsplit('/').next().unwrap_or_default();
    let mut name = if last.is_empty() {
        "resume".to_string()
    } else {
        last.to_string()
    };

    let lower = name.to_lowercase();
    if content_type.contains("pdf") && !lower.ends_with(".pdf") {
        name.push_str(".pdf");
    } else if content_type.contains("word")
        && !(lower.ends_with(".docx") || lower.ends_with(".doc"))
    {
        name.push_str(".docx");
    }
    name
}

/// Reads a URL list: one per line, blank lines and `#` comments skipped.
pub fn load_urls(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read URL list {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}
