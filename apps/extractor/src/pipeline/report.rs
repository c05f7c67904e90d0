//! CSV report and per-résumé JSON output.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

use super::flatten::FlatRecord;

/// Report header, in `FlatRecord` field order.
pub const REPORT_COLUMNS: [&str; 14] = [
    "Resume_URL",
    "Status",
    "Title",
    "YearsOfExperience",
    "Company",
    "Skills",
    "FullName",
    "Email",
    "Phone",
    "LinkedIn",
    "GitHub",
    "Portfolio",
    "Summary",
    "FullExperience",
];

/// Writes `rows` as CSV. The header is always present, even with no rows.
pub fn write_report(path: &Path, rows: &[FlatRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create report {}", path.display()))?;

    writer.write_record(REPORT_COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes `value` pretty-printed with four-space indentation to
/// `<dir>/<stem>.json`, replacing any existing file of that name.
pub fn save_json(dir: &Path, stem: &str, value: &Value) -> Result<PathBuf> {
    let path = dir.join(format!("{stem}.json"));
    let file =
        File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;

    let mut ser = serde_json::Serializer::with_formatter(file, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    ser.into_inner().flush()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_header_only_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/report.csv");
        write_report(&path, &[]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim_end(), REPORT_COLUMNS.join(","));
    }

    #[test]
    fn test_rows_follow_column_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let rows = vec![
            FlatRecord {
                resume_url: "https://x/a.pdf".into(),
                status: "Processed".into(),
                title: "Engineer".into(),
                years_of_experience: "3".into(),
                skills: "Rust, SQL".into(),
                full_name: "Jane Doe".into(),
                ..Default::default()
            },
            FlatRecord::failed("ftp://nope", "Skipped - Invalid URL"),
        ];
        write_report(&path, &rows).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), REPORT_COLUMNS.to_vec());

        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][0], "https://x/a.pdf");
        assert_eq!(&records[0][3], "3");
        assert_eq!(&records[0][5], "Rust, SQL");
        assert_eq!(&records[0][6], "Jane Doe");
        assert_eq!(&records[1][1], "Skipped - Invalid URL");
        assert_eq!(&records[1][2], "");
    }

    #[test]
    fn test_save_json_uses_four_space_indent_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        save_json(dir.path(), "Jane_Doe", &json!({"full_name": "First"})).unwrap();
        let path = save_json(dir.path(), "Jane_Doe", &json!({"full_name": "Second"})).unwrap();

        assert_eq!(path, dir.path().join("Jane_Doe.json"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "{\n    \"full_name\": \"Second\"\n}");
    }
}
