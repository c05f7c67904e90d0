//! Result Normalizer: flattens a `ResumeRecord` into one report row.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::models::resume::{ExperienceEntry, ResumeRecord};

/// Four-digit tokens that plausibly are years (1980–2099).
static YEAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(19[89]\d|20\d\d)\b").expect("year pattern is valid")
});

/// Stem used for saved JSON when the candidate has no usable name.
pub const FALLBACK_FILE_STEM: &str = "parsed_resume";

/// One CSV row. Field order is the report's column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlatRecord {
    #[serde(rename = "Resume_URL")]
    pub resume_url: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "YearsOfExperience")]
    pub years_of_experience: String,
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "Skills")]
    pub skills: String,
    #[serde(rename = "FullName")]
    pub full_name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Phone")]
    pub phone: String,
    #[serde(rename = "LinkedIn")]
    pub linkedin: String,
    #[serde(rename = "GitHub")]
    pub github: String,
    #[serde(rename = "Portfolio")]
    pub portfolio: String,
    #[serde(rename = "Summary")]
    pub summary: String,
    #[serde(rename = "FullExperience")]
    pub full_experience: String,
}

impl FlatRecord {
    /// A row for a URL that never produced a record.
    pub fn failed(url: &str, status: impl Into<String>) -> Self {
        Self {
            resume_url: url.to_string(),
            status: status.into(),
            ..Default::default()
        }
    }
}

/// Flattens `record` into a row. The latest job is the first experience entry
/// as the model ordered it; entries are not re-sorted by date.
pub fn flatten(record: &ResumeRecord, url: &str, status: &str) -> FlatRecord {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();

    let latest = record.experience.first();
    let skills: Vec<&str> = record
        .skills
        .technical
        .iter()
        .chain(&record.skills.soft)
        .map(String::as_str)
        .collect();

    FlatRecord {
        resume_url: url.to_string(),
        status: status.to_string(),
        title: latest.map(|j| text(&j.position)).unwrap_or_default(),
        years_of_experience: format_years(years_of_experience(record)),
        company: latest.map(|j| text(&j.company)).unwrap_or_default(),
        skills: skills.join(", "),
        full_name: text(&record.full_name),
        email: text(&record.contact_information.email),
        phone: text(&record.contact_information.phone),
        linkedin: text(&record.professional_links.linkedin),
        github: text(&record.professional_links.github),
        portfolio: text(&record.professional_links.portfolio),
        summary: text(&record.summary),
        full_experience: record
            .experience
            .iter()
            .map(|j| {
                format!(
                    "{} at {} ({})",
                    text(&j.position),
                    text(&j.company),
                    text(&j.duration)
                )
            })
            .collect::<Vec<_>>()
            .join(" | "),
    }
}

/// The model's total when it is present and non-zero, otherwise the
/// duration-scan fallback.
pub fn years_of_experience(record: &ResumeRecord) -> f64 {
    match record.total_experience_years {
        Some(years) if years != 0.0 => years,
        _ => f64::from(experience_years_fallback(&record.experience)),
    }
}

/// Scans every duration string for years in 1980–2099.
///
/// Two or more distinct years give `max - min`; a single year gives 1 (at
/// least a year, span unknown); none gives 0.
pub fn experience_years_fallback(experience: &[ExperienceEntry]) -> u32 {
    let years: BTreeSet<u32> = experience
        .iter()
        .filter_map(|job| job.duration.as_deref())
        .flat_map(|duration| YEAR_RE.find_iter(duration))
        .filter_map(|m| m.as_str().parse().ok())
        .collect();

    match (years.first(), years.last()) {
        (Some(min), Some(max)) if min != max => max - min,
        (Some(_), Some(_)) => 1,
        _ => 0,
    }
}

fn format_years(years: f64) -> String {
    if years.fract() == 0.0 {
        format!("{}", years as i64)
    } else {
        years.to_string()
    }
}

/// Reduces a candidate name to a filesystem-safe stem: alphanumerics, spaces
/// and underscores kept, trimmed, spaces turned into underscores. Applying it
/// twice gives the same result as applying it once.
pub fn sanitize_file_stem(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '_')
        .collect();
    kept.trim().replace(' ', "_")
}

/// The JSON file stem for a record, falling back to [`FALLBACK_FILE_STEM`].
pub fn file_stem_for(record: &ResumeRecord) -> String {
    let stem = record
        .full_name
        .as_deref()
        .map(sanitize_file_stem)
        .unwrap_or_default();
    if stem.is_empty() {
        FALLBACK_FILE_STEM.to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{ContactInformation, ProfessionalLinks, Skills};

    fn job(position: &str, company: &str, duration: &str) -> ExperienceEntry {
        ExperienceEntry {
            company: Some(company.to_string()),
            position: Some(position.to_string()),
            duration: Some(duration.to_string()),
            responsibilities: vec![],
        }
    }

    fn jane() -> ResumeRecord {
        ResumeRecord {
            full_name: Some("Jane Doe".into()),
            contact_information: ContactInformation {
                email: Some("jane@x.com".into()),
                phone: None,
            },
            professional_links: ProfessionalLinks {
                linkedin: Some("https://linkedin.com/in/jane".into()),
                ..Default::default()
            },
            experience: vec![
                job("Engineer", "Acme Corp", "2019–2022"),
                job("Intern", "Initech", "Summer 2018"),
            ],
            skills: Skills {
                technical: vec!["Rust".into(), "SQL".into()],
                soft: vec!["Teamwork".into()],
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_fallback_span_of_distinct_years() {
        let exp = vec![job("A", "X", "2015 - 2016"), job("B", "Y", "Jan 2018 to present")];
        assert_eq!(experience_years_fallback(&exp), 3);
    }

    #[test]
    fn test_fallback_single_year_is_one() {
        assert_eq!(experience_years_fallback(&[job("A", "X", "2020")]), 1);
        assert_eq!(experience_years_fallback(&[job("A", "X", "2020 - 2020")]), 1);
    }

    #[test]
    fn test_fallback_without_years_is_zero() {
        assert_eq!(experience_years_fallback(&[job("A", "X", "6 months")]), 0);
        assert_eq!(experience_years_fallback(&[]), 0);
    }

    #[test]
    fn test_fallback_ignores_out_of_range_and_embedded_digits() {
        let exp = vec![job("A", "X", "1975 - 2101, ref 120199, 2010")];
        assert_eq!(experience_years_fallback(&exp), 1);
    }

    #[test]
    fn test_model_total_wins_over_fallback() {
        let mut record = jane();
        record.total_experience_years = Some(5.0);
        assert_eq!(years_of_experience(&record), 5.0);

        record.total_experience_years = Some(0.0);
        assert_eq!(years_of_experience(&record), 4.0);

        record.total_experience_years = None;
        assert_eq!(years_of_experience(&record), 4.0);
    }

    #[test]
    fn test_flatten_full_record() {
        let row = flatten(&jane(), "https://x/cv.docx", "Processed");
        assert_eq!(row.resume_url, "https://x/cv.docx");
        assert_eq!(row.status, "Processed");
        assert_eq!(row.title, "Engineer");
        assert_eq!(row.company, "Acme Corp");
        assert_eq!(row.years_of_experience, "4");
        assert_eq!(row.skills, "Rust, SQL, Teamwork");
        assert_eq!(row.full_name, "Jane Doe");
        assert_eq!(row.email, "jane@x.com");
        assert_eq!(row.phone, "");
        assert_eq!(row.linkedin, "https://linkedin.com/in/jane");
        assert_eq!(
            row.full_experience,
            "Engineer at Acme Corp (2019–2022) | Intern at Initech (Summer 2018)"
        );
    }

    #[test]
    fn test_flatten_empty_record_never_panics() {
        let row = flatten(&ResumeRecord::default(), "u", "Processed");
        assert_eq!(row.title, "");
        assert_eq!(row.company, "");
        assert_eq!(row.skills, "");
        assert_eq!(row.years_of_experience, "0");
        assert_eq!(row.full_experience, "");
    }

    #[test]
    fn test_fractional_years_kept() {
        let record = ResumeRecord {
            total_experience_years: Some(2.5),
            ..Default::default()
        };
        assert_eq!(flatten(&record, "u", "Processed").years_of_experience, "2.5");
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("Jane Doe"), "Jane_Doe");
        assert_eq!(sanitize_file_stem("  Dr. Ipsa O'Ratha, PhD "), "Dr_Ipsa_ORatha_PhD");
        assert_eq!(sanitize_file_stem("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_file_stem("Zoë Ünal"), "Zoë_Ünal");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        for name in ["Jane Doe", "  a  b ", "x/y\\z", "Sanjana CV (1)-2", "___"] {
            let once = sanitize_file_stem(name);
            assert_eq!(sanitize_file_stem(&once), once, "input {name:?}");
        }
    }

    #[test]
    fn test_file_stem_fallback() {
        assert_eq!(file_stem_for(&jane()), "Jane_Doe");
        assert_eq!(file_stem_for(&ResumeRecord::default()), FALLBACK_FILE_STEM);
        let symbols = ResumeRecord {
            full_name: Some("!!!".into()),
            ..Default::default()
        };
        assert_eq!(file_stem_for(&symbols), FALLBACK_FILE_STEM);
    }
}
