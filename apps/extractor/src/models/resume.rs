//! Canonical résumé schema returned by every provider.
//!
//! The nested shape (`contact_information`, `professional_links`,
//! `experience[].responsibilities`) is the one the extraction prompt asks for.
//! Every field except `full_name` and `contact_information.email` may be
//! missing or `null` in model output, so deserialization is lenient: nulls
//! collapse to defaults and scalar fields accept numbers where strings are
//! expected (models are not consistent about `"2019"` vs `2019`). A section
//! of the wrong shape degrades to its default instead of failing the whole
//! record; list entries that do not fit are dropped one by one.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "default_on_mismatch")]
    pub contact_information: ContactInformation,
    #[serde(default, deserialize_with = "default_on_mismatch")]
    pub professional_links: ProfessionalLinks,
    #[serde(default, deserialize_with = "lenient_string")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_experience_years: Option<f64>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub education: Vec<EducationEntry>,
    #[serde(default, deserialize_with = "default_on_mismatch")]
    pub skills: Skills,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub certifications: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInformation {
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfessionalLinks {
    #[serde(default, deserialize_with = "lenient_string")]
    pub linkedin: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub github: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub portfolio: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub position: Option<String>,
    /// Free text as written on the résumé, e.g. "Jan 2019 – Mar 2022".
    #[serde(default, deserialize_with = "lenient_string")]
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub responsibilities: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub institution: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub degree: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub graduation_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skills {
    #[serde(default, deserialize_with = "lenient_strings")]
    pub technical: Vec<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub soft: Vec<String>,
}

/// The legacy in-band failure shape: `{"error": true, "message": ..., "provider": ...}`.
///
/// Kept so the string-returning dispatch entry point and the front end can
/// still speak the envelope contract; typed callers use `ExtractionError`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: bool,
    pub message: String,
    pub provider: String,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            error: true,
            message: message.into(),
            provider: provider.into(),
        }
    }

    /// Returns the envelope if `value` carries a truthy `error` field.
    pub fn detect(value: &Value) -> Option<Self> {
        let flagged = match value.get("error") {
            Some(Value::Bool(b)) => *b,
            Some(Value::Null) | None => false,
            Some(_) => true,
        };
        if !flagged {
            return None;
        }
        Some(Self::new(
            value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error"),
            value
                .get("provider")
                .and_then(Value::as_str)
                .unwrap_or_default(),
        ))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| {
            r#"{"error": true, "message": "unserializable error", "provider": ""}"#.to_string()
        })
    }
}

fn default_on_mismatch<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Arrays keep the entries that fit `T`; a lone value is a one-entry list.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(list_items(Value::deserialize(deserializer)?)
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// Like [`lenient_list`] for plain strings: scalars are stringified and
/// objects contribute their `name` or `title`.
fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(list_items(Value::deserialize(deserializer)?)
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Object(map) => ["name", "title"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
                .map(String::from),
            _ => None,
        })
        .filter(|s| !s.trim().is_empty())
        .collect())
}

fn list_items(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        single => vec![single],
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('+').trim().parse().ok(),
        _ => None,
    })
}
