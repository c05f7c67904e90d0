use axum::response::Html;
use serde_json::Value;

use crate::models::resume::ResumeRecord;

const INDEX_HTML: &str = include_str!("../templates/index.html");

/// Renders the upload page with an optional flash message.
pub fn render_index(flash: Option<&str>) -> Html<String> {
    render(flash, String::new())
}

/// Renders the upload page followed by an extracted record.
pub fn render_result(provider: &str, record: &ResumeRecord, raw: &Value) -> Html<String> {
    let mut rows = String::new();
    let mut row = |label: &str, value: &str| {
        if !value.is_empty() {
            rows.push_str(&format!(
                "<tr><th>{label}</th><td>{}</td></tr>",
                html_escape(value)
            ));
        }
    };

    let field = |v: &Option<String>| v.clone().unwrap_or_default();
    row("Full name", &field(&record.full_name));
    row("Email", &field(&record.contact_information.email));
    row("Phone", &field(&record.contact_information.phone));
    row("LinkedIn", &field(&record.professional_links.linkedin));
    row("GitHub", &field(&record.professional_links.github));
    row("Portfolio", &field(&record.professional_links.portfolio));
    row("Summary", &field(&record.summary));
    for job in &record.experience {
        row(
            "Experience",
            &format!(
                "{} at {} ({})",
                field(&job.position),
                field(&job.company),
                field(&job.duration)
            ),
        );
    }
    for school in &record.education {
        row(
            "Education",
            &format!("{}, {}", field(&school.degree), field(&school.institution)),
        );
    }
    row("Technical skills", &record.skills.technical.join(", "));
    row("Soft skills", &record.skills.soft.join(", "));
    row("Certifications", &record.certifications.join(", "));

    let pretty = serde_json::to_string_pretty(raw).unwrap_or_default();
    let result = format!(
        "<section><h2>Extracted with {}</h2><table>{rows}</table><pre>{}</pre></section>",
        html_escape(provider),
        html_escape(&pretty)
    );
    render(None, result)
}

fn render(flash: Option<&str>, result: String) -> Html<String> {
    let flash = flash
        .map(|msg| format!(r#"<div class="flash">{}</div>"#, html_escape(msg)))
        .unwrap_or_default();
    Html(
        INDEX_HTML
            .replace("{{ flash }}", &flash)
            .replace("{{ result }}", &result),
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flash_is_escaped() {
        let Html(page) = render_index(Some("<script>alert(1)</script>"));
        assert!(page.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!page.contains("{{ flash }}"));
        assert!(!page.contains("{{ result }}"));
    }

    #[test]
    fn test_result_shows_record_without_flash() {
        let raw = json!({"full_name": "Jane Doe", "skills": {"technical": ["Rust"], "soft": []}});
        let record: ResumeRecord = serde_json::from_value(raw.clone()).unwrap();
        let Html(page) = render_result("gemini", &record, &raw);

        assert!(page.contains("<th>Full name</th><td>Jane Doe</td>"));
        assert!(page.contains("<th>Technical skills</th><td>Rust</td>"));
        assert!(!page.contains("Soft skills"));
        assert!(!page.contains(r#"class="flash""#));
    }
}
