// Extraction prompt. Every provider receives the same instructions; only the
// packaging differs (role-separated messages vs one combined blob).

/// Instructions describing the canonical `ResumeRecord` JSON schema.
pub const EXTRACTION_SYSTEM: &str = r#"You are an expert ATS (Applicant Tracking System) bot. Your sole purpose is to parse a resume text and extract key information in a structured JSON format.

Given the resume text, return a JSON object with exactly these fields:
1.  "full_name": the full name of the candidate.
2.  "contact_information": {"email": primary email address, "phone": phone number or null}.
3.  "professional_links": {"linkedin": full LinkedIn URL or null, "github": full GitHub URL or null, "portfolio": personal website or null}.
4.  "summary": a one-paragraph professional summary, or null.
5.  "total_experience_years": total years of professional experience as a number, or 0 if unknown.
6.  "experience": a list of objects, most recent first, each with "company", "position", "duration" (as written on the resume, e.g. "Jan 2019 - Mar 2022") and "responsibilities" (a list of strings).
7.  "education": a list of objects, each with "institution", "degree" and "graduation_date".
8.  "skills": {"technical": list of technical skills (e.g. Python, React, SQL, AWS), "soft": list of soft skills (e.g. Communication, Teamwork, Leadership)}.
9.  "certifications": a list of certification names.

Use null for any value that is not present in the resume. Do not invent information.

IMPORTANT: Respond with ONLY the JSON object. Do not include any introductory text, explanations, or markdown formatting like ```json. Your entire response must be a valid JSON."#;

/// Separator used when a backend takes a single text blob.
const RESUME_TEXT_HEADER: &str = "\n\nResume Text:\n";

/// One extraction request, ready for any backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionPrompt {
    pub system: &'static str,
    pub user: String,
}

impl ExtractionPrompt {
    /// Single-blob form: instructions, header, then the résumé text.
    pub fn combined(&self) -> String {
        format!("{}{RESUME_TEXT_HEADER}{}", self.system, self.user)
    }
}

/// Pairs the fixed instructions with the résumé text. No truncation happens
/// here; oversized input fails at the backend.
pub fn build_prompt(resume_text: &str) -> ExtractionPrompt {
    ExtractionPrompt {
        system: EXTRACTION_SYSTEM,
        user: resume_text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_prompt_layout() {
        let prompt = build_prompt("Jane Doe\njane@x.com");
        let combined = prompt.combined();
        assert!(combined.starts_with(EXTRACTION_SYSTEM));
        assert!(combined.ends_with("\n\nResume Text:\nJane Doe\njane@x.com"));
    }

    #[test]
    fn test_role_split_keeps_text_verbatim() {
        let prompt = build_prompt("  raw text  ");
        assert_eq!(prompt.system, EXTRACTION_SYSTEM);
        assert_eq!(prompt.user, "  raw text  ");
    }

    #[test]
    fn test_instructions_name_every_schema_section() {
        for field in [
            "full_name",
            "contact_information",
            "professional_links",
            "total_experience_years",
            "experience",
            "responsibilities",
            "education",
            "skills",
            "certifications",
        ] {
            assert!(EXTRACTION_SYSTEM.contains(field), "missing {field}");
        }
    }
}
