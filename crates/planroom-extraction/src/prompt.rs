//! Prompt construction for title-block field extraction.

const TRUNCATION_MARKER: &str = "\n[... text truncated ...]";

const PROMPT_HEADER: &str = "\
You are an expert in parsing architectural and engineering documents like steel framing plans. \
These typically have a title block with job details at the bottom/right, architect info at bottom left, and revisions.

Extract the following information and return as JSON. Use these exact field names:

- \"Job Name\" or \"Project\": Full project title
- \"Job No\" or \"Drawing Number\": Project or drawing number
- \"Professional Engineer Name\": Name of the PE stamping the drawings
- \"General Contractor Name\" or \"Client\": Construction company/owner
- \"Architect Name\" or \"Architect\": Architecture firm name
- \"Engineer Name\": Structural engineer name
- \"Fabricator Name\": Steel fabricator (if mentioned)
- \"Design Calculation\": Reference to calculations
- \"Contract Drawings\" or \"Title\": Drawing set description or title
- \"Standards\": Codes/standards (e.g., AISC, ASTM, BS, IS, EN)
- \"Detailer\": Person/firm who detailed (from \"Drawn By\" or similar)
- \"Detailing Country\": Country name

If a field is not found, use null. Return ONLY valid JSON with these field names. No extra text.

PDF Text:

";

/// Title-block text when it has content, otherwise the full text, cut to
/// `max_chars` characters.
pub fn extraction_text(full_text: &str, title_block_text: &str, max_chars: usize) -> String {
    let source = if title_block_text.trim().is_empty() { full_text } else { title_block_text };
    match source.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &source[..cut], TRUNCATION_MARKER),
        None => source.to_string(),
    }
}

pub fn build_prompt(extraction_text: &str) -> String {
    format!("\n{PROMPT_HEADER}{extraction_text}\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_title_block() {
        assert_eq!(extraction_text("full", "title", 100), "title");
        assert_eq!(extraction_text("full", "  \n ", 100), "full");
    }

    #[test]
    fn test_truncates_with_marker() {
        let text = "x".repeat(9000);
        let out = extraction_text(&text, "", 8000);
        assert!(out.starts_with(&"x".repeat(8000)));
        assert!(out.ends_with("[... text truncated ...]"));
        assert_eq!(out.len(), 8000 + TRUNCATION_MARKER.len());
    }

    #[test]
    fn test_exact_length_not_truncated() {
        let text = "y".repeat(8000);
        assert_eq!(extraction_text(&text, "", 8000), text);
    }

    #[test]
    fn test_prompt_is_deterministic_and_ends_with_text() {
        let a = build_prompt("JOB NO: 2024-117");
        let b = build_prompt("JOB NO: 2024-117");
        assert_eq!(a, b);
        assert!(a.contains("\"Detailing Country\": Country name"));
        assert!(a.contains("If a field is not found, use null."));
        assert!(a.trim_end().ends_with("PDF Text:\n\nJOB NO: 2024-117"));
    }
}
