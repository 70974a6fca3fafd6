//! Recovery of a JSON object from free-form model output.
//!
//! Handles markdown fences, prose around the object, and answers cut off
//! mid-object by the generation cap. When strict parsing still fails, known
//! `"Label": "value"` pairs are salvaged with regexes.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::fields::{RawModelFields, RawValue};

/// Labels salvaged from unparseable output, in lookup order.
const SALVAGE_LABELS: &[&str] = &[
    "Job Name",
    "Project",
    "Job No",
    "Drawing Number",
    "General Contractor Name",
    "Client",
    "Architect Name",
    "Architect",
    "Location",
    "Project Type",
    "Title",
];

/// Parse `raw` into a field mapping, or `None` if nothing is recoverable.
pub fn repair(raw: &str) -> Option<RawModelFields> {
    let text = strip_fences(raw.trim());

    let Some(start) = text.find('{') else {
        warn!(raw = %preview(raw, 1000), "Model output contains no JSON object");
        return None;
    };
    let body = &text[start..];

    let candidate = match scan(body).end {
        Some(end) => body[..=end].to_string(),
        None => {
            debug!(chars = body.len(), "Model output truncated, balancing braces");
            close_truncated(body)
        }
    };

    match serde_json::from_str::<serde_json::Value>(&candidate) {
        Ok(serde_json::Value::Object(map)) => Some(RawModelFields::from_json_object(&map)),
        Ok(other) => {
            warn!(kind = json_kind(&other), raw = %preview(raw, 1000), "Model output is not a JSON object");
            salvage(raw)
        }
        Err(e) => {
            warn!(error = %e, raw = %preview(raw, 1000), "Failed to parse model output as JSON");
            salvage(raw)
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn strip_fences(text: &str) -> &str {
    let mut text = text;
    if let Some(rest) = text.strip_prefix("```") {
        // drop an optional language tag such as `json`
        text = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

// ── Structural scan ───────────────────────────────────────────────────────────

struct ScanState {
    /// Byte index of the brace closing the first object.
    end: Option<usize>,
    /// Containers still open at the end of input, innermost last.
    open: Vec<char>,
    in_string: bool,
    /// Byte index of the last `,` or `{` outside any string literal.
    last_delim: Option<usize>,
}

/// Walk `text` (which starts at `{`) tracking string literals and nesting.
fn scan(text: &str) -> ScanState {
    let mut open = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    let mut last_delim = None;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            ',' => last_delim = Some(i),
            '{' => {
                open.push(c);
                last_delim = Some(i);
            }
            '[' => open.push(c),
            '}' | ']' => {
                open.pop();
                if open.is_empty() {
                    return ScanState { end: Some(i), open, in_string, last_delim };
                }
            }
            _ => {}
        }
    }
    ScanState { end: None, open, in_string, last_delim }
}

// ── Truncation repair ─────────────────────────────────────────────────────────

fn truncation_patterns() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        // string literal bodies honour backslash escapes
        const KEY: &str = r#""(?:[^"\\]|\\.)*""#;
        const PARTIAL: &str = r#""(?:[^"\\]|\\.)*\\?"#;
        [
            // , "key": [ { "k": "partial
            format!(r#"([,{{])\s*{KEY}\s*:\s*\[\s*\{{[^\]]*$"#),
            // , "key": "partial
            format!(r#"([,{{])\s*{KEY}\s*:\s*{PARTIAL}$"#),
            // , "key": [partial-list
            format!(r#"([,{{])\s*{KEY}\s*:\s*\[[^\]]*$"#),
            // , "key": {partial-object
            format!(r#"([,{{])\s*{KEY}\s*:\s*\{{[^}}]*$"#),
            // , "key":
            format!(r#"([,{{])\s*{KEY}\s*:\s*$"#),
            // , "key" / , "partial-key
            format!(r#"([,{{])\s*{PARTIAL}"?\s*$"#),
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    })
}

/// Drop the trailing incomplete member and close every open container.
fn close_truncated(body: &str) -> String {
    let mut text = body.to_string();
    for re in truncation_patterns() {
        let replaced = re
            .replace(&text, |caps: &Captures| {
                if &caps[1] == "{" { "{".to_string() } else { String::new() }
            })
            .into_owned();
        text = replaced;
    }

    let mut text = text.trim_end().trim_end_matches(',').trim_end().to_string();

    let mut state = scan(&text);
    if state.in_string {
        // still inside a literal: cut back to the member boundary
        if let Some(at) = state.last_delim {
            let keep = if text[at..].starts_with('{') { at + 1 } else { at };
            text.truncate(keep);
            text = text.trim_end().trim_end_matches(',').trim_end().to_string();
            state = scan(&text);
        }
    }
    if state.in_string {
        text.push('"');
    }
    for c in state.open.iter().rev() {
        text.push(if *c == '{' { '}' } else { ']' });
    }
    text
}

// ── Regex salvage ─────────────────────────────────────────────────────────────

fn salvage_patterns() -> &'static [(&'static str, Regex)] {
    static RES: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    RES.get_or_init(|| {
        SALVAGE_LABELS
            .iter()
            .map(|label| {
                let re = Regex::new(&format!(r#"(?i)"{}"\s*:\s*"([^"]*)""#, regex::escape(label)))
                    .unwrap();
                (*label, re)
            })
            .collect()
    })
}

fn salvage(raw: &str) -> Option<RawModelFields> {
    let mut fields = RawModelFields::new();
    for (label, re) in salvage_patterns() {
        if let Some(caps) = re.captures(raw) {
            fields.insert(*label, RawValue::Text(caps[1].to_string()));
        }
    }
    if fields.is_empty() {
        None
    } else {
        debug!(fields = fields.len(), "Salvaged fields from unparseable model output");
        Some(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(fields: &RawModelFields, key: &str) -> Option<String> {
        match fields.get(key) {
            Some(RawValue::Text(s)) => Some(s.clone()),
            _ => None,
        }
    }

    #[test]
    fn test_plain_object() {
        let fields = repair(r#"{"Job Name": "Tower A", "Job No": "2024-117"}"#).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(text(&fields, "Job No").as_deref(), Some("2024-117"));
    }

    #[test]
    fn test_fenced_object_with_prose() {
        let raw = "Here is the data you asked for:\n```json\n{\"Job Name\": \"Tower A\", \"Standards\": [\"AISC\", \"ASTM\"]}\n```\nLet me know if you need more.";
        let fields = repair(raw).unwrap();
        let expected: serde_json::Value =
            serde_json::from_str(r#"{"Job Name": "Tower A", "Standards": ["AISC", "ASTM"]}"#).unwrap();
        assert_eq!(fields, RawModelFields::from_json_object(expected.as_object().unwrap()));
    }

    #[test]
    fn test_fence_only() {
        let fields = repair("```\n{\"job_no\": \"77\"}\n```").unwrap();
        assert_eq!(text(&fields, "job_no").as_deref(), Some("77"));
    }

    #[test]
    fn test_truncated_string_value_dropped() {
        let fields =
            repair(r#"{"job_name": "Tower A", "job_no": "123", "standards": "AISC, AS"#).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(text(&fields, "job_name").as_deref(), Some("Tower A"));
        assert_eq!(text(&fields, "job_no").as_deref(), Some("123"));
        assert!(fields.get("standards").is_none());
    }

    #[test]
    fn test_truncated_after_complete_value() {
        let fields = repair(r#"{"job_name": "Tower A", "job_no": "123","#).unwrap();
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_truncated_inside_list() {
        let fields = repair(r#"{"job_name": "Tower A", "standards": ["AISC", "AS"#).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(text(&fields, "job_name").as_deref(), Some("Tower A"));
    }

    #[test]
    fn test_truncated_inside_nested_objects() {
        let fields =
            repair(r#"{"job_name": "Tower A", "revisions": [{"rev": "A", "date": "2024-"#).unwrap();
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_truncated_key_without_value() {
        let fields = repair(r#"{"job_name": "Tower A", "job_no":"#).unwrap();
        assert_eq!(fields.len(), 1);
        let fields = repair(r#"{"job_name": "Tower A", "job_"#).unwrap();
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_truncated_first_member_gives_empty_object() {
        let fields = repair(r#"{"job_name": "Tow"#).unwrap();
        assert!(fields.is_empty());
    }

    #[test]
    fn test_truncated_value_with_escaped_quote_dropped() {
        let fields = repair(r#"{"job_name": "Tower A", "job_no": "12\"3"#).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(text(&fields, "job_name").as_deref(), Some("Tower A"));
        assert!(fields.get("job_no").is_none());

        let fields = repair(r#"{"job_name": "Tower A", "standards": "AISC \"360"#).unwrap();
        assert_eq!(fields.len(), 1);
        assert!(fields.get("standards").is_none());
    }

    #[test]
    fn test_truncated_inside_escape_sequence_dropped() {
        let fields = repair(r#"{"job_name": "Tower A", "scale": "1/4\" = 1'-0\"#).unwrap();
        assert_eq!(fields.len(), 1);
        assert!(fields.get("scale").is_none());
    }

    #[test]
    fn test_complete_value_with_escaped_quotes_kept() {
        let fields = repair(r#"{"scale": "1/4\" = 1'-0\"", "job_no": "12"#).unwrap();
        assert_eq!(text(&fields, "scale").as_deref(), Some("1/4\" = 1'-0\""));
        assert!(fields.get("job_no").is_none());
    }

    #[test]
    fn test_scan_tracks_last_member_boundary() {
        let state = scan(r#"{"a": "x, {y", "b": "z"#);
        assert!(state.in_string);
        assert_eq!(state.last_delim, Some(13));
    }

    #[test]
    fn test_braces_inside_strings_ignored() {
        let fields = repair(r#"{"Title": "Plan {Level 2}", "Job No": "9"} trailing }"#).unwrap();
        assert_eq!(text(&fields, "Title").as_deref(), Some("Plan {Level 2}"));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_no_brace_is_none() {
        assert!(repair("I could not find any project information.").is_none());
        assert!(repair("").is_none());
    }

    #[test]
    fn test_salvage_from_malformed_object() {
        let raw = r#"{"Job Name": "Tower A", "Architect": "Studio North", "Job No": 12-34}"#;
        let fields = repair(raw).unwrap();
        assert_eq!(text(&fields, "Job Name").as_deref(), Some("Tower A"));
        assert_eq!(text(&fields, "Architect").as_deref(), Some("Studio North"));
        assert!(fields.get("Job No").is_none());
    }

    #[test]
    fn test_salvage_is_case_insensitive() {
        let raw = r#"{"job name": "Tower A", oops}"#;
        let fields = repair(raw).unwrap();
        assert_eq!(text(&fields, "Job Name").as_deref(), Some("Tower A"));
    }

    #[test]
    fn test_unsalvageable_is_none() {
        assert!(repair("{not json at all}").is_none());
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        assert_eq!(preview("ééé", 2), "éé");
        assert_eq!(preview("ab", 10), "ab");
    }
}
