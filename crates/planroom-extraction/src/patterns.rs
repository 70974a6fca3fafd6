//! Label-based field extraction used when the model is unavailable or
//! returns nothing usable. Deterministic for a given input.

use std::sync::OnceLock;

use regex::Regex;

use crate::fields::{CanonicalField, CanonicalFields};

fn labels(field: CanonicalField) -> &'static [&'static str] {
    match field {
        CanonicalField::JobName => &["Job Name", "Project Name", "Project Title", "Building Name"],
        CanonicalField::JobNo => {
            &["Job No", "Job Number", "Project No", "Project Number", "Job #", "Project #"]
        }
        CanonicalField::ProfessionalEngineerName => {
            &["Professional Engineer", "P.E.", "PE", "Engineer of Record", "EOR"]
        }
        CanonicalField::GeneralContractorName => {
            &["General Contractor", "GC", "Prime Contractor", "Main Contractor"]
        }
        CanonicalField::ArchitectName => {
            &["Architect", "Architectural Firm", "Ar.", "Architect of Record", "AOR"]
        }
        CanonicalField::EngineerName => {
            &["Structural Engineer", "Engineer", "SE", "Engineering Firm"]
        }
        CanonicalField::FabricatorName => {
            &["Fabricator", "Steel Fabricator", "Fabrication Company"]
        }
        CanonicalField::DesignCalculation => {
            &["Design Calculation", "Design Calcs", "Calculations"]
        }
        CanonicalField::ContractDrawings => &["Contract Drawings", "Drawing Set", "Drawings"],
        CanonicalField::Standards => &["Standards", "Code", "Design Code"],
        CanonicalField::Detailer => &["Detailer", "Detailing Company", "Detailing Firm"],
        CanonicalField::DetailingCountry => &["Detailing Country", "Country", "Location"],
    }
}

struct LabelPattern {
    lowered: String,
    value: Regex,
}

/// Compiled label patterns for every field, in table order.
fn label_patterns() -> &'static Vec<(CanonicalField, Vec<LabelPattern>)> {
    static TABLE: OnceLock<Vec<(CanonicalField, Vec<LabelPattern>)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        CanonicalField::ALL
            .iter()
            .map(|field| {
                let patterns = labels(*field)
                    .iter()
                    .map(|label| LabelPattern {
                        lowered: label.to_lowercase(),
                        value: Regex::new(&format!(
                            r"(?i){}[:\s]+([^\n\r,]+?)(?:\n|$|,)",
                            regex::escape(label)
                        ))
                        .unwrap(),
                    })
                    .collect();
                (*field, patterns)
            })
            .collect()
    })
}

fn value_on_line(line: &str, lowered_line: &str, patterns: &[LabelPattern]) -> Option<String> {
    patterns
        .iter()
        .filter(|p| lowered_line.contains(&p.lowered))
        .find_map(|p| {
            let caps = p.value.captures(line)?;
            let value = caps[1].trim().trim_matches(|c: char| matches!(c, '.' | ',' | ';' | ':'));
            (value.chars().count() > 2).then(|| value.to_string())
        })
}

/// Scan `text` line by line for labelled values. The first line (in document
/// order) yielding a value wins for each field.
pub fn extract_by_pattern(text: &str) -> CanonicalFields {
    let lines: Vec<(&str, String)> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| (l, l.to_lowercase()))
        .collect();

    let mut out = CanonicalFields::default();
    for (field, patterns) in label_patterns() {
        let found = lines
            .iter()
            .find_map(|(line, lowered)| value_on_line(line, lowered, patterns));
        out.set(*field, found.as_deref());
    }
    out
}
