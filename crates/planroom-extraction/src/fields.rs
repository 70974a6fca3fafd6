//! Canonical title-block fields and the mapping from whatever keys the model
//! produced onto them.
//!
//! A model answer arrives in one of two key shapes:
//!   - positional: `"1"`..`"12"`, in [`CanonicalField::ALL`] order
//!   - named: natural-language labels ("Job Name", "GC", …) or the canonical
//!     snake_case keys themselves
//!
//! [`canonicalize`] dispatches on [`RawModelFields::shape`] once; every alias
//! list lives in [`CanonicalField::aliases`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ── Canonical field set ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalField {
    JobName,
    JobNo,
    ProfessionalEngineerName,
    GeneralContractorName,
    ArchitectName,
    EngineerName,
    FabricatorName,
    DesignCalculation,
    ContractDrawings,
    Standards,
    Detailer,
    DetailingCountry,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 12] = [
        CanonicalField::JobName,
        CanonicalField::JobNo,
        CanonicalField::ProfessionalEngineerName,
        CanonicalField::GeneralContractorName,
        CanonicalField::ArchitectName,
        CanonicalField::EngineerName,
        CanonicalField::FabricatorName,
        CanonicalField::DesignCalculation,
        CanonicalField::ContractDrawings,
        CanonicalField::Standards,
        CanonicalField::Detailer,
        CanonicalField::DetailingCountry,
    ];

    pub fn key(self) -> &'static str {
        match self {
            CanonicalField::JobName                  => "job_name",
            CanonicalField::JobNo                    => "job_no",
            CanonicalField::ProfessionalEngineerName => "professional_engineer_name",
            CanonicalField::GeneralContractorName    => "general_contractor_name",
            CanonicalField::ArchitectName            => "architect_name",
            CanonicalField::EngineerName             => "engineer_name",
            CanonicalField::FabricatorName           => "fabricator_name",
            CanonicalField::DesignCalculation        => "design_calculation",
            CanonicalField::ContractDrawings         => "contract_drawings",
            CanonicalField::Standards                => "standards",
            CanonicalField::Detailer                 => "detailer",
            CanonicalField::DetailingCountry         => "detailing_country",
        }
    }

    /// 1-based slot used by positional model answers.
    pub fn position(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).map(|i| i + 1).unwrap_or(0)
    }

    /// Keys tried, in order, when the model answered with named keys.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            CanonicalField::JobName => &["Job Name", "Project", "Project Name", "job_name"],
            CanonicalField::JobNo => {
                &["Job No", "Job Number", "Drawing Number", "Project Number", "job_no"]
            }
            CanonicalField::ProfessionalEngineerName => &[
                "Professional Engineer",
                "P.E.",
                "PE",
                "Professional Engineer Name",
                "professional_engineer_name",
            ],
            CanonicalField::GeneralContractorName => &[
                "General Contractor",
                "GC",
                "Client",
                "Owner",
                "General Contractor Name",
                "general_contractor_name",
            ],
            CanonicalField::ArchitectName => {
                &["Architect", "Architectural Firm", "Architect Name", "architect_name"]
            }
            CanonicalField::EngineerName => {
                &["Engineer", "Structural Engineer", "Engineer Name", "engineer_name"]
            }
            CanonicalField::FabricatorName => {
                &["Fabricator", "Steel Fabricator", "Fabricator Name", "fabricator_name"]
            }
            CanonicalField::DesignCalculation => {
                &["Design Calculation", "Calculations", "design_calculation"]
            }
            CanonicalField::ContractDrawings => {
                &["Contract Drawings", "Drawing Set", "Title", "contract_drawings"]
            }
            CanonicalField::Standards => &["Standards", "Code", "standards"],
            CanonicalField::Detailer => &["Detailer", "Drawn By", "detailer"],
            CanonicalField::DetailingCountry => {
                &["Detailing Country", "Country", "Location", "detailing_country"]
            }
        }
    }
}

// ── Canonical output ──────────────────────────────────────────────────────────

/// The twelve output fields. Every present value is trimmed and non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalFields {
    pub job_name: Option<String>,
    pub job_no: Option<String>,
    pub professional_engineer_name: Option<String>,
    pub general_contractor_name: Option<String>,
    pub architect_name: Option<String>,
    pub engineer_name: Option<String>,
    pub fabricator_name: Option<String>,
    pub design_calculation: Option<String>,
    pub contract_drawings: Option<String>,
    pub standards: Option<String>,
    pub detailer: Option<String>,
    pub detailing_country: Option<String>,
}

impl CanonicalFields {
    fn slot_mut(&mut self, field: CanonicalField) -> &mut Option<String> {
        match field {
            CanonicalField::JobName                  => &mut self.job_name,
            CanonicalField::JobNo                    => &mut self.job_no,
            CanonicalField::ProfessionalEngineerName => &mut self.professional_engineer_name,
            CanonicalField::GeneralContractorName    => &mut self.general_contractor_name,
            CanonicalField::ArchitectName            => &mut self.architect_name,
            CanonicalField::EngineerName             => &mut self.engineer_name,
            CanonicalField::FabricatorName           => &mut self.fabricator_name,
            CanonicalField::DesignCalculation        => &mut self.design_calculation,
            CanonicalField::ContractDrawings         => &mut self.contract_drawings,
            CanonicalField::Standards                => &mut self.standards,
            CanonicalField::Detailer                 => &mut self.detailer,
            CanonicalField::DetailingCountry         => &mut self.detailing_country,
        }
    }

    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        let slot = match field {
            CanonicalField::JobName                  => &self.job_name,
            CanonicalField::JobNo                    => &self.job_no,
            CanonicalField::ProfessionalEngineerName => &self.professional_engineer_name,
            CanonicalField::GeneralContractorName    => &self.general_contractor_name,
            CanonicalField::ArchitectName            => &self.architect_name,
            CanonicalField::EngineerName             => &self.engineer_name,
            CanonicalField::FabricatorName           => &self.fabricator_name,
            CanonicalField::DesignCalculation        => &self.design_calculation,
            CanonicalField::ContractDrawings         => &self.contract_drawings,
            CanonicalField::Standards                => &self.standards,
            CanonicalField::Detailer                 => &self.detailer,
            CanonicalField::DetailingCountry         => &self.detailing_country,
        };
        slot.as_deref()
    }

    /// Store `value` after normalisation; sentinels and blanks become `None`.
    pub fn set(&mut self, field: CanonicalField, value: Option<&str>) {
        *self.slot_mut(field) = value.and_then(normalize_text);
    }

    pub fn is_empty(&self) -> bool {
        CanonicalField::ALL.iter().all(|f| self.get(*f).is_none())
    }

    pub fn filled(&self) -> usize {
        CanonicalField::ALL.iter().filter(|f| self.get(**f).is_some()).count()
    }
}

// ── Raw model output ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Text(String),
    List(Vec<String>),
    Null,
}

impl RawValue {
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => RawValue::Null,
            Value::String(s) => RawValue::Text(s.clone()),
            Value::Number(n) => RawValue::Text(n.to_string()),
            Value::Bool(b) => RawValue::Text(b.to_string()),
            Value::Array(items) => RawValue::List(
                items
                    .iter()
                    .filter(|v| !v.is_null())
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            Value::Object(_) => RawValue::Text(value.to_string()),
        }
    }

    /// Presence test applied before normalisation.
    pub fn is_present(&self) -> bool {
        match self {
            RawValue::Text(s) => !s.is_empty(),
            RawValue::List(items) => !items.is_empty(),
            RawValue::Null => false,
        }
    }

    fn render(&self) -> Option<String> {
        match self {
            RawValue::Text(s) => Some(s.clone()),
            RawValue::List(items) if !items.is_empty() => Some(items.join(", ")),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyShape {
    Positional,
    Named,
}

/// Key/value pairs recovered from a model answer, before canonicalisation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawModelFields {
    entries: BTreeMap<String, RawValue>,
}

impl RawModelFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_object(map: &serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            entries: map
                .iter()
                .map(|(k, v)| (k.clone(), RawValue::from_json(v)))
                .collect(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: RawValue) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn shape(&self) -> KeyShape {
        let positional = (1..=CanonicalField::ALL.len())
            .all(|i| self.entries.contains_key(&i.to_string()));
        if positional {
            KeyShape::Positional
        } else {
            KeyShape::Named
        }
    }

    fn present(&self, key: &str) -> Option<&RawValue> {
        self.get(key).filter(|v| v.is_present())
    }
}

// ── Mapping ───────────────────────────────────────────────────────────────────

const SENTINELS: [&str; 2] = ["Not specified", "Not provided"];

fn normalize_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || SENTINELS.contains(&trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn normalize(value: &RawValue) -> Option<String> {
    value.render().as_deref().and_then(normalize_text)
}

fn resolve_named(raw: &RawModelFields, field: CanonicalField) -> Option<String> {
    if field == CanonicalField::JobName {
        if let (Some(name), Some(location)) = (raw.present("Job Name"), raw.present("Location")) {
            if let (Some(name), Some(location)) = (name.render(), location.render()) {
                return normalize_text(&format!("{name}, {location}"));
            }
        }
    }

    field
        .aliases()
        .iter()
        .find_map(|alias| raw.present(alias))
        .and_then(normalize)
}

/// Map recovered model fields onto the twelve canonical fields.
pub fn canonicalize(raw: &RawModelFields) -> CanonicalFields {
    let mut out = CanonicalFields::default();
    match raw.shape() {
        KeyShape::Positional => {
            for field in CanonicalField::ALL {
                let value = raw.get(&field.position().to_string()).and_then(normalize);
                *out.slot_mut(field) = value;
            }
        }
        KeyShape::Named => {
            for field in CanonicalField::ALL {
                *out.slot_mut(field) = resolve_named(raw, field);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawModelFields {
        RawModelFields::from_json_object(value.as_object().unwrap())
    }

    #[test]
    fn test_positional_mapping() {
        let fields = canonicalize(&raw(json!({
            "1": "Tower A", "2": "2024-117", "3": "J. Smith, P.E.", "4": "Acme Builders",
            "5": "Studio North", "6": "Frame Eng", "7": "Steelworks", "8": "Calc set 3",
            "9": "S-101 to S-140", "10": "AISC 360", "11": "DetailCo", "12": "USA"
        })));
        assert_eq!(fields.job_name.as_deref(), Some("Tower A"));
        assert_eq!(fields.job_no.as_deref(), Some("2024-117"));
        assert_eq!(fields.standards.as_deref(), Some("AISC 360"));
        assert_eq!(fields.detailing_country.as_deref(), Some("USA"));
        assert_eq!(fields.filled(), 12);
    }

    #[test]
    fn test_partial_numeric_keys_are_named() {
        let r = raw(json!({"1": "Tower A", "2": "2024-117", "Job Name": "Tower B"}));
        assert_eq!(r.shape(), KeyShape::Named);
        assert_eq!(canonicalize(&r).job_name.as_deref(), Some("Tower B"));
    }

    #[test]
    fn test_job_name_combines_location() {
        let fields = canonicalize(&raw(json!({"Job Name": "Tower A", "Location": "Austin, TX"})));
        assert_eq!(fields.job_name.as_deref(), Some("Tower A, Austin, TX"));
        assert_eq!(fields.detailing_country.as_deref(), Some("Austin, TX"));
    }

    #[test]
    fn test_alias_precedence() {
        let fields = canonicalize(&raw(json!({
            "Client": "Owner Corp",
            "GC": "Acme Builders",
            "Drawing Number": "S-201",
            "Job Number": "2024-117"
        })));
        assert_eq!(fields.general_contractor_name.as_deref(), Some("Acme Builders"));
        assert_eq!(fields.job_no.as_deref(), Some("2024-117"));
    }

    #[test]
    fn test_prompt_labels_resolve() {
        let fields = canonicalize(&raw(json!({
            "Engineer Name": "Frame Eng",
            "General Contractor Name": "Acme Builders",
            "Professional Engineer Name": "J. Smith"
        })));
        assert_eq!(fields.engineer_name.as_deref(), Some("Frame Eng"));
        assert_eq!(fields.general_contractor_name.as_deref(), Some("Acme Builders"));
        assert_eq!(fields.professional_engineer_name.as_deref(), Some("J. Smith"));
    }

    #[test]
    fn test_sentinels_and_blanks_become_null() {
        let fields = canonicalize(&raw(json!({
            "Job Name": "Not specified",
            "Job No": "Not provided",
            "Architect": "   ",
            "Standards": null,
            "Detailer": "  DetailCo  "
        })));
        assert_eq!(fields.job_name, None);
        assert_eq!(fields.job_no, None);
        assert_eq!(fields.architect_name, None);
        assert_eq!(fields.standards, None);
        assert_eq!(fields.detailer.as_deref(), Some("DetailCo"));
    }

    #[test]
    fn test_first_present_alias_wins_before_normalisation() {
        // "Project" is present, so "Project Name" is never consulted.
        let fields = canonicalize(&raw(json!({"Project": "Not specified", "Project Name": "Tower A"})));
        assert_eq!(fields.job_name, None);
    }

    #[test]
    fn test_list_values_join() {
        let fields = canonicalize(&raw(json!({"Standards": ["AISC 360", "ASTM A992", null]})));
        assert_eq!(fields.standards.as_deref(), Some("AISC 360, ASTM A992"));
    }

    #[test]
    fn test_numbers_become_text() {
        let fields = canonicalize(&raw(json!({"job_no": 2024117})));
        assert_eq!(fields.job_no.as_deref(), Some("2024117"));
    }

    #[test]
    fn test_serialises_twelve_keys_in_order() {
        let value = serde_json::to_value(CanonicalFields::default()).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 12);
        for field in CanonicalField::ALL {
            assert!(obj[field.key()].is_null());
        }
        let text = serde_json::to_string(&CanonicalFields::default()).unwrap();
        assert!(text.starts_with(r#"{"job_name":null,"job_no":null"#));
        assert!(text.ends_with(r#""detailing_country":null}"#));
    }

    #[test]
    fn test_positions() {
        assert_eq!(CanonicalField::JobName.position(), 1);
        assert_eq!(CanonicalField::DetailingCountry.position(), 12);
    }
}
