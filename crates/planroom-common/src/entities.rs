/// Workspace record types.
/// These are the Rust representations of the records kept in the record store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PlanroomError, Result};

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub project_number: Option<String>,
    pub professional_engineer: Option<String>,
    pub general_contractor: Option<String>,
    pub architect: Option<String>,
    pub engineer: Option<String>,
    pub fabricator: Option<String>,
    pub design_calculation: Option<String>,
    pub contract_drawings: Option<String>,
    pub standards: Option<String>,
    pub detailer: Option<String>,
    pub detailing_country: Option<String>,
    pub geolocation: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectCreate {
    pub name: String,
    #[serde(default)]
    pub project_number: Option<String>,
    #[serde(default)]
    pub professional_engineer: Option<String>,
    #[serde(default)]
    pub general_contractor: Option<String>,
    #[serde(default)]
    pub architect: Option<String>,
    #[serde(default)]
    pub engineer: Option<String>,
    #[serde(default)]
    pub fabricator: Option<String>,
    #[serde(default)]
    pub design_calculation: Option<String>,
    #[serde(default)]
    pub contract_drawings: Option<String>,
    #[serde(default)]
    pub standards: Option<String>,
    #[serde(default)]
    pub detailer: Option<String>,
    #[serde(default)]
    pub detailing_country: Option<String>,
    #[serde(default)]
    pub geolocation: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update; only fields present in the payload are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectUpdate {
    pub project_number: Option<String>,
    pub professional_engineer: Option<String>,
    pub general_contractor: Option<String>,
    pub architect: Option<String>,
    pub engineer: Option<String>,
    pub fabricator: Option<String>,
    pub design_calculation: Option<String>,
    pub contract_drawings: Option<String>,
    pub standards: Option<String>,
    pub detailer: Option<String>,
    pub detailing_country: Option<String>,
    pub geolocation: Option<String>,
    pub description: Option<String>,
}

fn check_len(field: &str, value: Option<&str>, max: usize) -> Result<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(PlanroomError::InvalidInput(format!(
            "{field} must be at most {max} characters"
        ))),
        _ => Ok(()),
    }
}

impl ProjectCreate {
    pub fn validate(&self) -> Result<()> {
        let name_len = self.name.chars().count();
        if name_len == 0 || name_len > 255 {
            return Err(PlanroomError::InvalidInput(
                "name must be between 1 and 255 characters".to_string(),
            ));
        }
        check_len("project_number", self.project_number.as_deref(), 100)?;
        check_len("professional_engineer", self.professional_engineer.as_deref(), 255)?;
        check_len("general_contractor", self.general_contractor.as_deref(), 255)?;
        check_len("architect", self.architect.as_deref(), 255)?;
        check_len("engineer", self.engineer.as_deref(), 255)?;
        check_len("fabricator", self.fabricator.as_deref(), 255)?;
        check_len("design_calculation", self.design_calculation.as_deref(), 1000)?;
        check_len("contract_drawings", self.contract_drawings.as_deref(), 1000)?;
        check_len("standards", self.standards.as_deref(), 1000)?;
        check_len("detailer", self.detailer.as_deref(), 255)?;
        check_len("detailing_country", self.detailing_country.as_deref(), 255)?;
        check_len("geolocation", self.geolocation.as_deref(), 255)?;
        check_len("description", self.description.as_deref(), 1000)
    }

    /// Build the stored record. `id` is assigned by the store.
    pub fn into_project(self, now: DateTime<Utc>) -> Project {
        Project {
            id: 0,
            name: self.name,
            project_number: self.project_number,
            professional_engineer: self.professional_engineer,
            general_contractor: self.general_contractor,
            architect: self.architect,
            engineer: self.engineer,
            fabricator: self.fabricator,
            design_calculation: self.design_calculation,
            contract_drawings: self.contract_drawings,
            standards: self.standards,
            detailer: self.detailer,
            detailing_country: self.detailing_country,
            geolocation: self.geolocation,
            description: self.description,
            created_at: now,
            updated_at: now,
        }
    }
}

impl ProjectUpdate {
    pub fn validate(&self) -> Result<()> {
        check_len("project_number", self.project_number.as_deref(), 100)?;
        check_len("design_calculation", self.design_calculation.as_deref(), 1000)?;
        check_len("contract_drawings", self.contract_drawings.as_deref(), 1000)?;
        check_len("standards", self.standards.as_deref(), 1000)?;
        check_len("description", self.description.as_deref(), 1000)?;
        for (field, value) in [
            ("professional_engineer", &self.professional_engineer),
            ("general_contractor", &self.general_contractor),
            ("architect", &self.architect),
            ("engineer", &self.engineer),
            ("fabricator", &self.fabricator),
            ("detailer", &self.detailer),
            ("detailing_country", &self.detailing_country),
            ("geolocation", &self.geolocation),
        ] {
            check_len(field, value.as_deref(), 255)?;
        }
        Ok(())
    }

    pub fn apply(self, project: &mut Project, now: DateTime<Utc>) {
        fn set(target: &mut Option<String>, value: Option<String>) {
            if value.is_some() {
                *target = value;
            }
        }
        set(&mut project.project_number, self.project_number);
        set(&mut project.professional_engineer, self.professional_engineer);
        set(&mut project.general_contractor, self.general_contractor);
        set(&mut project.architect, self.architect);
        set(&mut project.engineer, self.engineer);
        set(&mut project.fabricator, self.fabricator);
        set(&mut project.design_calculation, self.design_calculation);
        set(&mut project.contract_drawings, self.contract_drawings);
        set(&mut project.standards, self.standards);
        set(&mut project.detailer, self.detailer);
        set(&mut project.detailing_country, self.detailing_country);
        set(&mut project.geolocation, self.geolocation);
        set(&mut project.description, self.description);
        project.updated_at = now;
    }
}

// ---------------------------------------------------------------------------
// Time entry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeEntry {
    pub id: i64,
    pub project_name: String,
    pub user_email: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TimeEntry {
    pub fn start(project_name: String, user_email: String, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            project_name,
            user_email,
            start_time: now,
            end_time: None,
            duration_seconds: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Close the session, recording whole elapsed seconds.
    pub fn stop(&mut self, now: DateTime<Utc>) {
        self.end_time = Some(now);
        self.duration_seconds = Some((now - self.start_time).num_seconds());
        self.is_active = false;
        self.updated_at = now;
    }
}

// ---------------------------------------------------------------------------
// Uploaded file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub id: i64,
    pub original_name: String,
    pub stored_name: String,
    pub size: u64,
    pub stage: u8,
    pub dp_id: Option<i64>,
    pub project_name: Option<String>,
    pub user_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Invitation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invitation {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub designation: String,
    #[serde(skip_serializing)]
    pub token: String,
    pub status: InvitationStatus,
    pub project_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_project_create_rejects_empty_name() {
        let payload = ProjectCreate { name: String::new(), ..Default::default() };
        assert!(matches!(payload.validate(), Err(PlanroomError::InvalidInput(_))));
    }

    #[test]
    fn test_project_create_rejects_long_project_number() {
        let payload = ProjectCreate {
            name: "Tower A".to_string(),
            project_number: Some("9".repeat(101)),
            ..Default::default()
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_update_only_touches_provided_fields() {
        let t0 = Utc::now();
        let mut project = ProjectCreate {
            name: "Tower A".to_string(),
            architect: Some("Studio North".to_string()),
            ..Default::default()
        }
        .into_project(t0);

        let t1 = t0 + Duration::seconds(5);
        ProjectUpdate { standards: Some("AISC 360".to_string()), ..Default::default() }
            .apply(&mut project, t1);

        assert_eq!(project.architect.as_deref(), Some("Studio North"));
        assert_eq!(project.standards.as_deref(), Some("AISC 360"));
        assert_eq!(project.updated_at, t1);
        assert_eq!(project.created_at, t0);
    }

    #[test]
    fn test_time_entry_stop_records_whole_seconds() {
        let t0 = Utc::now();
        let mut entry = TimeEntry::start("Tower A".into(), "a@b.com".into(), t0);
        entry.stop(t0 + Duration::milliseconds(90_750));
        assert!(!entry.is_active);
        assert_eq!(entry.duration_seconds, Some(90));
    }

    #[test]
    fn test_invitation_token_not_serialized() {
        let inv = Invitation {
            id: 1,
            name: "Ana".into(),
            email: "ana@example.com".into(),
            designation: "Detailer".into(),
            token: "secret".into(),
            status: InvitationStatus::Pending,
            project_name: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&inv).unwrap();
        assert!(json.get("token").is_none());
        assert_eq!(json["status"], "pending");
    }
}
