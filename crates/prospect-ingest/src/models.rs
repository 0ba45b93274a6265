//! Data models shared by the pipeline stages
//!
//! A [`RawRecord`] is kept exactly as the search endpoint returned it so the
//! checkpoint file stays a faithful copy of the API output. Typing happens
//! later, in [`crate::validator`], which produces a [`ValidatedPerson`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One person exactly as received from the search endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Value);

impl RawRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// The `name` field if present as a string, for log context
    pub fn display_name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }
}

impl From<Value> for RawRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// A position in the person's employment history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployerEntry {
    pub title: Option<String>,
    pub company_name: Option<String>,
    pub company_linkedin_id: Option<String>,
    pub company_logo_url: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub position_id: Option<i64>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub rich_media: Option<Vec<Value>>,
}

/// An entry in the person's education history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub degree_name: Option<String>,
    pub institute_name: Option<String>,
    pub field_of_study: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub institute_linkedin_id: Option<String>,
    pub institute_linkedin_url: Option<String>,
    pub institute_logo_url: Option<String>,
}

/// A raw record after type checking and normalisation
///
/// `None` is the explicit "absent" marker: a field missing from the source,
/// sent as `null`, or sent as a blank string all end up as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatedPerson {
    pub name: String,
    pub location: Option<String>,
    pub linkedin_profile_url: Option<String>,
    pub linkedin_profile_urn: Option<String>,
    pub default_position_title: Option<String>,
    pub default_position_company_linkedin_id: Option<String>,
    pub default_position_is_decision_maker: Option<bool>,
    pub flagship_profile_url: Option<String>,
    pub profile_picture_url: Option<String>,
    pub headline: Option<String>,
    pub summary: Option<String>,
    pub num_of_connections: Option<i64>,
    pub related_colleague_company_id: Option<i64>,
    pub skills: Option<Vec<String>>,
    pub employer: Option<Vec<EmployerEntry>>,
    pub education_background: Option<Vec<EducationEntry>>,
    pub emails: Option<Vec<String>>,
    pub websites: Option<Vec<String>>,
    pub twitter_handle: Option<String>,
    pub languages: Option<Vec<String>>,
    pub pronoun: Option<String>,
    pub query_person_linkedin_urn: Option<String>,
    pub linkedin_slug_or_urns: Option<Vec<String>>,
    pub current_title: Option<String>,
}

impl ValidatedPerson {
    /// Employment history, empty when the source had none
    pub fn employers(&self) -> &[EmployerEntry] {
        self.employer.as_deref().unwrap_or_default()
    }

    /// Education history, empty when the source had none
    pub fn education(&self) -> &[EducationEntry] {
        self.education_background.as_deref().unwrap_or_default()
    }
}

/// A row of the `profiles` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredProfile {
    /// Natural key: a contact email or a name-derived placeholder
    pub email: String,
    pub person: ValidatedPerson,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
