//! Record validation
//!
//! Turns a [`RawRecord`] into a [`ValidatedPerson`]. Only `name` is required;
//! every other field is checked independently and may be absent. Employer
//! and education entries are shaped one by one, so a single wrong-typed
//! sub-field rejects the whole record.

use crate::error::ValidationError;
use crate::models::{RawRecord, ValidatedPerson};
use serde_json::Value;

/// Validate and normalise one raw record
pub fn validate(raw: &RawRecord) -> Result<ValidatedPerson, ValidationError> {
    let object = raw.as_value().as_object().ok_or(ValidationError::NotAnObject)?;

    match object.get("name") {
        None | Some(Value::Null) => return Err(ValidationError::MissingName),
        Some(Value::String(name)) if name.trim().is_empty() => {
            return Err(ValidationError::EmptyName)
        },
        Some(Value::String(_)) => {},
        Some(other) => {
            return Err(ValidationError::WrongType(format!(
                "'name' must be a string, got {}",
                json_type(other)
            )))
        },
    }

    let person: ValidatedPerson = serde_json::from_value(raw.as_value().clone())
        .map_err(|e| ValidationError::WrongType(e.to_string()))?;

    Ok(normalize(person))
}

/// Blank strings carry no information; treat them as absent
fn normalize(mut person: ValidatedPerson) -> ValidatedPerson {
    person.name = person.name.trim().to_string();

    for field in [
        &mut person.location,
        &mut person.linkedin_profile_url,
        &mut person.linkedin_profile_urn,
        &mut person.default_position_title,
        &mut person.default_position_company_linkedin_id,
        &mut person.flagship_profile_url,
        &mut person.profile_picture_url,
        &mut person.headline,
        &mut person.summary,
        &mut person.twitter_handle,
        &mut person.pronoun,
        &mut person.query_person_linkedin_urn,
        &mut person.current_title,
    ] {
        blank_to_none(field);
    }

    for entry in person.employer.iter_mut().flatten() {
        for field in [
            &mut entry.title,
            &mut entry.company_name,
            &mut entry.company_linkedin_id,
            &mut entry.company_logo_url,
            &mut entry.start_date,
            &mut entry.end_date,
            &mut entry.description,
            &mut entry.location,
        ] {
            blank_to_none(field);
        }
    }

    for entry in person.education_background.iter_mut().flatten() {
        for field in [
            &mut entry.degree_name,
            &mut entry.institute_name,
            &mut entry.field_of_study,
            &mut entry.start_date,
            &mut entry.end_date,
            &mut entry.institute_linkedin_id,
            &mut entry.institute_linkedin_url,
            &mut entry.institute_logo_url,
        ] {
            blank_to_none(field);
        }
    }

    person
}

fn blank_to_none(field: &mut Option<String>) {
    if field.as_deref().is_some_and(|s| s.trim().is_empty()) {
        *field = None;
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawRecord {
        RawRecord::new(value)
    }

    #[test]
    fn test_sparse_record_is_valid() {
        let person = validate(&raw(json!({ "name": "Jane Doe" }))).unwrap();
        assert_eq!(person.name, "Jane Doe");
        assert_eq!(person.location, None);
        assert_eq!(person.emails, None);
        assert!(person.employers().is_empty());
        assert!(person.education().is_empty());
    }

    #[test]
    fn test_full_record() {
        let person = validate(&raw(json!({
            "name": "Ada Lovelace",
            "location": "San Francisco Bay Area",
            "default_position_title": "Founder",
            "default_position_is_decision_maker": true,
            "num_of_connections": 500,
            "skills": ["Rust", "Mathematics"],
            "emails": ["ada@engine.io"],
            "employer": [{
                "title": "Founder",
                "company_name": "Analytical Engines",
                "company_linkedin_id": null,
                "position_id": 42,
                "rich_media": []
            }],
            "education_background": [{
                "institute_name": "University of London",
                "degree_name": null
            }],
            "unknown_extra_field": {"ignored": true}
        })))
        .unwrap();

        assert_eq!(person.default_position_is_decision_maker, Some(true));
        assert_eq!(person.num_of_connections, Some(500));
        assert_eq!(person.skills.as_deref().unwrap(), ["Rust", "Mathematics"]);
        assert_eq!(person.employers().len(), 1);
        assert_eq!(person.employers()[0].position_id, Some(42));
        assert_eq!(person.employers()[0].company_linkedin_id, None);
        assert_eq!(
            person.education()[0].institute_name.as_deref(),
            Some("University of London")
        );
    }

    #[test]
    fn test_missing_and_empty_name() {
        assert_eq!(
            validate(&raw(json!({ "location": "SF" }))),
            Err(ValidationError::MissingName)
        );
        assert_eq!(
            validate(&raw(json!({ "name": null }))),
            Err(ValidationError::MissingName)
        );
        assert_eq!(
            validate(&raw(json!({ "name": "   " }))),
            Err(ValidationError::EmptyName)
        );
    }

    #[test]
    fn test_wrong_typed_name() {
        assert!(matches!(
            validate(&raw(json!({ "name": 7 }))),
            Err(ValidationError::WrongType(ref msg)) if msg.contains("number")
        ));
    }

    #[test]
    fn test_non_object_record() {
        assert_eq!(validate(&raw(json!("Jane"))), Err(ValidationError::NotAnObject));
        assert_eq!(validate(&raw(json!([1, 2]))), Err(ValidationError::NotAnObject));
    }

    #[test]
    fn test_wrong_typed_optional_field() {
        let result = validate(&raw(json!({
            "name": "Jane Doe",
            "num_of_connections": "lots"
        })));
        assert!(matches!(result, Err(ValidationError::WrongType(_))));

        let result = validate(&raw(json!({
            "name": "Jane Doe",
            "emails": "jane@doe.com"
        })));
        assert!(matches!(result, Err(ValidationError::WrongType(_))));
    }

    #[test]
    fn test_wrong_typed_nested_entry() {
        let result = validate(&raw(json!({
            "name": "Jane Doe",
            "employer": [
                { "title": "CEO", "company_name": "Acme" },
                { "title": "CTO", "position_id": "not-a-number" }
            ]
        })));
        assert!(matches!(result, Err(ValidationError::WrongType(_))));

        let result = validate(&raw(json!({
            "name": "Jane Doe",
            "education_background": ["Stanford"]
        })));
        assert!(matches!(result, Err(ValidationError::WrongType(_))));
    }

    #[test]
    fn test_null_sequences_are_absent() {
        let person = validate(&raw(json!({
            "name": "Jane Doe",
            "employer": null,
            "education_background": null,
            "skills": null
        })))
        .unwrap();
        assert!(person.employers().is_empty());
        assert!(person.education().is_empty());
        assert_eq!(person.skills, None);
    }

    #[test]
    fn test_blank_strings_become_absent() {
        let person = validate(&raw(json!({
            "name": "  Jane Doe ",
            "headline": "",
            "summary": "   ",
            "employer": [{ "title": "", "company_name": "Acme" }]
        })))
        .unwrap();
        assert_eq!(person.name, "Jane Doe");
        assert_eq!(person.headline, None);
        assert_eq!(person.summary, None);
        assert_eq!(person.employers()[0].title, None);
        assert_eq!(person.employers()[0].company_name.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_zero_and_false_are_kept() {
        let person = validate(&raw(json!({
            "name": "Jane Doe",
            "num_of_connections": 0,
            "default_position_is_decision_maker": false
        })))
        .unwrap();
        assert_eq!(person.num_of_connections, Some(0));
        assert_eq!(person.default_position_is_decision_maker, Some(false));
    }
}
