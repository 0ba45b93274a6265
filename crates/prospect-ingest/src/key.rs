//! Natural key derivation for stored profiles
//!
//! A profile is keyed by its first non-empty contact email. People without
//! one get a placeholder address built from their name, so re-importing the
//! same person always lands on the same row.

use crate::models::ValidatedPerson;

/// Domain used for name-derived placeholder keys
pub const PLACEHOLDER_DOMAIN: &str = "placeholder.com";

/// Local part used when nothing usable survives name normalisation
const ANONYMOUS_LOCAL_PART: &str = "anonymous";

/// Derive the storage key for a person
pub fn derive_key(person: &ValidatedPerson) -> String {
    person
        .emails
        .iter()
        .flatten()
        .map(|email| email.trim())
        .find(|email| !email.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| placeholder_email(&person.name))
}

/// Build `first.last@placeholder.com` from a display name
///
/// The name is lower-cased, everything except ASCII letters and whitespace
/// is dropped, and each whitespace run becomes a single dot.
pub fn placeholder_email(name: &str) -> String {
    let lowered = name.to_lowercase();
    let kept: String = lowered
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_whitespace())
        .collect();
    let local = kept.split_whitespace().collect::<Vec<_>>().join(".");

    if local.is_empty() {
        format!("{}@{}", ANONYMOUS_LOCAL_PART, PLACEHOLDER_DOMAIN)
    } else {
        format!("{}@{}", local, PLACEHOLDER_DOMAIN)
    }
}
