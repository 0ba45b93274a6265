//! Typed environment variable lookups
//!
//! Every binary in the workspace reads its settings from the process
//! environment (optionally seeded from a `.env` file). These helpers keep
//! the "missing", "blank" and "unparseable" cases distinct so callers can
//! fail fast with a precise message instead of silently using a default.

use crate::error::{EnvError, EnvResult};
use std::str::FromStr;

/// Read a variable that must be present and non-blank.
pub fn required(name: &str) -> EnvResult<String> {
    match std::env::var(name) {
        Ok(value) if value.trim().is_empty() => Err(EnvError::Empty(name.to_string())),
        Ok(value) => Ok(value.trim().to_string()),
        Err(_) => Err(EnvError::Missing(name.to_string())),
    }
}

/// Read a variable, treating blank values as absent.
pub fn optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Parse a variable, falling back to `default` when it is absent.
///
/// A value that is present but does not parse is an error rather than a
/// silent fallback.
pub fn parsed_or<T>(name: &str, default: T) -> EnvResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e: T::Err| EnvError::invalid(name, raw.clone(), e.to_string())),
        None => Ok(default),
    }
}

/// Read a comma separated list, falling back to `default` when absent.
pub fn list_or(name: &str, default: &[&str]) -> Vec<String> {
    match optional(name) {
        Some(raw) => split_list(&raw),
        None => default.iter().map(|s| s.to_string()).collect(),
    }
}

/// Split a comma separated value, dropping blank items.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_required_missing() {
        std::env::remove_var("PROSPECT_TEST_REQUIRED_MISSING");
        assert_eq!(
            required("PROSPECT_TEST_REQUIRED_MISSING"),
            Err(EnvError::Missing("PROSPECT_TEST_REQUIRED_MISSING".to_string()))
        );
    }

    #[test]
    fn test_required_blank() {
        std::env::set_var("PROSPECT_TEST_REQUIRED_BLANK", "   ");
        assert_eq!(
            required("PROSPECT_TEST_REQUIRED_BLANK"),
            Err(EnvError::Empty("PROSPECT_TEST_REQUIRED_BLANK".to_string()))
        );
        std::env::remove_var("PROSPECT_TEST_REQUIRED_BLANK");
    }

    #[test]
    fn test_required_trims() {
        std::env::set_var("PROSPECT_TEST_REQUIRED_SET", " secret ");
        assert_eq!(required("PROSPECT_TEST_REQUIRED_SET").unwrap(), "secret");
        std::env::remove_var("PROSPECT_TEST_REQUIRED_SET");
    }

    #[test]
    fn test_parsed_or_default_and_value() {
        std::env::remove_var("PROSPECT_TEST_PARSED");
        assert_eq!(parsed_or("PROSPECT_TEST_PARSED", 25u32).unwrap(), 25);

        std::env::set_var("PROSPECT_TEST_PARSED", "40");
        assert_eq!(parsed_or("PROSPECT_TEST_PARSED", 25u32).unwrap(), 40);
        std::env::remove_var("PROSPECT_TEST_PARSED");
    }

    #[test]
    fn test_parsed_or_rejects_garbage() {
        std::env::set_var("PROSPECT_TEST_PARSED_BAD", "twenty");
        let err = parsed_or("PROSPECT_TEST_PARSED_BAD", 25u32).unwrap_err();
        assert!(matches!(err, EnvError::Invalid { ref value, .. } if value == "twenty"));
        std::env::remove_var("PROSPECT_TEST_PARSED_BAD");
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list("Founder, Co-Founder,,  "),
            vec!["Founder".to_string(), "Co-Founder".to_string()]
        );
        assert!(split_list(" , ").is_empty());
    }

    #[test]
    fn test_list_or_default() {
        std::env::remove_var("PROSPECT_TEST_LIST");
        assert_eq!(list_or("PROSPECT_TEST_LIST", &["a", "b"]), vec!["a", "b"]);
    }
}
