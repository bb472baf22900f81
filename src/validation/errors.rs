//! Validation error types

use std::io;

use thiserror::Error;

use crate::record::Field;

/// A single field check failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationFailure {
    /// Offending field
    pub field: Field,
    /// Human-readable reason
    pub reason: String,
}

impl ValidationFailure {
    pub fn new(field: Field, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors loading or checking a rules file
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("failed to read rules file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid rules JSON in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rule set '{set}': {rule} has min greater than max")]
    InvertedRange { set: String, rule: &'static str },

    #[error("rule set '{set}': {rule} must be {expected}")]
    OutOfDomain {
        set: String,
        rule: &'static str,
        expected: &'static str,
    },
}

/// Result type for rule loading
pub type RulesResult<T> = Result<T, RulesError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_display_names_field() {
        let failure = ValidationFailure::new(Field::Height, "must be between 50 and 250");
        assert_eq!(failure.to_string(), "height: must be between 50 and 250");
    }

    #[test]
    fn test_inverted_range_display() {
        let err = RulesError::InvertedRange {
            set: "custom".into(),
            rule: "height",
        };
        assert!(err.to_string().contains("custom"));
        assert!(err.to_string().contains("height"));
    }
}
