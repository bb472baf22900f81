//! Store error types
//!
//! Error codes:
//! - FC_VALIDATION_FAILED (ERROR severity)
//! - FC_DUPLICATE_ID (ERROR severity)
//! - FC_NOT_FOUND (ERROR severity)
//! - FC_UNSUPPORTED_OPERATION (ERROR severity)
//! - FC_MALFORMED_INPUT (ERROR severity)
//! - FC_STORAGE_IO (ERROR severity)
//! - FC_DATA_CORRUPTION (FATAL severity)

use std::fmt;
use std::io;

use crate::record::RecordId;
use crate::validation::ValidationFailure;

/// Severity levels for store errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, the store remains usable
    Error,
    /// The backing file cannot be trusted; the store must not be used
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Store error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    /// A field value violates the active rule set
    ValidationFailed,
    /// Insert with an id that is already live
    DuplicateId,
    /// Target id is not live
    NotFound,
    /// Operation not offered by this backend
    UnsupportedOperation,
    /// Import data could not be parsed
    MalformedInput,
    /// Disk I/O failure
    StorageIo,
    /// Backing file does not decode as slots
    DataCorruption,
}

impl StoreErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            StoreErrorCode::ValidationFailed => "FC_VALIDATION_FAILED",
            StoreErrorCode::DuplicateId => "FC_DUPLICATE_ID",
            StoreErrorCode::NotFound => "FC_NOT_FOUND",
            StoreErrorCode::UnsupportedOperation => "FC_UNSUPPORTED_OPERATION",
            StoreErrorCode::MalformedInput => "FC_MALFORMED_INPUT",
            StoreErrorCode::StorageIo => "FC_STORAGE_IO",
            StoreErrorCode::DataCorruption => "FC_DATA_CORRUPTION",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            StoreErrorCode::DataCorruption => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Store error with context
#[derive(Debug)]
pub struct StoreError {
    code: StoreErrorCode,
    message: String,
    details: Option<String>,
    validation: Option<ValidationFailure>,
    source: Option<io::Error>,
}

impl StoreError {
    fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            validation: None,
            source: None,
        }
    }

    /// A draft failed validation
    pub fn validation_failed(failure: ValidationFailure) -> Self {
        Self {
            validation: Some(failure.clone()),
            ..Self::new(StoreErrorCode::ValidationFailed, failure.to_string())
        }
    }

    /// A stored or incoming record failed validation
    pub fn validation_for_record(id: RecordId, failure: ValidationFailure) -> Self {
        Self::validation_failed(failure).with_details(format!("record_id: {}", id))
    }

    /// Insert with an id that already exists
    pub fn duplicate_id(id: RecordId) -> Self {
        Self::new(
            StoreErrorCode::DuplicateId,
            format!("record #{} already exists", id),
        )
    }

    /// Target id is absent
    pub fn not_found(id: RecordId) -> Self {
        Self::new(StoreErrorCode::NotFound, format!("record #{} not found", id))
    }

    /// Operation not supported by this backend
    pub fn unsupported(operation: &str, backend: &str) -> Self {
        Self::new(
            StoreErrorCode::UnsupportedOperation,
            format!("{} is not supported by the {} store", operation, backend),
        )
    }

    /// Input data could not be parsed
    pub fn malformed_input(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::MalformedInput, message)
    }

    /// Disk I/O failure
    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            source: Some(source),
            ..Self::new(StoreErrorCode::StorageIo, message)
        }
    }

    /// Backing file is not a whole number of valid slots (FATAL)
    pub fn data_corruption(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::DataCorruption, message)
    }

    /// Data corruption with byte offset context
    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        Self::data_corruption(reason).with_details(format!("byte_offset: {}", offset))
    }

    /// Attach or replace the details string
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn code(&self) -> StoreErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// The field check that failed, for validation errors
    pub fn validation_failure(&self) -> Option<&ValidationFailure> {
        self.validation.as_ref()
    }

    /// Returns whether this error is fatal
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl From<ValidationFailure> for StoreError {
    fn from(failure: ValidationFailure) -> Self {
        Self::validation_failed(failure)
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Field;

    #[test]
    fn test_error_codes() {
        assert_eq!(StoreErrorCode::ValidationFailed.code(), "FC_VALIDATION_FAILED");
        assert_eq!(StoreErrorCode::DuplicateId.code(), "FC_DUPLICATE_ID");
        assert_eq!(StoreErrorCode::NotFound.code(), "FC_NOT_FOUND");
        assert_eq!(StoreErrorCode::UnsupportedOperation.code(), "FC_UNSUPPORTED_OPERATION");
        assert_eq!(StoreErrorCode::MalformedInput.code(), "FC_MALFORMED_INPUT");
        assert_eq!(StoreErrorCode::StorageIo.code(), "FC_STORAGE_IO");
        assert_eq!(StoreErrorCode::DataCorruption.code(), "FC_DATA_CORRUPTION");
    }

    #[test]
    fn test_only_corruption_is_fatal() {
        assert!(StoreError::data_corruption("bad length").is_fatal());
        assert!(!StoreError::duplicate_id(3).is_fatal());
        assert!(!StoreError::io_error("disk", io::Error::new(io::ErrorKind::Other, "x")).is_fatal());
    }

    #[test]
    fn test_validation_error_keeps_failure() {
        let failure = ValidationFailure::new(Field::Height, "too tall");
        let err = StoreError::validation_for_record(9, failure.clone());

        assert_eq!(err.code(), StoreErrorCode::ValidationFailed);
        assert_eq!(err.validation_failure(), Some(&failure));
        assert_eq!(err.details(), Some("record_id: 9"));
        assert_eq!(err.message(), "height: too tall");
    }

    #[test]
    fn test_display_contains_context() {
        let err = StoreError::corruption_at_offset(566, "tombstone flag 7");
        let display = err.to_string();
        assert!(display.contains("FATAL"));
        assert!(display.contains("FC_DATA_CORRUPTION"));
        assert!(display.contains("byte_offset: 566"));
    }
}
