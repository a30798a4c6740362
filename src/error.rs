//! Custom error types for the coupon tracker
//!
//! Validation problems, entitlement denials and storage failures are kept as
//! distinct variants so callers can tell a refused form apart from an upsell.

use thiserror::Error;

use crate::services::entitlement::UpsellReason;

/// The main error type for coupon tracker operations
#[derive(Error, Debug)]
pub enum CouponError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// The entitlement provider refused a gated operation
    #[error("Upgrade required: {0}")]
    Upsell(UpsellReason),

    /// Operation refused on a protected entity (built-in lists, last list)
    #[error("Protected: {0}")]
    Protected(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),
}

impl CouponError {
    /// Create a "not found" error for records
    pub fn record_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Record",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for lists
    pub fn list_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "List",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this error should surface as an upgrade prompt
    pub fn is_upsell(&self) -> bool {
        matches!(self, Self::Upsell(_))
    }
}

impl From<std::io::Error> for CouponError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CouponError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for coupon tracker operations
pub type CouponResult<T> = Result<T, CouponError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CouponError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = CouponError::record_not_found("rec-1234abcd");
        assert_eq!(err.to_string(), "Record not found: rec-1234abcd");
        assert!(err.is_not_found());
        assert!(!err.is_upsell());
    }

    #[test]
    fn test_upsell_is_distinct_from_validation() {
        let err = CouponError::Upsell(UpsellReason::RecordLimit { limit: 10 });
        assert!(err.is_upsell());
        assert!(!err.is_validation());
        assert_eq!(
            err.to_string(),
            "Upgrade required: free tier is limited to 10 records"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CouponError = io_err.into();
        assert!(matches!(err, CouponError::Io(_)));
    }
}
