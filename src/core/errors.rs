//! Error taxonomy for the dispatch runtime
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Initial taxonomy extracted from ad-hoc anyhow errors

use thiserror::Error;

/// A handler definition is structurally invalid.
///
/// Raised by validator chains during registration. The registry catches it,
/// logs it with the item's identifier, and skips the registration; it never
/// escapes to the caller of `register`.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Outcome of a failed custom-id resolution.
///
/// The three variants are deliberately distinct so the dispatch boundary can
/// produce accurate diagnostics: *no handler* is not the same failure as
/// *invalid parameters* or *wrong interaction kind*.
#[derive(Debug, Error)]
pub enum RouteError {
    /// No registered pattern matched the identifier (unknown static key or
    /// no pattern under that key matched).
    #[error("no handler found for custom id \"{custom_id}\"")]
    NotFound { custom_id: String },

    /// A pattern matched but the handler's declared kind differs from the
    /// incoming interaction kind.
    #[error("handler \"{pattern}\" expects {expected}, got {actual}")]
    KindMismatch {
        pattern: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A pattern matched but the extracted parameters were rejected by the
    /// handler's params schema.
    #[error("invalid parameters for \"{pattern}\": {reason}")]
    InvalidParams { pattern: String, reason: String },
}

/// A remote fetch or bulk-replace call failed during command sync.
///
/// Treated as fatal to startup: the process must not proceed believing
/// commands are deployed when they are not.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to fetch commands for {scope}: {reason}")]
    Fetch { scope: String, reason: String },

    #[error("failed to replace commands for {scope}: {reason}")]
    Replace { scope: String, reason: String },
}

/// A module manifest could not be read or parsed.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse manifest: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("{0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_error_variants_are_distinct() {
        let not_found = RouteError::NotFound {
            custom_id: "menu/1".into(),
        };
        let mismatch = RouteError::KindMismatch {
            pattern: "menu/{id}".into(),
            expected: "Button",
            actual: "Modal",
        };
        let invalid = RouteError::InvalidParams {
            pattern: "menu/{id}".into(),
            reason: "id must be an integer".into(),
        };

        assert!(matches!(not_found, RouteError::NotFound { .. }));
        assert!(matches!(mismatch, RouteError::KindMismatch { .. }));
        assert!(matches!(invalid, RouteError::InvalidParams { .. }));
    }

    #[test]
    fn test_validation_error_message() {
        let err = ValidationError::new("name cannot be empty");
        assert_eq!(err.to_string(), "name cannot be empty");
    }
}
