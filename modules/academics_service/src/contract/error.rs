//! Contract error types for academics service
//!
//! These errors are transport-agnostic and used for inter-module communication.

/// Academics service domain errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AcademicsError {
    /// Malformed input
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Actor lacks a resolved binding for the requested action
    #[error("Not authorized: {reason}")]
    Authorization { reason: String },

    /// Uniqueness constraint violated
    #[error("Duplicate {resource}: {key}")]
    Duplicate {
        /// Resource type (submission, roster_entry, grade, ...)
        resource: String,
        /// Conflicting key
        key: String,
    },

    /// Referenced entity absent
    #[error("{resource} not found: {id}")]
    NotFound {
        /// Resource type (class, teacher, subject, ...)
        resource: String,
        /// Resource identifier
        id: String,
    },

    /// Internal invariant violated. Never repaired silently.
    #[error("Consistency violation: {details}")]
    Consistency { details: String },

    /// Storage or wiring failure
    #[error("Internal error")]
    Internal,
}

impl AcademicsError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn authorization(reason: impl Into<String>) -> Self {
        Self::Authorization {
            reason: reason.into(),
        }
    }

    pub fn duplicate(resource: &str, key: impl std::fmt::Display) -> Self {
        Self::Duplicate {
            resource: resource.to_string(),
            key: key.to_string(),
        }
    }

    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    /// Errors the caller can report to the user and recover from
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::Authorization { .. }
                | Self::Duplicate { .. }
                | Self::NotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consistency_is_not_recoverable() {
        assert!(!AcademicsError::Consistency {
            details: "two primaries".to_string()
        }
        .is_recoverable());
        assert!(!AcademicsError::Internal.is_recoverable());
        assert!(AcademicsError::duplicate("submission", "a/b").is_recoverable());
    }

    #[test]
    fn display_includes_resource() {
        let err = AcademicsError::not_found("class", "10A");
        assert_eq!(err.to_string(), "class not found: 10A");
    }
}
