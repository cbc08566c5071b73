//! Domain errors shared across bounded contexts.

use thiserror::Error;

/// Domain-level errors that can occur in business logic.
///
/// These errors are independent of infrastructure concerns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Invalid value for a field.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },

    /// Invalid state transition attempted.
    #[error("Invalid {entity} transition {from} -> {to}")]
    InvalidStateTransition {
        /// Entity type (e.g., "StopLossType").
        entity: String,
        /// Current state.
        from: String,
        /// Attempted state.
        to: String,
    },
}

impl DomainError {
    /// Shorthand for [`DomainError::InvalidValue`].
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_error_display() {
        let err = DomainError::invalid("quantity", "must be positive");
        assert_eq!(err.to_string(), "Invalid value for quantity: must be positive");

        let err = DomainError::InvalidStateTransition {
            entity: "StopLossType".to_string(),
            from: "TRAILING".to_string(),
            to: "PROTECTIVE".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid StopLossType transition TRAILING -> PROTECTIVE"
        );
    }
}
