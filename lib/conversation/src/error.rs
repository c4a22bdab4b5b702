//! Error types for the conversation crate.

use std::fmt;

/// Errors from building conversation values out of untrusted input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationError {
    /// A request field failed validation.
    InvalidField {
        /// The offending field name.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl fmt::Display for ConversationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidField { field, reason } => {
                write!(f, "invalid {field}: {reason}")
            }
        }
    }
}

impl std::error::Error for ConversationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_field_display() {
        let err = ConversationError::InvalidField {
            field: "thread_id",
            reason: "must not be empty".to_string(),
        };
        assert_eq!(err.to_string(), "invalid thread_id: must not be empty");
    }
}
