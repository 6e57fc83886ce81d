use thiserror::Error;

#[derive(Debug, Error)]
pub enum RefiError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    /// Missing or malformed market policy. Never defaulted silently.
    #[error("Unconfigured policy: {field} — {reason}")]
    UnconfiguredPolicy { field: String, reason: String },

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl RefiError {
    pub(crate) fn policy(field: &str, reason: impl Into<String>) -> Self {
        RefiError::UnconfiguredPolicy {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn input(field: &str, reason: impl Into<String>) -> Self {
        RefiError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for RefiError {
    fn from(e: serde_json::Error) -> Self {
        RefiError::SerializationError(e.to_string())
    }
}

#[cfg(feature = "market")]
impl From<serde_yaml::Error> for RefiError {
    fn from(e: serde_yaml::Error) -> Self {
        RefiError::SerializationError(e.to_string())
    }
}
