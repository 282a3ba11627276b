//! Central error handling for label resolution.
//!
//! Provides a unified `LabelError` enum. Absence of an optional technique
//! field is never an error; only caller misuse, malformed expressions and
//! values of the wrong type surface here.

/// Centralized error type for all label builder operations
#[derive(thiserror::Error, Debug)]
pub enum LabelError {
    #[error("Technique not configured: with_technique must be called before build")]
    TechniqueNotConfigured,

    #[error("Malformed expression: {0}")]
    MalformedExpression(String),

    #[error("Invalid value for `{field}`: expected {expected}, got {value}")]
    InvalidValue {
        field: &'static str,
        expected: &'static str,
        value: serde_json::Value,
    },

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl LabelError {
    /// Convenience constructor for malformed expressions
    pub fn malformed<T: ToString>(msg: T) -> Self {
        LabelError::MalformedExpression(msg.to_string())
    }

    /// Convenience constructor for a defined value of the wrong type
    pub fn invalid(field: &'static str, expected: &'static str, value: serde_json::Value) -> Self {
        LabelError::InvalidValue {
            field,
            expected,
            value,
        }
    }

    /// True for errors caused by calling the builders in the wrong order.
    pub fn is_programming_error(&self) -> bool {
        matches!(self, LabelError::TechniqueNotConfigured)
    }
}

/// Result type alias for label operations
pub type LabelResult<T> = Result<T, LabelError>;
