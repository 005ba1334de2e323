use thiserror::Error;

/// Result type for heat scoring operations
pub type Result<T> = std::result::Result<T, HeatError>;

/// Errors that can occur while scoring commit history
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeatError {
    /// Commit data failed validation at the scoring boundary. The scorer
    /// never substitutes defaults for malformed required fields.
    #[error("invalid commit metrics: {0}")]
    InvalidMetrics(String),
}

impl HeatError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidMetrics(msg.into())
    }
}
