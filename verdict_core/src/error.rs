use thiserror::Error;

/// Failures that abort a decision before any verdict is produced.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EngineError {
    /// A record scalar lies outside [0,1] (NaN included).
    #[error("record `{agent_id}`: field `{field}` out of range [0,1]: {value}")]
    Validation {
        agent_id: String,
        field: &'static str,
        value: f64,
    },
    /// An aggregate invariant that should never break did.
    #[error("invariant breach: {detail}")]
    Invariant { detail: String },
}

impl EngineError {
    pub fn invariant(detail: impl Into<String>) -> Self {
        EngineError::Invariant {
            detail: detail.into(),
        }
    }

    /// Machine-readable kind tag.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Validation { .. } => "validation",
            EngineError::Invariant { .. } => "invariant",
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
