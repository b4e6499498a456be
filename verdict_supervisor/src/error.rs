use thiserror::Error;

use verdict_core::EngineError;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum OrchestratorError {
    /// Runner count differs from the fixed beam arity.
    #[error("multi-beam orchestration needs exactly {expected} agent runners, got {got}")]
    Arity { expected: usize, got: usize },
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl OrchestratorError {
    pub fn kind(&self) -> &'static str {
        match self {
            OrchestratorError::Arity { .. } => "arity",
            OrchestratorError::Engine(e) => e.kind(),
        }
    }
}
