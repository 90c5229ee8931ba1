//! Crate-level errors for request building and configuration.
//!
//! Formula evaluation failures live in [`crate::compute::ComputationError`]
//! and authoring problems in [`crate::validation::ValidationError`]; neither
//! is surfaced through this type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Malformed solution: {0}")]
    MalformedSolution(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Two declared names normalize to the same identifier. Only raised when
    /// the collision policy is `error`.
    #[error("Names {names:?} all normalize to '{normalized}'")]
    NameCollision { normalized: String, names: Vec<String> },

    #[error("Circular reference between calculations: {}", names.join(" -> "))]
    CycleDetected { names: Vec<String> },
}

pub type EngineResult<T> = Result<T, EngineError>;
