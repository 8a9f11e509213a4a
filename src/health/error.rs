use thiserror::Error;

/// Errors raised while parsing or walking a health tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HealthError {
    #[error("Health feature '{path}' has no health value")]
    MissingHealth { path: String },

    #[error("Health feature '{path}' has unrecognized health '{value}'")]
    UnknownHealth { path: String, value: String },

    #[error("Invalid health document: {0}")]
    InvalidDocument(String),

    #[error("Health tree deeper than {max_depth} levels at '{path}'")]
    DepthExceeded { path: String, max_depth: usize },
}

pub type HealthResult<T> = Result<T, HealthError>;
