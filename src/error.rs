use thiserror::Error;

/// Errors raised while building or running a network.
#[derive(Debug, Error, PartialEq)]
pub enum BrainError {
    #[error("a network needs at least two layer sizes, all positive; got {0:?}")]
    InvalidTopology(Vec<usize>),

    /// The sensor vector does not fit the first layer. This is a wiring bug.
    #[error("input vector has {got} values but the network expects {expected}")]
    InputWidth { expected: usize, got: usize },

    #[error("layer shapes do not fit: {0}")]
    ShapeMismatch(String),
}

/// Errors raised by the elite store.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stored network rejected: {0}")]
    Shape(#[from] BrainError),
}
