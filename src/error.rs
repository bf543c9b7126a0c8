use thiserror::Error;

/// Errors produced while building a sketch or reading its inputs.
#[derive(Debug, Error)]
pub enum Error {
    /// A sketch needs at least one slot.
    #[error("invalid capacity {0}: capacity must be at least 1")]
    InvalidCapacity(usize),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A malformed line in an edge stream or degree file (1-based line number).
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
