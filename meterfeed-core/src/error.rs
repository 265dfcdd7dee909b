//! Core error types for `meterfeed`.

use thiserror::Error;

/// Core error type for `meterfeed` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The raw payload does not have the expected shape.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}
