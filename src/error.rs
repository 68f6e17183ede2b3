//! Error types for distributed model evaluation
//!
//! Provides a unified error type for the evaluation core. Data-quality
//! conditions (unmapped identifiers, rows owned by another worker) are never
//! errors — they are handled by skipping. Errors here are structural contract
//! violations supplied by the caller.

use thiserror::Error;

/// Core error type for evaluation operations
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed partition boundary table
    #[error("Invalid partition: {0}")]
    InvalidPartition(String),

    /// Invalid input data or configuration
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Dimension or block-size disagreement between inputs
    #[error("Shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// Threading or synchronization error
    #[error("Execution error: {0}")]
    Execution(String),

    /// Other errors
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

// Helper functions for common error patterns

impl Error {
    /// Create an error for a factor-block size disagreement
    pub fn shape_mismatch(expected: usize, actual: usize, context: &str) -> Self {
        Self::ShapeMismatch {
            context: context.to_string(),
            expected,
            actual,
        }
    }

    /// Create an error for a local column index no worker owns
    pub fn no_owner(local_col: usize, total_items: u64) -> Self {
        Self::InvalidPartition(format!(
            "No worker owns local column {local_col} (partition covers {total_items} items)"
        ))
    }
}
