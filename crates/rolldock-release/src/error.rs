//! Error types for release-history persistence.

use thiserror::Error;

/// Result type alias for release-history operations.
pub type HistoryResult<T> = Result<T, HistoryError>;

/// Errors that can occur loading, saving, or decoding a release history.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("backend error: {0}")]
    Backend(#[from] anyhow::Error),

    #[error("failed to decode release history: {0}")]
    Decode(String),

    #[error("failed to encode release history: {0}")]
    Encode(String),

    /// Save still failing after the retry budget. The most dangerous
    /// failure mode — cluster state and tracked state have diverged.
    #[error("failed to persist release history after {attempts} attempts: {reason}")]
    Persistence { attempts: u32, reason: String },
}
