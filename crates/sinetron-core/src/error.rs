//! Error types for the playback core

use thiserror::Error;

/// Result type alias for playback operations
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Playback error types surfaced to the session observer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
    /// The resolved source set carried neither a main URL nor any
    /// explicit quality tiers. Only a fresh detail fetch can recover.
    #[error("no source available")]
    NoSourceAvailable,

    /// The media sink reported a failure for the current load.
    #[error("failed to load video: {0}")]
    LoadFailed(String),
}

impl PlayerError {
    /// Returns true if an explicit retry or resolution switch can
    /// recover from this error without refetching the detail payload
    pub fn is_retryable(&self) -> bool {
        matches!(self, PlayerError::LoadFailed(_))
    }
}
