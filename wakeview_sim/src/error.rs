//! Error types for the replay host.

use std::path::PathBuf;
use thiserror::Error;
use wakeview_core::PlayerError;

/// Errors raised by the headless host.
#[derive(Debug, Error)]
pub enum SimError {
    /// A `--event` argument could not be parsed
    #[error("Invalid control event '{input}': {reason}")]
    InvalidEvent { input: String, reason: String },

    /// The player failed to load its inputs
    #[error(transparent)]
    Player(#[from] PlayerError),

    /// Settings file unreadable or not valid JSON
    #[error("Invalid settings file {path}: {reason}")]
    Settings { path: PathBuf, reason: String },

    /// Export could not be written
    #[error("Export to {path} failed: {reason}")]
    Export { path: PathBuf, reason: String },

    /// Runner configuration out of range
    #[error("Invalid runner config: {0}")]
    Config(String),
}

impl SimError {
    /// Creates an event parse error.
    pub fn invalid_event(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEvent {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Creates an export error.
    pub fn export(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::Export {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
