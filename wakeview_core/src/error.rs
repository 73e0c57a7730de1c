//! Error types for loading simulation logs and ship documents.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that make a load fail as a whole.
///
/// Per-record problems (a bad token, a broken line) never surface here;
/// they are recovered inside the parser and only counted in the
/// [`LoadReport`](crate::log_parser::LoadReport).
#[derive(Debug, Error)]
pub enum PlayerError {
    /// File missing or unreadable
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV header row could not be read
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// No header cell maps to the time channel
    #[error("No time column in log header")]
    MissingTimeColumn,

    /// Header row present but no data rows (or no header at all)
    #[error("Log contains no data rows")]
    EmptyLog,

    /// A field extraction pattern failed to compile
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

impl PlayerError {
    /// Creates an I/O error tagged with the offending path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, PlayerError>;
