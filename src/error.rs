//! Centralized error types for casesort.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the casesort library.
#[derive(Error, Debug)]
pub enum CaseError {
    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The root folder to organize does not exist.
    #[error("Root folder not found: {0}")]
    RootNotFound(PathBuf),

    /// The root path exists but is not a readable directory.
    #[error("Root path is not a readable directory: {0}")]
    NotADirectory(PathBuf),

    /// An email container could not be parsed.
    #[error("Unreadable email '{path}': {reason}")]
    UnreadableEmail { path: PathBuf, reason: String },

    /// Saving or reading a single attachment failed.
    #[error("Attachment '{name}' could not be saved: {source}")]
    AttachmentIo {
        name: String,
        source: std::io::Error,
    },

    /// Copying a file into its category folder failed.
    #[error("Could not write '{path}': {source}")]
    DestinationWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The processing ledger could not be loaded or saved.
    #[error("Ledger error for '{path}': {reason}")]
    LedgerIo { path: PathBuf, reason: String },

    /// A nested email was found deeper than the configured maximum.
    #[error("Nesting depth {depth} exceeded for '{path}'")]
    RecursionLimitExceeded { path: PathBuf, depth: usize },
}

/// Convenience alias for `Result<T, CaseError>`.
pub type Result<T> = std::result::Result<T, CaseError>;

impl CaseError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an `UnreadableEmail` variant.
    pub fn unreadable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::UnreadableEmail {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a `LedgerIo` variant.
    pub fn ledger(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::LedgerIo {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Allow `?` on `std::io::Error` when no path context is available
/// (rare; prefer `CaseError::io`).
impl From<std::io::Error> for CaseError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}
