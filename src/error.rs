//! Error types for the TV show renamer.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the TV show renamer.
#[derive(Error, Debug)]
pub enum Error {
    // File system errors
    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Destination already exists: {0}")]
    DestinationExists(String),

    #[error("Move failed: {from} -> {to}: {reason}")]
    MoveFailed {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Checksum mismatch after copying: {0}")]
    ChecksumMismatch(String),

    // Configuration errors
    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid pattern '{pattern}' in {category}: {reason}")]
    InvalidPattern {
        category: String,
        pattern: String,
        reason: String,
    },

    #[error("Invalid naming template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    // State file errors
    #[error("Invalid undo log: {0}")]
    InvalidUndoLog(String),

    #[error("Invalid checkpoint: {0}")]
    InvalidCheckpoint(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Whether the failure is worth retrying (file in use, permission races).
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Io(e) => is_transient_io(e),
            _ => false,
        }
    }
}

/// Classify an I/O error as transient.
pub fn is_transient_io(e: &std::io::Error) -> bool {
    use std::io::ErrorKind;

    matches!(
        e.kind(),
        ErrorKind::PermissionDenied
            | ErrorKind::WouldBlock
            | ErrorKind::Interrupted
            | ErrorKind::TimedOut
            | ErrorKind::ResourceBusy
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_transient_classification() {
        let busy = Error::Io(io::Error::new(io::ErrorKind::PermissionDenied, "locked"));
        assert!(busy.is_transient());

        let missing = Error::Io(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(!missing.is_transient());

        assert!(!Error::other("x").is_transient());
    }
}
