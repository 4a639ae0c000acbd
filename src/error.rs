//! Error types for keepass-ssh.
//!
//! All errors are represented by [`KeepassSshError`]. Every variant renders as
//! a single line that starts with its category, so `main` can print it as-is.

use std::path::PathBuf;
use thiserror::Error;

/// All possible errors that can occur in keepass-ssh.
#[derive(Error, Debug)]
pub enum KeepassSshError {
    /// No database path came from flags, environment, config or discovery.
    #[error("Database error: no database path given (use -D, DB_PATH or the config file)")]
    MissingDatabase,

    /// The password database could not be opened (bad path, key or corrupt file).
    #[error("Database error: {0}")]
    StoreOpen(String),

    /// The requested group path does not exist in the database.
    #[error("Group not found: {0}")]
    GroupNotFound(String),

    /// Filtering left no entries to choose from.
    #[error("No server entries found{0}")]
    NoMatch(String),

    /// An entry's URL carries a port that is not a number in 1..=65535.
    #[error("Invalid URL for entry '{title}': {url}")]
    InvalidUrl {
        /// Title of the offending entry.
        title: String,
        /// The raw URL field.
        url: String,
    },

    /// A username or hostname that a client would parse as an option.
    #[error("Invalid entry '{title}': {field} must not start with '-'")]
    OptionLikeField {
        /// Title of the offending entry.
        title: String,
        /// `username` or `hostname`.
        field: &'static str,
    },

    /// Interactive input was not a number within the listed range.
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// The remote-shell client is missing or exited with a failure.
    #[error("SSH error: {0}")]
    Launch(String),

    /// The user aborted at a prompt.
    #[error("Operation cancelled by user")]
    Cancelled,

    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    /// Could not determine the user's config directory.
    #[error("Could not determine config directory")]
    NoConfigDir,

    /// Failed to read a file or a prompt.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parsing failed.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

impl KeepassSshError {
    /// Process exit status for this error.
    ///
    /// Cancelling at a prompt is not a failure and maps to 0; everything else is 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            KeepassSshError::Cancelled => 0,
            _ => 1,
        }
    }
}

/// Convenient Result type alias for keepass-ssh operations.
pub type Result<T> = std::result::Result<T, KeepassSshError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_exits_zero() {
        assert_eq!(KeepassSshError::Cancelled.exit_code(), 0);
        assert_eq!(
            KeepassSshError::Cancelled.to_string(),
            "Operation cancelled by user"
        );
    }

    #[test]
    fn test_failures_exit_one() {
        let errors = [
            KeepassSshError::MissingDatabase,
            KeepassSshError::StoreOpen("bad key".into()),
            KeepassSshError::GroupNotFound("Staging/Web".into()),
            KeepassSshError::NoMatch(String::new()),
            KeepassSshError::InvalidSelection("abc".into()),
            KeepassSshError::Launch("ssh exited with 255".into()),
        ];
        for e in errors {
            assert_eq!(e.exit_code(), 1, "{}", e);
        }
    }

    #[test]
    fn test_messages_start_with_category() {
        assert_eq!(
            KeepassSshError::GroupNotFound("Staging/Web".into()).to_string(),
            "Group not found: Staging/Web"
        );
        assert!(KeepassSshError::Launch("x".into()).to_string().starts_with("SSH error: "));
    }
}
