//! Error types for the policy library.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or interpreting permission policy.
#[derive(Error, Debug)]
pub enum PolicyError {
    /// Failed to read a settings file.
    #[error("failed to read settings from {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse settings JSON.
    #[error("failed to parse settings from {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Settings file not found.
    #[error("settings file not found at {0}")]
    NotFound(PathBuf),

    /// Permission denied when accessing settings.
    #[error("permission denied accessing settings at {path}: {source}")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to determine home directory.
    #[error("could not determine home directory")]
    NoHomeDirectory,

    /// Failed to determine the working directory.
    #[error("could not determine working directory: {0}")]
    NoWorkingDirectory(String),

    /// Invalid permission entry.
    #[error("invalid permission entry: {0}")]
    InvalidPermission(String),

    /// The transcript directory could not be walked.
    #[error("failed to scan transcripts under {path}: {source}")]
    TranscriptDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Figment configuration error.
    #[error("configuration error: {0}")]
    ConfigError(#[source] Box<figment::Error>),
}

/// Result type alias for policy operations.
pub type Result<T> = std::result::Result<T, PolicyError>;

impl PolicyError {
    /// A short remediation hint for the user, when one applies.
    pub fn help(&self) -> Option<&'static str> {
        match self {
            PolicyError::NotFound(_) => {
                Some("pass --settings <path> or create ~/.claude/settings.json")
            }
            PolicyError::ParseError { .. } => {
                Some("check the settings file for JSON syntax errors")
            }
            PolicyError::PermissionDenied { .. } => Some("check the file permissions"),
            PolicyError::NoHomeDirectory => Some("set the HOME environment variable"),
            PolicyError::TranscriptDir { .. } => {
                Some("pass --projects-dir <path> to point at the Claude Code transcripts")
            }
            PolicyError::ConfigError(_) => {
                Some("check ~/.claude/permguard.json and PERMGUARD_* environment variables")
            }
            _ => None,
        }
    }
}

impl From<figment::Error> for PolicyError {
    fn from(err: figment::Error) -> Self {
        PolicyError::ConfigError(Box::new(err))
    }
}
