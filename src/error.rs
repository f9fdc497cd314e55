//! Error types for the collection scanner and exporter

use std::path::PathBuf;
use thiserror::Error;

/// Error kinds that can occur while building or writing a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanErrorKind {
    /// Scan root is missing, inaccessible or not a directory
    InvalidRoot,
    /// Tag extraction failed on a recognized audio file
    Extraction,
    /// Directory entry that is neither a regular file nor a directory
    UnexpectedEntry,
    /// Output file already exists, or could not be created or written
    IoError,
    /// Tree shape violates the collection/volume/folder/file nesting rules
    Structural,
}

impl ScanErrorKind {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanErrorKind::InvalidRoot => "invalid_root",
            ScanErrorKind::Extraction => "extraction",
            ScanErrorKind::UnexpectedEntry => "unexpected_entry",
            ScanErrorKind::IoError => "io",
            ScanErrorKind::Structural => "structural",
        }
    }
}

/// Represents an error that aborted a build or an export
#[derive(Debug, Error)]
#[error("{kind:?}: {message} (path: {path:?})")]
pub struct ScanError {
    /// The kind of error
    pub kind: ScanErrorKind,
    /// The path where the error occurred
    pub path: Option<PathBuf>,
    /// Human-readable error message
    pub message: String,
}

impl ScanError {
    /// Create a new scan error
    pub fn new(kind: ScanErrorKind, path: Option<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path,
            message: message.into(),
        }
    }

    /// Create an invalid root error
    pub fn invalid_root(path: PathBuf, message: impl Into<String>) -> Self {
        Self::new(ScanErrorKind::InvalidRoot, Some(path), message)
    }

    /// Create a tag extraction error
    pub fn extraction(path: PathBuf, message: impl Into<String>) -> Self {
        Self::new(ScanErrorKind::Extraction, Some(path), message)
    }

    /// Create an unexpected entry error
    pub fn unexpected_entry(path: PathBuf) -> Self {
        Self::new(
            ScanErrorKind::UnexpectedEntry,
            Some(path.clone()),
            format!("Unexpected item in {:?}", path),
        )
    }

    /// Create an I/O error
    pub fn io_error(path: Option<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(ScanErrorKind::IoError, path, message)
    }

    /// Create a structural error naming the offending node
    pub fn structural(node: &str, message: impl Into<String>) -> Self {
        Self::new(
            ScanErrorKind::Structural,
            None,
            format!("{} [{}]", message.into(), node),
        )
    }
}

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        Self::io_error(None, err.to_string())
    }
}
