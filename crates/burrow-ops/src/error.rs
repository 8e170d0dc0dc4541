//! Error types for file operations.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result alias for file operations.
pub type OpsResult<T> = Result<T, OpsError>;

/// Errors that can occur during file operations.
#[derive(Debug, Error)]
pub enum OpsError {
    /// Generic I/O error with the path it happened at.
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Destination already exists; nothing is ever overwritten.
    #[error("{path}: already exists")]
    AlreadyExists { path: PathBuf },

    /// Source and destination are the same file.
    #[error("{path}: source and destination are the same file")]
    SameFile { path: PathBuf },

    /// File type that cannot be replicated.
    #[error("{path}: unsupported file type")]
    Unsupported { path: PathBuf },

    /// A proposed file name was rejected.
    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// The entry holds the staging directory and would take it along.
    #[error("{path}: holds the staging directory")]
    HoldsStaging { path: PathBuf },

    /// Undo was requested with an empty ledger.
    #[error("Nothing to undo")]
    NothingToUndo,

    /// The staging directory is disabled, so deletes are permanent.
    #[error("Staging is disabled; deletes cannot be undone")]
    StagingDisabled,

    /// Some items of a batch failed; the rest were processed.
    #[error("{failed} item(s) failed, first: {first}")]
    Partial {
        failed: usize,
        #[source]
        first: Box<OpsError>,
    },
}

impl OpsError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::AlreadyExists => Self::AlreadyExists { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create a name validation error.
    pub fn invalid_name(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// The path this error concerns, when there is one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Io { path, .. }
            | Self::AlreadyExists { path }
            | Self::SameFile { path }
            | Self::Unsupported { path }
            | Self::HoldsStaging { path } => Some(path),
            Self::Partial { first, .. } => first.path(),
            _ => None,
        }
    }

    /// Whether the error is a user mistake rather than a filesystem failure.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::InvalidName { .. }
                | Self::HoldsStaging { .. }
                | Self::NothingToUndo
                | Self::StagingDisabled
        )
    }
}

/// Collects failures from a batch and folds them into one error.
#[derive(Debug, Default)]
pub struct FailureSet {
    failed: usize,
    first: Option<OpsError>,
}

impl FailureSet {
    pub fn record(&mut self, err: OpsError) {
        self.failed += 1;
        if self.first.is_none() {
            self.first = Some(err);
        }
    }

    /// Number of failures recorded so far.
    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn into_result(self) -> OpsResult<()> {
        match self.first {
            None => Ok(()),
            Some(first) if self.failed == 1 => Err(first),
            Some(first) => Err(OpsError::Partial {
                failed: self.failed,
                first: Box::new(first),
            }),
        }
    }
}
