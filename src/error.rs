//! Error types for discovery, reading, validation and saving.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The root config could not be discovered. Fatal: nothing can be opened.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("SSH config not found at: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Failed to read SSH config {}: {source}", path.display())]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A problem with an included file. Discovery carries on without it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryWarning {
    Unreadable { path: PathBuf, reason: String },
    Missing { path: PathBuf },
    BadPattern { pattern: String, reason: String },
}

impl std::fmt::Display for DiscoveryWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscoveryWarning::Unreadable { path, reason } => {
                write!(f, "Included file {} is unreadable: {}", path.display(), reason)
            }
            DiscoveryWarning::Missing { path } => {
                write!(f, "Included file {} does not exist", path.display())
            }
            DiscoveryWarning::BadPattern { pattern, reason } => {
                write!(f, "Invalid Include pattern \"{}\": {}", pattern, reason)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Only files under {} can be accessed: {}", ssh_dir.display(), path.display())]
    OutsideSshDir { path: PathBuf, ssh_dir: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not valid UTF-8", .0.display())]
    Undecodable(PathBuf),
}

/// Validation could not run at all. Distinct from warnings.
#[derive(Debug, Error)]
pub enum ValidationFailure {
    #[error("Cannot validate against the config tree: {0}")]
    Tree(#[from] DiscoveryError),
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Only files under {} can be saved: {}", ssh_dir.display(), path.display())]
    OutsideSshDir { path: PathBuf, ssh_dir: PathBuf },

    #[error("Save not attempted: {0}")]
    Validation(#[from] ValidationFailure),

    #[error("Failed to write temporary file {}: {source}", path.display())]
    TempWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create backup {}: {source}", path.display())]
    Backup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to save SSH config {}: {source}", path.display())]
    Commit {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    #[error(transparent)]
    Save(#[from] SaveError),

    #[error("No open buffer for {}", .0.display())]
    UnknownBuffer(PathBuf),

    #[error("Nothing to save: {} has no unsaved changes", .0.display())]
    NotDirty(PathBuf),
}
