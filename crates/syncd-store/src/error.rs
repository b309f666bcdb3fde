use std::path::PathBuf;

/// Everything that can go wrong inside the store. The facade never
/// propagates these; they surface as a logged warning plus the operation's
/// negative result.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("profile file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XML in {}: {message}", .path.display())]
    MalformedXml { path: PathBuf, message: String },

    #[error("profile {name} has type {actual}, expected {expected}")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("profile {0} is protected and cannot be removed")]
    Protected(String),

    #[error("failed to back up {}: {source}", .path.display())]
    BackupFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to rename {} to {}", .from.display(), .to.display())]
    RenameFailure { from: PathBuf, to: PathBuf },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
