//! Snapshot error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Errors that can occur during snapshot operations.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A snapshot in the directory belongs to a different run.
    ///
    /// Restoring it could put back the wrong generation of a file, so the
    /// whole restoration is abandoned.
    #[error(
        "snapshot '{found}' does not belong to run {expected}, kindly restore it manually from the snapshot dir {}",
        .snapshot_dir.display()
    )]
    GenerationMismatch {
        expected: String,
        found: String,
        snapshot_dir: PathBuf,
    },

    /// Snapshot directory name is not a single plain directory name.
    #[error("Invalid snapshot directory name: {0:?}")]
    InvalidDirName(String),
}

impl SnapshotError {
    /// Create a generation mismatch error.
    pub fn generation_mismatch(
        expected: impl Into<String>,
        found: impl Into<String>,
        snapshot_dir: impl Into<PathBuf>,
    ) -> Self {
        Self::GenerationMismatch {
            expected: expected.into(),
            found: found.into(),
            snapshot_dir: snapshot_dir.into(),
        }
    }

    /// Check if this error is the restoration hard-abort.
    pub fn is_generation_mismatch(&self) -> bool {
        matches!(self, Self::GenerationMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_mismatch_message() {
        let err = SnapshotError::generation_mismatch(
            "20240101120000-aaaaaaaa",
            "a.txt.20230101120000-bbbbbbbb.bak",
            ".rof_snapshots",
        );
        let msg = err.to_string();
        assert!(msg.contains("20240101120000-aaaaaaaa"));
        assert!(msg.contains("a.txt.20230101120000-bbbbbbbb.bak"));
        assert!(msg.contains("restore it manually"));
        assert!(msg.contains(".rof_snapshots"));
        assert!(err.is_generation_mismatch());
    }

    #[test]
    fn test_io_error_is_not_generation_mismatch() {
        let err: SnapshotError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(!err.is_generation_mismatch());
    }
}
