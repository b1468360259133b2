//! Per-run file snapshots for rof.
//!
//! This crate protects the top-level regular files of a working directory
//! for the duration of one command:
//! - Copy every regular file into a snapshot directory before the command runs
//! - Restore the copies over the originals if the command fails
//! - Remove the snapshot directory once the run is over
//!
//! Snapshots are named `<original>.<run-tag>.bak` and live in a single flat
//! directory (`.rof_snapshots` by default).
//!
//! # Example
//!
//! ```no_run
//! use rof_snapshot::{RunTag, SnapshotConfig, SnapshotStore};
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SnapshotStore::new(SnapshotConfig::default(), PathBuf::from("/project"))?;
//! let tag = RunTag::new();
//!
//! store.create_snapshots(&tag).await;
//!
//! // ... run something that fails ...
//!
//! store.restore_snapshots(&tag).await?;
//! store.cleanup().await;
//! # Ok(())
//! # }
//! ```

mod error;
mod snapshot;
mod store;

pub use error::{SnapshotError, SnapshotResult};
pub use snapshot::{parse_snapshot_name, snapshot_name, RunTag, SnapshotName, SNAPSHOT_SUFFIX};
pub use store::{
    RestoreReport, SkippedFile, SnapshotConfig, SnapshotReport, SnapshotStore,
    DEFAULT_SNAPSHOT_DIR,
};
