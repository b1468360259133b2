//! Snapshot, run, and roll back on failure.

use crate::executor::CommandExecutor;
use rof_snapshot::{RunTag, SnapshotError, SnapshotStore};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Stages of one protected run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Snapshotting,
    Executing,
    Succeeded,
    Restoring,
    CleaningUp,
}

/// Drives a single protected command run.
pub struct Runner<E> {
    store: SnapshotStore,
    executor: E,
    work_dir: PathBuf,
}

impl<E: CommandExecutor> Runner<E> {
    /// Create a runner for `work_dir`.
    pub fn new(store: SnapshotStore, executor: E, work_dir: PathBuf) -> Self {
        Self {
            store,
            executor,
            work_dir,
        }
    }

    /// Run `command_line` with the working directory protected.
    ///
    /// Returns the exit code the process should finish with. The only error
    /// is a snapshot from another run found during restoration; the snapshot
    /// directory is left in place in that case.
    pub async fn run(&self, command_line: &str) -> Result<i32, SnapshotError> {
        let tag = RunTag::new();
        debug!(run = %tag, "Starting run");

        self.enter(RunPhase::Snapshotting);
        let report = self.store.create_snapshots(&tag).await;
        if report.setup_error.is_some() {
            warn!("Running without snapshots, files will not be restored on failure");
        }

        self.enter(RunPhase::Executing);
        let exit_code = match self.executor.run(command_line, &self.work_dir).await {
            Ok(code) => code,
            Err(e) => {
                warn!("{}", e);
                1
            }
        };

        if exit_code == 0 {
            self.enter(RunPhase::Succeeded);
        } else {
            self.enter(RunPhase::Restoring);
            info!(
                "Command failed with result {}. Restoring files from snapshots...",
                exit_code
            );
            self.store.restore_snapshots(&tag).await?;
        }

        self.enter(RunPhase::CleaningUp);
        self.store.cleanup().await;

        Ok(exit_code)
    }

    fn enter(&self, phase: RunPhase) {
        debug!(?phase, "Run phase");
    }
}
