//! Run tags and snapshot file naming.

use chrono::Local;
use uuid::Uuid;

/// Suffix carried by every snapshot file.
pub const SNAPSHOT_SUFFIX: &str = ".bak";

/// Separator between the original name, the run tag and the suffix.
const SEPARATOR: char = '.';

/// Timestamp layout of the run tag prefix (second resolution).
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Identifier for one invocation, shared by all snapshots it takes.
///
/// Formatted as `<YYYYMMDDHHMMSS>-<8 hex chars>`. The timestamp keeps tags
/// ordered by time; the random suffix separates runs started within the
/// same second. A tag never contains `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunTag(String);

impl RunTag {
    /// Create a new run tag from the system clock.
    pub fn new() -> Self {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT);
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("{}-{}", timestamp, &suffix[..8]))
    }

    /// Create a run tag from a string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the tag as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunTag {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a file in the snapshot directory relates to the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotName<'a> {
    /// Not a snapshot file (no `.bak` suffix).
    NotSnapshot,
    /// A snapshot of `original` taken by the current run.
    Current { original: &'a str },
    /// A snapshot left behind by some other run.
    Foreign,
    /// Carries the current tag but no original name in front of it.
    Malformed,
}

/// Build the snapshot file name for `original` under `tag`.
pub fn snapshot_name(original: &str, tag: &RunTag) -> String {
    format!("{original}{SEPARATOR}{tag}{SNAPSHOT_SUFFIX}")
}

/// Classify a snapshot directory entry against the current run tag.
///
/// The tag is matched exactly, so original names containing `.` (such as
/// `archive.tar.gz`) come back intact.
pub fn parse_snapshot_name<'a>(file_name: &'a str, tag: &RunTag) -> SnapshotName<'a> {
    let Some(base) = file_name.strip_suffix(SNAPSHOT_SUFFIX) else {
        return SnapshotName::NotSnapshot;
    };

    let Some(rest) = base.strip_suffix(tag.as_str()) else {
        return SnapshotName::Foreign;
    };

    match rest.strip_suffix(SEPARATOR) {
        Some(original) if !original.is_empty() => SnapshotName::Current { original },
        _ => SnapshotName::Malformed,
    }
}
