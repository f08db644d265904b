use serde::{Deserialize, Serialize};

/// Outcome of one discovery pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryStats {
    /// Workspace folders walked
    pub roots: usize,

    /// Files accepted
    pub files: usize,

    /// Total size of accepted files (only measured when a size cap is set)
    pub bytes: u64,

    /// Directories pruned and files skipped by ignore patterns. Files inside
    /// a pruned directory are never visited and not counted.
    pub ignored: usize,

    /// Files whose size could not be read
    pub stat_failures: usize,

    /// Directory entries the walker could not read
    pub walk_errors: usize,

    /// The aggregate budget ran out before the walk finished
    pub cancelled: bool,

    /// Aggregate budget left at the end of the pass
    pub remaining_bytes: Option<u64>,

    /// Time taken in milliseconds
    pub time_ms: u64,
}
