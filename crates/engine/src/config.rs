/// Default memory-index entry count that triggers a flush.
pub const DEFAULT_MEM_LIMIT: usize = 5;

/// Default segment count that triggers compaction after a flush.
pub const DEFAULT_COMPACTION_THRESHOLD: usize = 3;

/// Engine tuning knobs.
///
/// The defaults are deliberately tiny so flush and compaction are easy to
/// reach in tests. Realistic deployments raise `mem_limit` by orders of
/// magnitude; none of these knobs affect the on-disk format.
#[derive(Debug, Clone)]
pub struct Config {
    /// Memory-index entry count at which a put triggers a flush.
    pub mem_limit: usize,

    /// Segment-stack length at which a flush triggers compaction.
    pub compaction_threshold: usize,

    /// fsync the intent log on every append. Turning this off batches
    /// appends at the cost of the durability guarantee; only bulk loads
    /// that can be replayed from scratch should do so.
    pub wal_sync: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mem_limit: DEFAULT_MEM_LIMIT,
            compaction_threshold: DEFAULT_COMPACTION_THRESHOLD,
            wal_sync: true,
        }
    }
}
