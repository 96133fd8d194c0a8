use crate::{Config, Engine, SEGMENTS_DIR, WAL_DIR, WAL_FILENAME};
use std::fs;
use std::path::{Path, PathBuf};

/// Counts `.sst` files in the segment directory under `base`.
pub fn count_segment_files(base: &Path) -> usize {
    fs::read_dir(base.join(SEGMENTS_DIR))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|s| s.to_str())
                .map(|ext| ext == "sst")
                .unwrap_or(false)
        })
        .count()
}

pub fn wal_file(base: &Path) -> PathBuf {
    base.join(WAL_DIR).join(WAL_FILENAME)
}

pub fn segment_file(base: &Path, id: u64) -> PathBuf {
    segment::segment_path(&base.join(SEGMENTS_DIR), id)
}

/// A config that never flushes on its own; everything stays in memory.
pub fn mem_only() -> Config {
    Config {
        mem_limit: usize::MAX,
        ..Config::default()
    }
}

/// A config that flushes on every put and never compacts.
pub fn flush_every_put() -> Config {
    Config {
        mem_limit: 1,
        compaction_threshold: usize::MAX,
        ..Config::default()
    }
}

pub fn open(base: &Path, config: Config) -> Engine {
    Engine::open(base, config).unwrap()
}
