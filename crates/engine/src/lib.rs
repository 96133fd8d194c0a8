//! # Engine — the storage engine core
//!
//! The central orchestrator that ties the [`wal`], [`memindex`], and
//! [`segment`] crates into a complete log-structured key-value store.
//!
//! ## Architecture
//!
//! ```text
//! Client
//!   |
//!   v
//! ┌───────────────────────────────────────────────┐
//! │                   ENGINE                      │
//! │                                               │
//! │ write.rs → WAL append → MemIndex insert       │
//! │              |                                │
//! │              |  (mem_limit reached?)          │
//! │              |            yes                 │
//! │              v                                │
//! │           flush() → new segment               │
//! │              |                                │
//! │              |  (stack >= threshold?)         │
//! │              |            yes                 │
//! │              v                                │
//! │           compact() → one merged segment      │
//! │                                               │
//! │ read.rs → MemIndex → segments newest→oldest   │
//! │            (first match wins)                 │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Module responsibilities
//!
//! | Module         | Purpose                                             |
//! |----------------|-----------------------------------------------------|
//! | `lib.rs`       | `Engine` struct, constructor, errors, accessors     |
//! | [`config`]     | Tuning knobs (`mem_limit`, `compaction_threshold`)  |
//! | [`recovery`]   | WAL replay, segment rediscovery                     |
//! | `write`        | `put()`, `del()`, internal `flush()`                |
//! | `read`         | `get()`                                             |
//! | `compaction`   | full-stack merge into a single segment              |
//!
//! ## Locking
//!
//! Three disjoint locks; none is ever held across segment file I/O:
//!
//! - intent-log mutex — exclusive over encode + write + fsync of one record
//! - memory-index rwlock — shared for `get`, exclusive for mutations and
//!   the flush drain
//! - segment-stack mutex — guards the path vector and the id counter only
//!
//! All operations take `&self`; any number of OS threads may call in
//! concurrently. Flush and compaction run synchronously on the thread
//! whose `put` crossed the threshold. No background threads.
//!
//! ## Crash safety
//!
//! Every mutation is appended to the WAL and fsynced **before** the memory
//! index changes, so a kill at any point loses no acknowledged write. The
//! WAL is replayed in full at startup; segments are rediscovered from the
//! directory listing. Replay re-applies mutations that already reached a
//! segment, which is harmless: memory shadows segments on every read.

mod compaction;
mod config;
mod read;
mod recovery;
mod write;

pub use config::{Config, DEFAULT_COMPACTION_THRESHOLD, DEFAULT_MEM_LIMIT};

use memindex::MemIndex;
use segment::SegmentError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use wal::{WalError, WalWriter};

/// Subdirectory of the base holding the intent log.
pub const WAL_DIR: &str = "wal";
/// Subdirectory of the base holding segment files.
pub const SEGMENTS_DIR: &str = "segments";
/// Filename of the single intent-log file.
pub const WAL_FILENAME: &str = "kv.wal";

/// Errors surfaced by the three public operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// `get` found the key in neither memory nor any segment, or `del`
    /// targeted a key not resident in the memory index.
    #[error("key not found")]
    KeyNotFound,

    #[error(transparent)]
    Wal(#[from] WalError),

    #[error(transparent)]
    Segment(#[from] SegmentError),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// The ordered stack of segment files plus the id counter that names the
/// next one. Oldest first; later entries shadow earlier ones.
pub(crate) struct SegmentStack {
    pub(crate) paths: Vec<PathBuf>,
    /// Monotonic; never reused, so segment names cannot collide even
    /// across compactions and restarts.
    pub(crate) next_id: u64,
}

/// The storage engine. See the crate docs for the architecture.
///
/// `Engine` is `Send + Sync`; clone-free sharing via `Arc` is the intended
/// multi-threaded usage.
pub struct Engine {
    pub(crate) wal: Mutex<WalWriter>,
    pub(crate) mem: RwLock<MemIndex>,
    pub(crate) stack: Mutex<SegmentStack>,
    pub(crate) segments_dir: PathBuf,
    pub(crate) config: Config,
}

impl Engine {
    /// Opens (or creates) a store rooted at `base`, performing full
    /// recovery.
    ///
    /// # Recovery steps
    ///
    /// 1. Ensure `<base>/wal` and `<base>/segments` exist.
    /// 2. Replay `<base>/wal/kv.wal` into a fresh memory index (before the
    ///    append handle is opened). A missing log replays as empty; a
    ///    truncated or corrupt tail ends the replay at the last good
    ///    record.
    /// 3. Open the intent log for append; it stays open until drop.
    /// 4. Rebuild the segment stack from `seg_<N>.sst` files in the
    ///    segment directory, ordered by numeric suffix ascending.
    /// 5. Seed the id counter past the highest suffix found.
    pub fn open<P: AsRef<Path>>(base: P, config: Config) -> Result<Self, EngineError> {
        let base = base.as_ref();
        let wal_dir = base.join(WAL_DIR);
        let segments_dir = base.join(SEGMENTS_DIR);
        fs::create_dir_all(&wal_dir)?;
        fs::create_dir_all(&segments_dir)?;

        let wal_path = wal_dir.join(WAL_FILENAME);

        let mut mem = MemIndex::new();
        let replayed = recovery::replay_wal_into(&wal_path, &mut mem)?;

        let wal = WalWriter::open(&wal_path, config.wal_sync)?;

        let (paths, next_id) = recovery::discover_segments(&segments_dir)?;
        tracing::info!(
            records = replayed,
            entries = mem.len(),
            segments = paths.len(),
            "engine recovered"
        );

        Ok(Self {
            wal: Mutex::new(wal),
            mem: RwLock::new(mem),
            stack: Mutex::new(SegmentStack { paths, next_id }),
            segments_dir,
            config,
        })
    }

    /// Number of entries currently in the memory index.
    #[must_use]
    pub fn mem_entries(&self) -> usize {
        read_lock(&self.mem).len()
    }

    /// Number of segments currently in the stack.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        lock(&self.stack).paths.len()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("segments_dir", &self.segments_dir)
            .field("mem_entries", &self.mem_entries())
            .field("segment_count", &self.segment_count())
            .field("mem_limit", &self.config.mem_limit)
            .field("compaction_threshold", &self.config.compaction_threshold)
            .finish()
    }
}

// Poisoning recovery: no callback runs while a lock is held and the guarded
// structures are never left mid-mutation by a panic here, so the inner
// state is always consistent.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn read_lock<T>(l: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    l.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_lock<T>(l: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    l.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests;
