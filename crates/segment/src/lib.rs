//! # Segment — immutable on-disk key/value files
//!
//! When the memory index reaches its size limit the engine flushes it to
//! disk as a segment. Segments are *write-once, read-many*: created by a
//! flush or a compaction, never mutated, removed only when a compaction
//! supersedes them.
//!
//! ## File layout
//!
//! A segment is a flat stream of [`codec`] segment records:
//!
//! ```text
//! [crc32: u32 LE][key_len: u32 LE][val_len: u32 LE][key][value]
//! ...repeated, one record per live key, in no particular order...
//! ```
//!
//! There is no footer, index, or filter: the segment stack stays small
//! (compaction folds it at a handful of files), so point lookups are linear
//! scans. A torn or corrupt tail is detected by a short read or CRC
//! mismatch and silently ends the scan; every intact record before it is
//! still served.
//!
//! ## Naming
//!
//! Segments live in one directory as `seg_<N>.sst`, `N` a monotonically
//! increasing counter. A higher `N` means a newer segment; the engine's
//! read path relies on that when it probes newest-first.

mod format;
mod reader;
mod writer;

pub use format::{segment_number, segment_path, SEGMENT_FILE_EXT, SEGMENT_FILE_PREFIX};
pub use reader::{lookup_in_segment, read_segment_into};
pub use writer::write_segment;

use std::io;
use thiserror::Error;

/// Errors from segment-file operations.
///
/// Read-side damage (torn tail, CRC mismatch) is not an error: scans absorb
/// it and end early.
#[derive(Debug, Error)]
pub enum SegmentError {
    /// The segment path could not be opened for read or write.
    #[error("segment open failed: {0}")]
    Open(#[source] io::Error),

    /// A write or fsync failed while creating a segment.
    #[error("segment write failed: {0}")]
    Write(#[source] io::Error),
}
