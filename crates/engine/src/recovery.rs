/// Cold-start path: WAL replay into a fresh memory index and segment
/// rediscovery from the directory listing.
use memindex::MemIndex;
use std::io;
use std::path::{Path, PathBuf};
use wal::{Op, WalError, WalReader};

use crate::EngineError;

/// Replays the intent log at `path` into `mem`, returning how many records
/// were applied.
///
/// A missing log file is a fresh start and replays as empty. A truncated
/// or corrupt tail ends the replay at the last good record; new appends
/// then continue onto the existing file.
pub(crate) fn replay_wal_into(path: &Path, mem: &mut MemIndex) -> Result<u64, EngineError> {
    match WalReader::open(path) {
        Ok(mut reader) => {
            let mut applied = 0u64;
            reader.replay(|op, key, value| {
                applied += 1;
                match op {
                    Op::Put => mem.put(key, value),
                    Op::Del => {
                        mem.delete(&key);
                    }
                }
            })?;
            Ok(applied)
        }
        Err(WalError::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e.into()),
    }
}

/// Rebuilds the segment stack from `seg_<N>.sst` files found in `dir`,
/// ordered by numeric suffix ascending (oldest first), and derives the
/// next free segment id.
///
/// Files that do not parse as segment names are ignored.
pub(crate) fn discover_segments(dir: &Path) -> Result<(Vec<PathBuf>, u64), EngineError> {
    let mut found: Vec<(u64, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if let Some(n) = segment::segment_number(&path) {
            found.push((n, path));
        }
    }
    found.sort_by_key(|&(n, _)| n);

    let next_id = found.last().map(|&(n, _)| n + 1).unwrap_or(0);
    let paths = found.into_iter().map(|(_, p)| p).collect();
    Ok((paths, next_id))
}
