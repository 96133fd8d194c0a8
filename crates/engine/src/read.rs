/// Read path: `get()`.
///
/// The memory index is checked first (freshest data), then segments from
/// newest to oldest; the first match wins. Segment probes run without any
/// lock held — the stack is snapshotted under its mutex and released
/// before file I/O starts.
use segment::SegmentError;
use std::io;

use crate::{lock, read_lock, Engine, EngineError};

impl Engine {
    /// Looks up a key, returning a copy of its value.
    ///
    /// A segment path that has vanished between the stack snapshot and the
    /// probe (a compaction just unlinked it) counts as a miss for that
    /// segment; the probe continues with the older ones.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>, EngineError> {
        {
            let mem = read_lock(&self.mem);
            if let Some(v) = mem.get(key) {
                return Ok(v.clone());
            }
        }

        let paths = lock(&self.stack).paths.clone();
        for path in paths.iter().rev() {
            match segment::lookup_in_segment(path, key) {
                Ok(Some(v)) => return Ok(v),
                Ok(None) => continue,
                Err(SegmentError::Open(ref e)) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(EngineError::KeyNotFound)
    }
}
