/// Write path: `put()`, `del()`, and the internal `flush()`.
///
/// Every mutation is appended to the intent log and fsynced before the
/// memory index changes. When the index reaches `mem_limit` entries, the
/// triggering put flushes it to a new segment on its own thread.
use std::io;

use crate::{lock, write_lock, Engine, EngineError};

/// Empty keys are refused before anything is logged.
fn empty_key() -> EngineError {
    EngineError::Io(io::Error::new(
        io::ErrorKind::InvalidInput,
        "key must not be empty",
    ))
}

impl Engine {
    /// Inserts or replaces a key.
    ///
    /// The intent is durable in the log before the memory index is
    /// touched; a log failure leaves the index exactly as it was. If this
    /// put takes the index to `mem_limit`, the flush (and any compaction
    /// it triggers) runs to completion before the call returns.
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<(), EngineError> {
        if key.is_empty() {
            return Err(empty_key());
        }

        {
            let mut wal = lock(&self.wal);
            wal.append_put(&key, &value)?;
        }

        let over_limit = {
            let mut mem = write_lock(&self.mem);
            mem.put(key, value);
            mem.len() >= self.config.mem_limit
        };

        if over_limit {
            self.flush()?;
        }
        Ok(())
    }

    /// Deletes a key from the memory index.
    ///
    /// The delete intent is logged durably first, unconditionally. Only a
    /// key resident in the memory index is acknowledged with `Ok`; a key
    /// whose only copy lives in a segment reports [`EngineError::KeyNotFound`]
    /// even though the logged intent survives replay.
    pub fn del(&self, key: &[u8]) -> Result<(), EngineError> {
        // Same guard as put, for symmetry: an empty key can never have
        // been stored, so nothing is logged for it either.
        if key.is_empty() {
            return Err(empty_key());
        }

        {
            let mut wal = lock(&self.wal);
            wal.append_del(key)?;
        }

        let removed = write_lock(&self.mem).delete(key);
        if removed {
            Ok(())
        } else {
            Err(EngineError::KeyNotFound)
        }
    }

    /// Drains the memory index into a freshly written segment.
    ///
    /// # Steps
    ///
    /// 1. Atomically swap the index contents out under the write lock.
    /// 2. Reserve the next segment id.
    /// 3. Write and fsync `seg_<id>.sst`. On failure the error goes to the
    ///    caller whose put triggered the flush; the drained snapshot is
    ///    gone from RAM and lives only in the intent log until the next
    ///    startup replays it. The path is not added to the stack.
    /// 4. Append the path to the stack; at `compaction_threshold` entries,
    ///    compact.
    pub(crate) fn flush(&self) -> Result<(), EngineError> {
        let snapshot = write_lock(&self.mem).drain();
        if snapshot.is_empty() {
            // A racing trigger lost the drain; nothing to write.
            return Ok(());
        }

        let id = {
            let mut stack = lock(&self.stack);
            let id = stack.next_id;
            stack.next_id += 1;
            id
        };
        let path = segment::segment_path(&self.segments_dir, id);

        segment::write_segment(&path, &snapshot)?;
        tracing::info!(
            entries = snapshot.len(),
            segment = %path.display(),
            "memory index flushed"
        );

        let over_threshold = {
            let mut stack = lock(&self.stack);
            stack.paths.push(path);
            stack.paths.len() >= self.config.compaction_threshold
        };

        if over_threshold {
            self.compact()?;
        }
        Ok(())
    }
}
