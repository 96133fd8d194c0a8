/// Compaction: folds the whole segment stack into one consolidated
/// segment.
///
/// The taken segments are merged oldest to newest into a single map with
/// last-write-wins, so the newest copy of every key survives. Deletes are
/// realized purely by absence — a key removed from the memory index before
/// its flush simply never reached a segment; no tombstones travel across
/// segments.
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::{lock, Engine, EngineError};

impl Engine {
    /// Merges every segment currently in the stack into one new segment,
    /// then unlinks the inputs.
    ///
    /// Runs on the thread whose flush crossed `compaction_threshold`. The
    /// stack mutex is held only to take/restore/update the path vector,
    /// never across file I/O. A segment flushed concurrently while the
    /// merge runs is untouched: the consolidated segment re-enters the
    /// stack at the *front* (it is older than any such newcomer).
    pub(crate) fn compact(&self) -> Result<(), EngineError> {
        let (old_paths, id) = {
            let mut stack = lock(&self.stack);
            // Folding an empty stack is vacuous. A single segment still
            // gets rewritten under a fresh id; the copy is pointless work
            // but keeps the threshold contract exact for small configs.
            if stack.paths.is_empty() {
                return Ok(());
            }
            let old = std::mem::take(&mut stack.paths);
            let id = stack.next_id;
            stack.next_id += 1;
            (old, id)
        };

        // Oldest to newest, overwriting duplicates: last write wins.
        let mut merged = HashMap::new();
        let mut read_err = None;
        for path in &old_paths {
            if let Err(e) = segment::read_segment_into(path, &mut merged) {
                read_err = Some(e);
                break;
            }
        }
        if let Some(e) = read_err {
            self.restore_stack(old_paths);
            return Err(e.into());
        }

        let new_path = segment::segment_path(&self.segments_dir, id);
        if let Err(e) = segment::write_segment(&new_path, &merged) {
            self.restore_stack(old_paths);
            return Err(e.into());
        }

        {
            let mut stack = lock(&self.stack);
            for path in &old_paths {
                if let Err(e) = fs::remove_file(path) {
                    tracing::warn!(
                        segment = %path.display(),
                        error = %e,
                        "failed to unlink obsolete segment"
                    );
                }
            }
            stack.paths.insert(0, new_path.clone());
        }

        tracing::info!(
            inputs = old_paths.len(),
            entries = merged.len(),
            segment = %new_path.display(),
            "segment stack compacted"
        );
        Ok(())
    }

    /// Puts the taken segment paths back at the front of the stack after a
    /// failed merge, keeping anything a concurrent flush appended
    /// meanwhile in (newer) position behind them.
    fn restore_stack(&self, old_paths: Vec<PathBuf>) {
        let mut stack = lock(&self.stack);
        let newer = std::mem::take(&mut stack.paths);
        stack.paths = old_paths;
        stack.paths.extend(newer);
    }
}
