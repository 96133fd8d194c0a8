use crate::SegmentError;
use codec::Decoded;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Scans every record of the segment at `path` into `out`, overwriting on
/// duplicate keys (last write wins).
///
/// A single segment never repeats a key, so the overwrite polarity only
/// matters when a caller layers several segments into one map: feeding them
/// oldest to newest leaves the newest value standing. Compaction depends on
/// exactly that.
///
/// The scan ends silently at end-of-stream, a torn tail, a CRC mismatch, or
/// an unreadable record; records decoded before the damage stay in `out`.
pub fn read_segment_into(
    path: &Path,
    out: &mut HashMap<Vec<u8>, Vec<u8>>,
) -> Result<(), SegmentError> {
    let file = File::open(path).map_err(SegmentError::Open)?;
    let mut rdr = BufReader::new(file);

    loop {
        match codec::decode_segment(&mut rdr) {
            Ok(Decoded::Record(rec)) => {
                out.insert(rec.key, rec.value);
            }
            Ok(Decoded::EndOfStream) | Ok(Decoded::Truncated) | Ok(Decoded::Corrupt) => {
                return Ok(())
            }
            // Mid-scan read errors truncate the scan like a torn tail.
            Err(_) => return Ok(()),
        }
    }
}

/// Point lookup: scans the segment at `path` for `key`.
///
/// Returns the value of the first matching record, `None` when the scan
/// ends (cleanly or at damage) without a match.
pub fn lookup_in_segment(path: &Path, key: &[u8]) -> Result<Option<Vec<u8>>, SegmentError> {
    let file = File::open(path).map_err(SegmentError::Open)?;
    let mut rdr = BufReader::new(file);

    loop {
        match codec::decode_segment(&mut rdr) {
            Ok(Decoded::Record(rec)) => {
                if rec.key == key {
                    return Ok(Some(rec.value));
                }
            }
            Ok(Decoded::EndOfStream) | Ok(Decoded::Truncated) | Ok(Decoded::Corrupt) => {
                return Ok(None)
            }
            Err(_) => return Ok(None),
        }
    }
}
