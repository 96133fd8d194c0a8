use crate::SegmentError;
use codec::CodecError;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

/// Writes a whole segment at `path` from the given map.
///
/// One record per entry, in map iteration order (order carries no meaning
/// inside a segment — a key appears at most once). The file is fsynced
/// before the call returns, so a path handed to the caller is fully
/// durable.
///
/// On failure the file is left in whatever state the filesystem produced;
/// the caller must not reference the path.
pub fn write_segment(
    path: &Path,
    entries: &HashMap<Vec<u8>, Vec<u8>>,
) -> Result<(), SegmentError> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(SegmentError::Open)?;

    let mut buf = Vec::with_capacity(256);
    for (key, value) in entries {
        codec::encode_segment(key, value, &mut buf).map_err(|e| match e {
            CodecError::BodyTooLarge(_) => {
                SegmentError::Write(io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))
            }
            CodecError::Io(io_err) => SegmentError::Write(io_err),
        })?;
        file.write_all(&buf).map_err(SegmentError::Write)?;
    }

    file.sync_all().map_err(SegmentError::Write)?;
    Ok(())
}
