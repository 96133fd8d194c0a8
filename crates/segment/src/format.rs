use std::path::{Path, PathBuf};

pub const SEGMENT_FILE_PREFIX: &str = "seg_";
pub const SEGMENT_FILE_EXT: &str = "sst";

/// Builds the path of segment `id` inside `dir`: `<dir>/seg_<id>.sst`.
pub fn segment_path(dir: &Path, id: u64) -> PathBuf {
    dir.join(format!("{}{}.{}", SEGMENT_FILE_PREFIX, id, SEGMENT_FILE_EXT))
}

/// Parses the numeric suffix out of a segment filename.
///
/// Returns `None` for anything that is not a well-formed `seg_<N>.sst`
/// name, which lets recovery skip stray files in the segment directory.
pub fn segment_number(path: &Path) -> Option<u64> {
    let name = path.file_name()?.to_str()?;
    let stem = name
        .strip_prefix(SEGMENT_FILE_PREFIX)?
        .strip_suffix(".sst")?;
    stem.parse().ok()
}
