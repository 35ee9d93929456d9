use std::fs;
use std::io;
use std::path::Path;

/// Merge-move every entry of `old` into `new`, then remove `old`.
///
/// Called when a rename event shows up mid-history: archive files already
/// written under the old conversation name belong under the new one.
/// `new` is created if absent and may already hold files from an earlier
/// rename in the same run; entries with colliding names are replaced.
/// When `old` does not exist nothing was written under it yet and the
/// call is a no-op.
pub fn relocate_dir(old: &Path, new: &Path) -> io::Result<()> {
    if !old.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(new)?;
    for entry in fs::read_dir(old)? {
        let entry = entry?;
        fs::rename(entry.path(), new.join(entry.file_name()))?;
    }
    fs::remove_dir(old)
}
