use eyre::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Configuration required to run the export process.
/// This decouples the logic from how the arguments were parsed (CLI/Config file).
#[derive(Clone)]
pub struct ExportConfig {
    pub target_dir: PathBuf,
    pub token: String,
    pub dry_run: bool,
    pub skip_channels: bool,
    pub skip_private_channels: bool,
    pub skip_direct_messages: bool,
    pub verbose: bool,
    pub quiet: bool,
}

/// Serialize `value` to `path` as pretty-printed JSON with a 4-space
/// indent, replacing any previous content wholesale. Parent directories
/// are created as needed.
pub fn write_pretty_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .wrap_err_with(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    let file =
        File::create(path).wrap_err_with(|| format!("Failed to create: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    value
        .serialize(&mut serializer)
        .wrap_err_with(|| format!("Failed to write JSON: {}", path.display()))?;
    writer
        .flush()
        .wrap_err_with(|| format!("Failed to flush: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_with_four_space_indent() {
        let root = tempdir().unwrap();
        let path = root.path().join("out.json");

        write_pretty_json(&path, &vec![serde_json::json!({"a": 1})]).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "[\n    {\n        \"a\": 1\n    }\n]");
    }

    #[test]
    fn overwrites_previous_content_entirely() {
        let root = tempdir().unwrap();
        let path = root.path().join("out.json");

        write_pretty_json(&path, &vec!["first", "longer-than-the-second-write"]).unwrap();
        write_pretty_json(&path, &vec!["second"]).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "[\n    \"second\"\n]");
    }

    #[test]
    fn creates_missing_parent_directories() {
        let root = tempdir().unwrap();
        let path = root.path().join("a/b/out.json");

        write_pretty_json(&path, &Vec::<u8>::new()).unwrap();

        assert!(path.exists());
    }
}
