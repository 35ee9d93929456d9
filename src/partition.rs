use crate::message::{ConversationKind, Message, MessageKind};
use crate::relocate::relocate_dir;
use crate::timestamp;
use crate::utils::write_pretty_json;
use eyre::{Context, Result};
use std::path::Path;

/// Day-bucketing state for one conversation's partitioning pass.
///
/// Owned by the caller and driven one message at a time: `step` buffers
/// the message into the current day's bucket, flushing the previous
/// bucket whenever the UTC day changes, and `finish` flushes whatever is
/// left. Rename events switch the directory all subsequent flushes
/// target and physically relocate everything written so far.
///
/// The day key starts as the empty string, which no real message can
/// produce, so the first message always triggers a flush of the (empty)
/// pre-history bucket into `<dir>/.json`.
// TODO: suppress that first flush — the `.json` file is an artifact, but
// dropping it changes the on-disk file set, so existing consumers need a
// look first.
pub struct PartitionState {
    day_key: String,
    bucket: Vec<Message>,
    dir: String,
    kind: ConversationKind,
}

impl PartitionState {
    pub fn new(dir: impl Into<String>, kind: ConversationKind) -> Self {
        Self {
            day_key: String::new(),
            bucket: Vec::new(),
            dir: dir.into(),
            kind,
        }
    }

    /// Directory name flushes currently target. Starts as the name the
    /// conversation was listed under; rename events move it.
    pub fn current_dir(&self) -> &str {
        &self.dir
    }

    /// Feed one message through the partitioner.
    ///
    /// Messages must arrive oldest-first; day buckets are flushed the
    /// moment a later day shows up, so out-of-order input would clobber
    /// already-written files.
    pub fn step(&mut self, parent: &Path, message: Message) -> Result<()> {
        let instant = timestamp::parse_ts(&message.ts)?;
        let day = timestamp::day_key(&instant);
        if day != self.day_key {
            self.flush(parent)?;
            self.day_key = day;
        }

        if let MessageKind::Rename { old, new } = message.kind(self.kind) {
            let old_path = parent.join(old);
            let new_path = parent.join(new);
            relocate_dir(&old_path, &new_path).wrap_err_with(|| {
                format!(
                    "Failed to relocate {} -> {}",
                    old_path.display(),
                    new_path.display()
                )
            })?;
            self.dir = new.to_string();
        }

        self.bucket.push(message);
        Ok(())
    }

    /// Flush the final (possibly empty) bucket. Call once, after the
    /// last message.
    pub fn finish(&mut self, parent: &Path) -> Result<()> {
        self.flush(parent)
    }

    fn flush(&mut self, parent: &Path) -> Result<()> {
        let path = parent
            .join(&self.dir)
            .join(format!("{}.json", self.day_key));
        write_pretty_json(&path, &self.bucket)?;
        self.bucket.clear();
        Ok(())
    }
}

/// Partition one conversation's oldest-first history into per-day JSON
/// files under `{parent}/{dir}/`, following rename events as they appear
/// in the stream.
pub fn partition_messages(
    parent: &Path,
    dir: &str,
    messages: Vec<Message>,
    kind: ConversationKind,
) -> Result<()> {
    let mut state = PartitionState::new(dir, kind);
    for message in messages {
        state.step(parent, message)?;
    }
    state.finish(parent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::tempdir;

    fn message(ts: &str) -> Message {
        Message {
            ts: ts.to_string(),
            subtype: None,
            name: None,
            old_name: None,
            rest: BTreeMap::new(),
        }
    }

    fn rename_message(ts: &str, subtype: &str, old: &str, new: &str) -> Message {
        Message {
            ts: ts.to_string(),
            subtype: Some(subtype.to_string()),
            name: Some(new.to_string()),
            old_name: Some(old.to_string()),
            rest: BTreeMap::new(),
        }
    }

    fn read_day(path: &Path) -> Vec<Message> {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    // Whole seconds on 2020-01-01, -02 and -03 (UTC).
    const D1A: &str = "1577836800.000100";
    const D1B: &str = "1577840400.000200";
    const D2A: &str = "1577923200.000300";
    const D2B: &str = "1577926800.000400";
    const D2C: &str = "1577930400.000500";
    const D3A: &str = "1578009600.000600";

    #[test]
    fn splits_messages_into_one_file_per_day() {
        let root = tempdir().unwrap();
        let messages = vec![
            message(D1A),
            message(D1B),
            message(D2A),
            message(D2B),
            message(D2C),
            message(D3A),
        ];

        partition_messages(root.path(), "general", messages, ConversationKind::Channel).unwrap();

        let dir = root.path().join("general");
        let day1 = read_day(&dir.join("2020-01-01.json"));
        let day2 = read_day(&dir.join("2020-01-02.json"));
        let day3 = read_day(&dir.join("2020-01-03.json"));
        assert_eq!(
            day1.iter().map(|m| m.ts.as_str()).collect::<Vec<_>>(),
            vec![D1A, D1B]
        );
        assert_eq!(
            day2.iter().map(|m| m.ts.as_str()).collect::<Vec<_>>(),
            vec![D2A, D2B, D2C]
        );
        assert_eq!(
            day3.iter().map(|m| m.ts.as_str()).collect::<Vec<_>>(),
            vec![D3A]
        );

        // Three day files plus the pre-history flush.
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 4);
    }

    #[test]
    fn empty_stream_still_writes_the_pre_history_file() {
        let root = tempdir().unwrap();

        partition_messages(root.path(), "general", vec![], ConversationKind::Channel).unwrap();

        let dir = root.path().join("general");
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 1);
        assert!(read_day(&dir.join(".json")).is_empty());
    }

    #[test]
    fn rename_relocates_earlier_days_and_redirects_later_ones() {
        let root = tempdir().unwrap();
        let messages = vec![
            message(D1A),
            message(D1B),
            rename_message(D2A, "channel_name", "foo", "bar"),
            message(D2B),
            message(D3A),
        ];

        partition_messages(root.path(), "foo", messages, ConversationKind::Channel).unwrap();

        assert!(!root.path().join("foo").exists());
        let bar = root.path().join("bar");
        // Day 1 was flushed under "foo" before the rename, then moved.
        assert_eq!(read_day(&bar.join("2020-01-01.json")).len(), 2);
        // The rename event itself and everything after lands under "bar".
        assert_eq!(read_day(&bar.join("2020-01-02.json")).len(), 2);
        assert_eq!(read_day(&bar.join("2020-01-03.json")).len(), 1);
    }

    #[test]
    fn direct_messages_ignore_rename_subtypes() {
        let root = tempdir().unwrap();
        let messages = vec![
            message(D1A),
            rename_message(D2A, "channel_name", "alice", "mallory"),
        ];

        partition_messages(root.path(), "alice", messages, ConversationKind::DirectMessage)
            .unwrap();

        let dir = root.path().join("alice");
        assert!(dir.join("2020-01-01.json").exists());
        assert!(dir.join("2020-01-02.json").exists());
        assert!(!root.path().join("mallory").exists());
    }

    #[test]
    fn repeated_renames_keep_merging_forward() {
        let root = tempdir().unwrap();
        let messages = vec![
            message(D1A),
            rename_message(D2A, "group_name", "first", "second"),
            message(D2B),
            rename_message(D3A, "group_name", "second", "third"),
        ];

        partition_messages(
            root.path(),
            "first",
            messages,
            ConversationKind::PrivateChannel,
        )
        .unwrap();

        assert!(!root.path().join("first").exists());
        assert!(!root.path().join("second").exists());
        let third = root.path().join("third");
        assert_eq!(read_day(&third.join("2020-01-01.json")).len(), 1);
        assert_eq!(read_day(&third.join("2020-01-02.json")).len(), 2);
        assert_eq!(read_day(&third.join("2020-01-03.json")).len(), 1);
    }

    #[test]
    fn rewriting_a_day_replaces_the_file_wholesale() {
        let root = tempdir().unwrap();

        partition_messages(
            root.path(),
            "general",
            vec![message(D1A), message(D1B)],
            ConversationKind::Channel,
        )
        .unwrap();
        partition_messages(
            root.path(),
            "general",
            vec![message(D1B)],
            ConversationKind::Channel,
        )
        .unwrap();

        let day1 = read_day(&root.path().join("general/2020-01-01.json"));
        assert_eq!(
            day1.iter().map(|m| m.ts.as_str()).collect::<Vec<_>>(),
            vec![D1B]
        );
    }

    #[test]
    fn malformed_timestamp_aborts_the_pass() {
        let root = tempdir().unwrap();
        let messages = vec![message(D1A), message("not-a-timestamp")];

        let result =
            partition_messages(root.path(), "general", messages, ConversationKind::Channel);

        assert!(result.is_err());
    }

    #[test]
    fn current_dir_tracks_renames() {
        let root = tempdir().unwrap();
        let mut state = PartitionState::new("foo", ConversationKind::Channel);
        assert_eq!(state.current_dir(), "foo");

        state.step(root.path(), message(D1A)).unwrap();
        state
            .step(root.path(), rename_message(D1B, "channel_name", "foo", "bar"))
            .unwrap();
        assert_eq!(state.current_dir(), "bar");

        state.finish(root.path()).unwrap();
        assert_eq!(read_day(&root.path().join("bar/2020-01-01.json")).len(), 2);
    }
}
