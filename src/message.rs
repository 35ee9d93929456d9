use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single message, exactly as the history endpoint returned it.
///
/// Only the fields the archiver routes on are typed. Everything else —
/// text, user, reactions, attachments, whatever Slack adds next — is kept
/// verbatim in `rest` so the written archive preserves the full record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Decimal timestamp string, unique within the conversation.
    pub ts: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    /// New conversation name; only present on rename events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Previous conversation name; only present on rename events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_name: Option<String>,
    #[serde(flatten)]
    pub rest: BTreeMap<String, serde_json::Value>,
}

/// The three conversation classes Slack exposes history for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationKind {
    Channel,
    PrivateChannel,
    DirectMessage,
}

impl ConversationKind {
    /// Top-level directory this class's conversations are archived under.
    pub fn parent_dir(self) -> &'static str {
        match self {
            Self::Channel => "channel",
            Self::PrivateChannel => "private_channels",
            Self::DirectMessage => "direct_message",
        }
    }

    /// Subtype tag marking a rename event, `None` for direct messages
    /// (which cannot be renamed).
    fn rename_subtype(self) -> Option<&'static str> {
        match self {
            Self::Channel => Some("channel_name"),
            Self::PrivateChannel => Some("group_name"),
            Self::DirectMessage => None,
        }
    }
}

/// What a message means to the partitioner, decided once at ingestion.
#[derive(Debug, PartialEq, Eq)]
pub enum MessageKind<'a> {
    Plain,
    /// The conversation changed its display name at this point in the
    /// stream; output written so far lives under `old` and must move.
    Rename { old: &'a str, new: &'a str },
}

impl Message {
    /// Classify this message for a conversation of the given kind.
    ///
    /// A rename event must carry the kind's rename subtype plus both
    /// names; anything short of that is treated as a plain message.
    pub fn kind(&self, conversation: ConversationKind) -> MessageKind<'_> {
        let Some(flag) = conversation.rename_subtype() else {
            return MessageKind::Plain;
        };
        match (self.subtype.as_deref(), self.old_name.as_deref(), self.name.as_deref()) {
            (Some(subtype), Some(old), Some(new)) if subtype == flag => {
                MessageKind::Rename { old, new }
            }
            _ => MessageKind::Plain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rename_message(subtype: &str) -> Message {
        Message {
            ts: "1579000000.000100".into(),
            subtype: Some(subtype.into()),
            name: Some("bar".into()),
            old_name: Some("foo".into()),
            rest: BTreeMap::new(),
        }
    }

    #[test]
    fn classifies_channel_rename() {
        let message = rename_message("channel_name");
        assert_eq!(
            message.kind(ConversationKind::Channel),
            MessageKind::Rename { old: "foo", new: "bar" }
        );
        // The same subtype means nothing to a private channel.
        assert_eq!(message.kind(ConversationKind::PrivateChannel), MessageKind::Plain);
    }

    #[test]
    fn classifies_private_channel_rename() {
        let message = rename_message("group_name");
        assert_eq!(
            message.kind(ConversationKind::PrivateChannel),
            MessageKind::Rename { old: "foo", new: "bar" }
        );
    }

    #[test]
    fn direct_messages_never_rename() {
        for subtype in ["channel_name", "group_name", "im_name"] {
            let message = rename_message(subtype);
            assert_eq!(message.kind(ConversationKind::DirectMessage), MessageKind::Plain);
        }
    }

    #[test]
    fn rename_subtype_without_names_is_plain() {
        let message = Message {
            ts: "1579000000.000100".into(),
            subtype: Some("channel_name".into()),
            name: None,
            old_name: None,
            rest: BTreeMap::new(),
        };
        assert_eq!(message.kind(ConversationKind::Channel), MessageKind::Plain);
    }

    #[test]
    fn unknown_fields_survive_a_round_trip() {
        let raw = r#"{"ts":"1579000000.000100","user":"U123","text":"hi","reactions":[{"name":"wave","count":2}]}"#;
        let message: Message = serde_json::from_str(raw).unwrap();
        assert_eq!(message.rest["user"], serde_json::json!("U123"));

        let back: serde_json::Value = serde_json::to_value(&message).unwrap();
        assert_eq!(back, serde_json::from_str::<serde_json::Value>(raw).unwrap());
    }
}
