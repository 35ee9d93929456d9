use crate::client::{ApiError, HistorySource};
use crate::message::Message;

/// Page size requested from the history endpoints.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Pull a conversation's complete history, oldest message first.
///
/// Retrieval walks backward: the `latest` cursor starts unset (meaning
/// the most recent message) and each round asks for the page ending just
/// before the oldest message seen so far, until the endpoint reports
/// `has_more: false`. The accumulated pages are newest-first, so the
/// result is reversed once at the end.
///
/// There is deliberately no cap on the number of pages — the point is a
/// complete export, so a very long-lived conversation simply takes as
/// many round-trips as it takes. An empty conversation yields an empty
/// vec, not an error. Page failures propagate untouched; retrying is the
/// caller's decision.
pub fn fetch_history<S: HistorySource>(
    source: &S,
    channel_id: &str,
    page_size: usize,
) -> Result<Vec<Message>, ApiError> {
    let mut messages: Vec<Message> = Vec::new();
    let mut latest: Option<String> = None;

    loop {
        let page = source.history_page(channel_id, latest.as_deref(), page_size)?;
        messages.extend(page.messages);
        if !page.has_more {
            break;
        }
        match messages.last() {
            // Newest-first accumulation: the last entry is the oldest
            // message seen, which anchors the next page.
            Some(oldest) => latest = Some(oldest.ts.clone()),
            // `has_more` without any message leaves no cursor to follow;
            // treat it as end of history rather than looping forever.
            None => break,
        }
    }

    messages.reverse();
    Ok(messages)
}
