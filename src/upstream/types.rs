//! Raw provider payloads and their normalized form.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::protocol::Role;

/// Requested provider list order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListOrder {
    /// Oldest first (the provider default).
    Asc,
    /// Newest first.
    #[default]
    Desc,
}

impl ListOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            ListOrder::Asc => "asc",
            ListOrder::Desc => "desc",
        }
    }
}

/// Options for a message-list call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListOptions {
    /// Maximum number of messages the provider should return. `None` leaves
    /// the window at the provider's default.
    pub limit: Option<u32>,
    pub order: ListOrder,
}

/// Provider message-list envelope. Only the fields the relay reads.
#[derive(Debug, Deserialize)]
pub(crate) struct MessageList {
    pub data: Vec<RawMessage>,
}

/// One message as the provider serializes it.
#[derive(Debug, Deserialize)]
pub(crate) struct RawMessage {
    pub id: String,
    pub role: Role,
    /// Provider epoch seconds.
    pub created_at: i64,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

/// Content blocks are a tagged union; the relay only understands text.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ContentBlock {
    Text { text: TextBlock },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TextBlock {
    pub value: String,
}

impl RawMessage {
    /// First text-typed content block; absent or non-text content yields an
    /// empty string.
    fn primary_text(&self) -> String {
        self.content
            .iter()
            .find_map(|block| match block {
                ContentBlock::Text { text } => Some(text.value.clone()),
                ContentBlock::Other => None,
            })
            .unwrap_or_default()
    }
}

/// A provider message reduced to what the relay stores and serves.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    /// Origin timestamp converted from provider epoch seconds.
    pub created_at: DateTime<Utc>,
}

/// Flatten a provider list into chronological (oldest-first) order.
///
/// `order` is the order that was requested from the provider; descending
/// responses are reversed exactly once here so callers never re-reverse.
pub(crate) fn normalize(list: MessageList, order: ListOrder) -> Vec<NormalizedMessage> {
    let mut messages: Vec<NormalizedMessage> = list
        .data
        .iter()
        .map(|raw| NormalizedMessage {
            id: raw.id.clone(),
            role: raw.role,
            content: raw.primary_text(),
            created_at: DateTime::from_timestamp(raw.created_at, 0).unwrap_or(DateTime::UNIX_EPOCH),
        })
        .collect();
    if order == ListOrder::Desc {
        messages.reverse();
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_list() -> MessageList {
        serde_json::from_str(
            r#"{
              "object": "list",
              "data": [
                {
                  "id": "msg_3",
                  "object": "thread.message",
                  "created_at": 300,
                  "thread_id": "thread_abc",
                  "role": "assistant",
                  "content": [{"type": "text", "text": {"value": "third", "annotations": []}}]
                },
                {
                  "id": "msg_2",
                  "object": "thread.message",
                  "created_at": 200,
                  "thread_id": "thread_abc",
                  "role": "user",
                  "content": [{"type": "image_file", "image_file": {"file_id": "file-1"}}]
                },
                {
                  "id": "msg_1",
                  "object": "thread.message",
                  "created_at": 100,
                  "thread_id": "thread_abc",
                  "role": "user",
                  "content": []
                }
              ],
              "first_id": "msg_3",
              "last_id": "msg_1",
              "has_more": false
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_normalize_reverses_descending_batches() {
        let ids: Vec<_> = normalize(sample_list(), ListOrder::Desc)
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["msg_1", "msg_2", "msg_3"]);
    }

    #[test]
    fn test_normalize_keeps_ascending_batches() {
        let ids: Vec<_> = normalize(sample_list(), ListOrder::Asc)
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["msg_3", "msg_2", "msg_1"]);
    }

    #[test]
    fn test_normalize_extracts_first_text_block() {
        let messages = normalize(sample_list(), ListOrder::Desc);
        assert_eq!(messages[2].content, "third");
        assert_eq!(messages[2].role, Role::Assistant);
    }

    #[test]
    fn test_non_text_and_empty_content_yield_empty_string() {
        let messages = normalize(sample_list(), ListOrder::Desc);
        assert_eq!(messages[0].content, "");
        assert_eq!(messages[1].content, "");
    }

    #[test]
    fn test_epoch_seconds_become_utc_timestamps() {
        let messages = normalize(sample_list(), ListOrder::Desc);
        assert_eq!(messages[0].created_at.timestamp(), 100);
        assert_eq!(messages[0].created_at.timestamp_millis(), 100_000);
    }
}
