//! In-memory thread and message storage.
//!
//! The store exclusively owns thread and message records. Nothing here is
//! durable; a restart loses everything, by design. Deduplication against
//! already-stored messages is the caller's job (see `contains_message`) —
//! `create_messages` appends unconditionally.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::protocol::Role;

/// A conversation thread, created lazily the first time a fetch for its
/// external identifier succeeds. Never updated or deleted afterwards.
#[derive(Debug, Clone)]
pub struct Thread {
    /// Internal monotonic sequence id, assigned on first sight.
    pub id: i64,
    /// Externally-assigned thread identifier.
    pub thread_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// One stored utterance within a thread.
#[derive(Debug, Clone)]
pub struct Message {
    /// Internal monotonic sequence id.
    pub id: i64,
    pub thread_id: String,
    /// Externally-assigned message identifier, unique within its thread.
    pub message_id: String,
    pub role: Role,
    pub content: String,
    /// Origin timestamp reported by the upstream provider.
    pub timestamp: DateTime<Utc>,
    /// Local insertion time.
    pub created_at: DateTime<Utc>,
}

/// Input for `create_messages`: a message without its storage-assigned fields.
#[derive(Debug, Clone)]
pub struct MessageDraft {
    pub message_id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// In-memory keyed storage for threads and their ordered message lists.
#[derive(Debug)]
pub struct ThreadStore {
    threads: DashMap<String, Thread>,
    messages: DashMap<String, Vec<Message>>,
    next_thread_id: AtomicI64,
    next_message_id: AtomicI64,
}

impl Default for ThreadStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadStore {
    pub fn new() -> Self {
        Self {
            threads: DashMap::new(),
            messages: DashMap::new(),
            next_thread_id: AtomicI64::new(1),
            next_message_id: AtomicI64::new(1),
        }
    }

    /// Look up a thread by its external identifier.
    pub fn get_thread(&self, thread_id: &str) -> Option<Thread> {
        self.threads.get(thread_id).map(|t| t.value().clone())
    }

    /// Create the thread if it does not exist yet, returning the stored
    /// record either way. The entry API makes concurrent first-sight calls
    /// race-free: only the winner assigns a sequence id.
    pub fn ensure_thread(&self, thread_id: &str, title: &str) -> Thread {
        self.threads
            .entry(thread_id.to_string())
            .or_insert_with(|| Thread {
                id: self.next_thread_id.fetch_add(1, Ordering::SeqCst),
                thread_id: thread_id.to_string(),
                title: title.to_string(),
                created_at: Utc::now(),
            })
            .value()
            .clone()
    }

    /// All stored messages for a thread, ordered by origin timestamp
    /// ascending (sequence id breaks ties). Unknown threads yield an empty
    /// list, not an error.
    pub fn get_messages(&self, thread_id: &str) -> Vec<Message> {
        let mut messages = self
            .messages
            .get(thread_id)
            .map(|m| m.value().clone())
            .unwrap_or_default();
        messages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        messages
    }

    /// Whether a message with this external identifier is already stored for
    /// the thread.
    pub fn contains_message(&self, thread_id: &str, message_id: &str) -> bool {
        self.messages
            .get(thread_id)
            .map(|m| m.iter().any(|msg| msg.message_id == message_id))
            .unwrap_or(false)
    }

    /// Append a batch of messages in input order, assigning each a fresh
    /// sequence id and insertion time. No deduplication happens here.
    pub fn create_messages(&self, thread_id: &str, drafts: Vec<MessageDraft>) -> Vec<Message> {
        let mut entry = self.messages.entry(thread_id.to_string()).or_default();
        let mut created = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let message = Message {
                id: self.next_message_id.fetch_add(1, Ordering::SeqCst),
                thread_id: thread_id.to_string(),
                message_id: draft.message_id,
                role: draft.role,
                content: draft.content,
                timestamp: draft.timestamp,
                created_at: Utc::now(),
            };
            entry.push(message.clone());
            created.push(message);
        }
        created
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::WireMessage;
    use chrono::TimeZone;

    fn draft(message_id: &str, secs: i64) -> MessageDraft {
        MessageDraft {
            message_id: message_id.to_string(),
            role: Role::User,
            content: format!("content of {message_id}"),
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_ensure_thread_is_idempotent() {
        let store = ThreadStore::new();
        let first = store.ensure_thread("thread_abc", "Thread thread_abc");
        let second = store.ensure_thread("thread_abc", "some other title");
        assert_eq!(first.id, second.id);
        assert_eq!(second.title, "Thread thread_abc");
        assert_eq!(store.get_thread("thread_abc").unwrap().id, first.id);
    }

    #[test]
    fn test_thread_sequence_ids_are_monotonic() {
        let store = ThreadStore::new();
        let a = store.ensure_thread("t1", "Thread t1");
        let b = store.ensure_thread("t2", "Thread t2");
        assert!(b.id > a.id);
    }

    #[test]
    fn test_get_messages_unknown_thread_is_empty() {
        let store = ThreadStore::new();
        assert!(store.get_messages("nope").is_empty());
    }

    #[test]
    fn test_messages_sorted_by_origin_timestamp_regardless_of_insertion_order() {
        let store = ThreadStore::new();
        store.create_messages("t1", vec![draft("m3", 300), draft("m1", 100)]);
        store.create_messages("t1", vec![draft("m2", 200)]);

        let ids: Vec<_> = store
            .get_messages("t1")
            .iter()
            .map(|m| m.message_id.clone())
            .collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn test_equal_timestamps_keep_insertion_order() {
        let store = ThreadStore::new();
        store.create_messages("t1", vec![draft("a", 100), draft("b", 100)]);
        let ids: Vec<_> = store
            .get_messages("t1")
            .iter()
            .map(|m| m.message_id.clone())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_create_messages_assigns_fresh_ids_in_order() {
        let store = ThreadStore::new();
        let created = store.create_messages("t1", vec![draft("m1", 100), draft("m2", 200)]);
        assert!(created[1].id > created[0].id);
        assert_eq!(created[0].thread_id, "t1");
    }

    #[test]
    fn test_contains_message() {
        let store = ThreadStore::new();
        store.create_messages("t1", vec![draft("m1", 100)]);
        assert!(store.contains_message("t1", "m1"));
        assert!(!store.contains_message("t1", "m2"));
        assert!(!store.contains_message("t2", "m1"));
    }

    #[test]
    fn test_store_does_not_deduplicate() {
        let store = ThreadStore::new();
        store.create_messages("t1", vec![draft("m1", 100)]);
        store.create_messages("t1", vec![draft("m1", 100)]);
        assert_eq!(store.get_messages("t1").len(), 2);
    }

    #[test]
    fn test_wire_round_trip_preserves_role_content_and_origin_millis() {
        let store = ThreadStore::new();
        let drafts = vec![MessageDraft {
            message_id: "msg_raw".to_string(),
            role: Role::Assistant,
            content: "exact bytes: åß∂ \"quoted\"\n".to_string(),
            timestamp: Utc.timestamp_opt(1_700_000_123, 0).unwrap(),
        }];
        store.create_messages("t1", drafts);

        let stored = store.get_messages("t1");
        let wire = WireMessage::from_stored(&stored[0]);
        assert_eq!(wire.id, "msg_raw");
        assert_eq!(wire.role, Role::Assistant);
        assert_eq!(wire.content, "exact bytes: åß∂ \"quoted\"\n");
        assert_eq!(wire.created_at, 1_700_000_123_000);
    }
}
