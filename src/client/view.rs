//! Client-side reconciliation state for one viewed thread.

use std::collections::HashSet;

use crate::protocol::WireMessage;
use crate::ws::ServerFrame;

/// One ordered, deduplicated-by-construction message list.
///
/// Two independent sources feed it: push frames from the relay and poll
/// responses. The relay broadcasts the same suffix it returns from a poll,
/// so appends deduplicate by message id; a full refresh replaces local state
/// outright.
#[derive(Debug)]
pub struct ThreadView {
    thread_id: String,
    messages: Vec<WireMessage>,
    seen: HashSet<String>,
}

impl ThreadView {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            messages: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn messages(&self) -> &[WireMessage] {
        &self.messages
    }

    /// Identifier of the newest message currently held, used as the poll
    /// cursor.
    pub fn last_message_id(&self) -> Option<&str> {
        self.messages.last().map(|m| m.id.as_str())
    }

    /// Full refresh: replace local state with the pushed list.
    pub fn apply_refresh(&mut self, messages: Vec<WireMessage>) {
        self.seen = messages.iter().map(|m| m.id.clone()).collect();
        self.messages = messages;
    }

    /// Incremental append; messages already held are dropped. Returns the
    /// messages that were actually new, in order.
    pub fn apply_append(&mut self, messages: Vec<WireMessage>) -> Vec<WireMessage> {
        let mut appended = Vec::new();
        for message in messages {
            if self.seen.insert(message.id.clone()) {
                self.messages.push(message.clone());
                appended.push(message);
            }
        }
        appended
    }

    /// Fold a push frame into the view. Frames for other threads are
    /// ignored. Returns the newly visible messages.
    pub fn apply_frame(&mut self, frame: ServerFrame) -> Vec<WireMessage> {
        if frame.thread_id() != self.thread_id {
            return Vec::new();
        }
        match frame {
            ServerFrame::MessagesUpdated { messages, .. } => {
                self.apply_refresh(messages.clone());
                messages
            }
            ServerFrame::NewMessages { messages, .. } => self.apply_append(messages),
        }
    }
}
