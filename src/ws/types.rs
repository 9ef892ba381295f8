//! WebSocket frame types.
//!
//! Frames are a closed tagged union over the `type` field. Unrecognized
//! types are ignored rather than rejected, so older clients can keep talking
//! to newer relays.

use serde::{Deserialize, Serialize};

use crate::protocol::WireMessage;

/// Frames sent from a client to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Register interest in push updates for a thread.
    SubscribeThread {
        #[serde(rename = "threadId")]
        thread_id: String,
    },
    /// Drop interest in a thread.
    UnsubscribeThread {
        #[serde(rename = "threadId")]
        thread_id: String,
    },
}

/// Frames pushed from the relay to subscribed clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Full refresh: replaces the client's local list for the thread.
    MessagesUpdated {
        #[serde(rename = "threadId")]
        thread_id: String,
        messages: Vec<WireMessage>,
    },
    /// Incremental append: only newly discovered messages.
    NewMessages {
        #[serde(rename = "threadId")]
        thread_id: String,
        messages: Vec<WireMessage>,
    },
}

impl ServerFrame {
    pub fn thread_id(&self) -> &str {
        match self {
            ServerFrame::MessagesUpdated { thread_id, .. } => thread_id,
            ServerFrame::NewMessages { thread_id, .. } => thread_id,
        }
    }
}

/// Outcome of parsing an incoming text frame.
#[derive(Debug)]
pub enum FrameParse {
    /// A known frame.
    Frame(ClientFrame),
    /// Valid JSON with an unrecognized or incomplete `type`: ignore silently.
    Ignored,
    /// Not JSON at all: log and drop, keep the connection open.
    Malformed(serde_json::Error),
}

/// Classify an incoming text frame per the protocol's tolerance rules.
pub fn parse_client_frame(text: &str) -> FrameParse {
    match serde_json::from_str::<ClientFrame>(text) {
        Ok(frame) => FrameParse::Frame(frame),
        Err(err) => {
            if serde_json::from_str::<serde_json::Value>(text).is_ok() {
                FrameParse::Ignored
            } else {
                FrameParse::Malformed(err)
            }
        }
    }
}
