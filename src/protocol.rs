//! Canonical wire types shared by the relay server and its clients.
//!
//! Everything that crosses the HTTP boundary lives here so the server
//! handlers, the WebSocket frames, and the watch client serialize the exact
//! same shape.

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::store::Message;
use crate::upstream::NormalizedMessage;

/// Author of a message. Closed set; the upstream provider only emits these
/// two for thread messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A message as served to browser clients.
///
/// `timestamp` is a human-facing clock label; `created_at` carries the origin
/// timestamp in epoch milliseconds for ordering and diffing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    /// Externally-assigned message identifier.
    pub id: String,
    pub role: Role,
    pub content: String,
    /// 12-hour `h:mm AM/PM` label in the relay's local timezone.
    pub timestamp: String,
    /// Origin timestamp in epoch milliseconds.
    pub created_at: i64,
}

impl WireMessage {
    /// Format a stored message for the wire.
    pub fn from_stored(msg: &Message) -> Self {
        Self {
            id: msg.message_id.clone(),
            role: msg.role,
            content: msg.content.clone(),
            timestamp: clock_label(&msg.timestamp.with_timezone(&Local)),
            created_at: msg.timestamp.timestamp_millis(),
        }
    }

    /// Format a freshly-fetched upstream message for the wire.
    pub fn from_upstream(msg: &NormalizedMessage) -> Self {
        Self {
            id: msg.id.clone(),
            role: msg.role,
            content: msg.content.clone(),
            timestamp: clock_label(&msg.created_at.with_timezone(&Local)),
            created_at: msg.created_at.timestamp_millis(),
        }
    }
}

/// 12-hour clock label, no leading zero on the hour (`3:04 PM`).
pub fn clock_label<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%-I:%M %p").to_string()
}

/// Body of `POST /api/threads/{threadId}/messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadThreadRequest {
    /// Upstream bearer credential. Defaulted so an absent field surfaces as
    /// a 400 MissingInput instead of a deserialization failure.
    #[serde(default)]
    pub api_key: String,
}

/// Body of `POST /api/threads/{threadId}/check-updates`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckUpdatesRequest {
    #[serde(default)]
    pub api_key: String,
    /// Identifier of the newest message the client already has.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_id: Option<String>,
}

/// Response of the load and stored-messages endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesResponse {
    pub messages: Vec<WireMessage>,
}

/// Response of the check-updates endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckUpdatesResponse {
    pub has_new_messages: bool,
    pub new_messages: Vec<WireMessage>,
}
