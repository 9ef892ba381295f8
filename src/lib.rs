//! Thread Relay Library
//!
//! A thin relay between a browser chat UI and an upstream conversation-thread
//! API: fetches messages for a thread with a caller-supplied credential,
//! caches them in memory, and pushes incremental updates to subscribed
//! WebSocket clients.

pub mod api;
pub mod client;
pub mod protocol;
pub mod reconcile;
pub mod store;
pub mod upstream;
pub mod ws;
