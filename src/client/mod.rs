//! Relay client: reconciliation state, polling, and the self-healing socket.
//!
//! This is the browser-side half of the protocol expressed as a library:
//! one ordered, deduplicated message list per viewed thread, fed by both
//! push frames and a fixed-interval poll, over a WebSocket that reconnects
//! on its own. The `watch` subcommand drives it against a running relay.

mod http;
mod poller;
mod socket;
mod view;

pub use http::RelayHttp;
pub use poller::{AutoRefresh, PollGate, POLL_INTERVAL};
pub use socket::{RelaySocket, RECONNECT_DELAY};
pub use view::ThreadView;
