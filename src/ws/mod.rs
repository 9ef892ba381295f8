//! WebSocket fan-out for thread subscriptions.
//!
//! Browser clients hold one connection each and tell the relay which threads
//! they care about; the hub tracks that membership and broadcasts message
//! updates to every live subscriber of a thread.

mod handler;
mod hub;
mod types;

pub use handler::ws_handler;
pub use hub::{ConnId, WsHub};
pub use types::{parse_client_frame, ClientFrame, FrameParse, ServerFrame};
