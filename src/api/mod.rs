//! HTTP API module.
//!
//! Thread load/refresh endpoints plus the WebSocket upgrade route.

mod error;
mod handlers;
mod routes;
mod state;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::create_router;
pub use state::{AppState, ThreadLocks};
