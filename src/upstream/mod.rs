//! Client for the upstream conversation-thread provider.
//!
//! The provider is treated as a black box: it lists ordered messages for a
//! thread given a bearer credential, and can fail with not-found or
//! unauthorized. This module normalizes its response shape into the internal
//! message representation and classifies its failures.

mod client;
mod error;
mod types;

pub use client::{ThreadsClient, DEFAULT_BASE_URL};
pub use error::{UpstreamError, UpstreamResult};
pub use types::{ListOptions, ListOrder, NormalizedMessage};
