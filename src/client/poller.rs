//! Fixed-interval polling that coexists with push updates.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tracing::{debug, warn};

use crate::protocol::WireMessage;

use super::http::RelayHttp;
use super::view::ThreadView;

/// Fixed interval between update checks.
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Guard against overlapping in-flight requests for one thread.
///
/// A poll is skipped entirely while the initial load or a previous poll is
/// still outstanding, so the relay never sees stacked requests on behalf of
/// a single viewer.
#[derive(Debug, Default)]
pub struct PollGate {
    in_flight: AtomicBool,
}

impl PollGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to claim the in-flight slot. Returns false when a request is
    /// already outstanding.
    pub fn try_begin(&self) -> bool {
        !self.in_flight.swap(true, Ordering::SeqCst)
    }

    /// Release the slot once the request settles.
    pub fn finish(&self) {
        self.in_flight.store(false, Ordering::SeqCst);
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }
}

/// Periodic update checker folding poll responses into a shared view.
pub struct AutoRefresh {
    http: RelayHttp,
    api_key: String,
    gate: PollGate,
}

impl AutoRefresh {
    pub fn new(http: RelayHttp, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            gate: PollGate::new(),
        }
    }

    pub fn gate(&self) -> &PollGate {
        &self.gate
    }

    /// Run one poll cycle against the view's thread. Skipped when a request
    /// is already in flight; errors are logged and swallowed so a transient
    /// upstream hiccup never interrupts the session.
    pub async fn poll_once(&self, view: &Mutex<ThreadView>) -> Vec<WireMessage> {
        if !self.gate.try_begin() {
            debug!("skipping poll: request already in flight");
            return Vec::new();
        }

        let (thread_id, last_message_id) = {
            let view = view.lock().expect("view lock poisoned");
            (
                view.thread_id().to_string(),
                view.last_message_id().map(String::from),
            )
        };

        let result = self
            .http
            .check_updates(&thread_id, &self.api_key, last_message_id)
            .await;
        self.gate.finish();

        match result {
            Ok(response) if response.has_new_messages => {
                let mut view = view.lock().expect("view lock poisoned");
                view.apply_append(response.new_messages)
            }
            Ok(_) => Vec::new(),
            Err(err) => {
                warn!(thread_id, %err, "update check failed");
                Vec::new()
            }
        }
    }
}
