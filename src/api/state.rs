//! Application state shared across handlers.
//!
//! Everything the handlers touch is constructed once at startup and injected
//! here — there are no ambient singletons. Lifecycle is tied to the server
//! process; nothing survives a restart.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::store::ThreadStore;
use crate::upstream::ThreadsClient;
use crate::ws::WsHub;

/// Per-thread mutual exclusion for fetch+store sequences.
///
/// Concurrent loads of the same thread would otherwise interleave their
/// `create_messages` calls; the token serializes them. Distinct threads never
/// contend.
#[derive(Debug, Default)]
pub struct ThreadLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ThreadLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the token for a thread, creating it on first use. The guard
    /// releases on drop.
    pub async fn acquire(&self, thread_id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        lock.lock_owned().await
    }
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// In-memory thread/message store.
    pub store: Arc<ThreadStore>,
    /// WebSocket hub for push updates.
    pub hub: Arc<WsHub>,
    /// Client for the upstream thread provider.
    pub upstream: ThreadsClient,
    /// Per-thread fetch serialization.
    pub fetch_locks: Arc<ThreadLocks>,
}

impl AppState {
    /// Create new application state around an upstream client.
    pub fn new(upstream: ThreadsClient) -> Self {
        Self {
            store: Arc::new(ThreadStore::new()),
            hub: Arc::new(WsHub::new()),
            upstream,
            fetch_locks: Arc::new(ThreadLocks::new()),
        }
    }
}
