//! Subscription hub: live-connection membership per thread.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::types::ServerFrame;

/// Size of the per-connection send buffer.
const CONNECTION_BUFFER_SIZE: usize = 64;

/// Identifier for one live WebSocket connection.
pub type ConnId = u64;

/// A sender for frames destined for a specific connection.
pub type FrameSender = mpsc::Sender<ServerFrame>;

/// Hub tracking which live connections care about which thread.
///
/// The hub does not own connection lifecycle — it only keeps membership and
/// a send handle per connection. Close handling is explicit: the socket task
/// calls `remove_connection` when the peer goes away.
#[derive(Debug, Default)]
pub struct WsHub {
    next_conn_id: AtomicU64,
    /// Connection id -> frame sender.
    senders: DashMap<ConnId, FrameSender>,
    /// Thread id -> set of subscribed connection ids.
    thread_subscribers: DashMap<String, HashSet<ConnId>>,
}

impl WsHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection, returning its id and the receiver its
    /// socket task should drain.
    pub fn register_connection(&self) -> (ConnId, mpsc::Receiver<ServerFrame>) {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(CONNECTION_BUFFER_SIZE);
        self.senders.insert(conn_id, tx);
        info!(conn_id, "registered websocket connection");
        (conn_id, rx)
    }

    /// Tear down a connection: drop its sender and remove it from every
    /// thread's subscriber set. The connection does not track its own
    /// subscriptions, so this scans all sets; emptied sets are removed.
    pub fn remove_connection(&self, conn_id: ConnId) {
        self.senders.remove(&conn_id);
        self.thread_subscribers.retain(|_, subscribers| {
            subscribers.remove(&conn_id);
            !subscribers.is_empty()
        });
        info!(conn_id, "removed websocket connection");
    }

    /// Subscribe a connection to a thread. Idempotent.
    pub fn subscribe(&self, conn_id: ConnId, thread_id: &str) {
        self.thread_subscribers
            .entry(thread_id.to_string())
            .or_default()
            .insert(conn_id);
        debug!(conn_id, thread_id, "subscribed to thread");
    }

    /// Unsubscribe a connection from a thread. Idempotent; an emptied
    /// subscriber set is removed so short-lived threads do not accumulate.
    pub fn unsubscribe(&self, conn_id: ConnId, thread_id: &str) {
        let emptied = match self.thread_subscribers.get_mut(thread_id) {
            Some(mut subscribers) => {
                subscribers.remove(&conn_id);
                subscribers.is_empty()
            }
            None => return,
        };
        if emptied {
            self.thread_subscribers
                .remove_if(thread_id, |_, subscribers| subscribers.is_empty());
        }
        debug!(conn_id, thread_id, "unsubscribed from thread");
    }

    /// Send a frame to every currently-open connection subscribed to the
    /// thread. Connections whose channel is gone at send time are skipped,
    /// not pruned — pruning happens via `remove_connection`. Returns how many
    /// subscribers the frame reached.
    pub async fn broadcast(&self, thread_id: &str, frame: &ServerFrame) -> usize {
        let targets: Vec<ConnId> = self
            .thread_subscribers
            .get(thread_id)
            .map(|subscribers| subscribers.iter().copied().collect())
            .unwrap_or_default();

        let mut delivered = 0;
        for conn_id in targets {
            let Some(tx) = self.senders.get(&conn_id).map(|tx| tx.value().clone()) else {
                continue;
            };
            if tx.send(frame.clone()).await.is_ok() {
                delivered += 1;
            } else {
                warn!(conn_id, thread_id, "skipping closed connection in broadcast");
            }
        }
        delivered
    }

    /// Number of connections subscribed to a thread.
    pub fn subscriber_count(&self, thread_id: &str) -> usize {
        self.thread_subscribers
            .get(thread_id)
            .map(|subscribers| subscribers.len())
            .unwrap_or(0)
    }

    /// Whether any thread still lists this connection.
    pub fn is_subscribed_anywhere(&self, conn_id: ConnId) -> bool {
        self.thread_subscribers
            .iter()
            .any(|entry| entry.value().contains(&conn_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refresh_frame(thread_id: &str) -> ServerFrame {
        ServerFrame::MessagesUpdated {
            thread_id: thread_id.to_string(),
            messages: vec![],
        }
    }

    #[tokio::test]
    async fn test_subscribe_is_idempotent() {
        let hub = WsHub::new();
        let (conn, _rx) = hub.register_connection();
        hub.subscribe(conn, "t1");
        hub.subscribe(conn, "t1");
        assert_eq!(hub.subscriber_count("t1"), 1);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_only_subscribers() {
        let hub = WsHub::new();
        let (a, mut rx_a) = hub.register_connection();
        let (_b, mut rx_b) = hub.register_connection();
        hub.subscribe(a, "t1");

        let delivered = hub.broadcast("t1", &refresh_frame("t1")).await;
        assert_eq!(delivered, 1);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unsubscribe_leaves_remaining_subscriber() {
        let hub = WsHub::new();
        let (a, mut rx_a) = hub.register_connection();
        let (b, mut rx_b) = hub.register_connection();
        hub.subscribe(a, "t1");
        hub.subscribe(b, "t1");

        hub.unsubscribe(a, "t1");
        let delivered = hub.broadcast("t1", &refresh_frame("t1")).await;
        assert_eq!(delivered, 1);
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_unsubscribe_removes_emptied_set() {
        let hub = WsHub::new();
        let (conn, _rx) = hub.register_connection();
        hub.subscribe(conn, "t1");
        hub.unsubscribe(conn, "t1");
        assert_eq!(hub.subscriber_count("t1"), 0);
        assert!(hub.thread_subscribers.get("t1").is_none());
    }

    #[tokio::test]
    async fn test_unsubscribe_unknown_thread_is_a_no_op() {
        let hub = WsHub::new();
        let (conn, _rx) = hub.register_connection();
        hub.unsubscribe(conn, "never-seen");
    }

    #[tokio::test]
    async fn test_remove_connection_clears_every_subscription() {
        let hub = WsHub::new();
        let (conn, _rx) = hub.register_connection();
        let (other, _rx_other) = hub.register_connection();
        hub.subscribe(conn, "t1");
        hub.subscribe(conn, "t2");
        hub.subscribe(conn, "t3");
        hub.subscribe(other, "t2");

        hub.remove_connection(conn);
        assert!(!hub.is_subscribed_anywhere(conn));
        // t2 still has the other subscriber, emptied sets are gone entirely
        assert_eq!(hub.subscriber_count("t2"), 1);
        assert!(hub.thread_subscribers.get("t1").is_none());
        assert!(hub.thread_subscribers.get("t3").is_none());
    }

    #[tokio::test]
    async fn test_broadcast_skips_closed_connection_without_pruning() {
        let hub = WsHub::new();
        let (a, rx_a) = hub.register_connection();
        let (b, mut rx_b) = hub.register_connection();
        hub.subscribe(a, "t1");
        hub.subscribe(b, "t1");
        drop(rx_a); // peer went away without close handling yet

        let delivered = hub.broadcast("t1", &refresh_frame("t1")).await;
        assert_eq!(delivered, 1);
        assert!(rx_b.try_recv().is_ok());
        // membership untouched until remove_connection runs
        assert_eq!(hub.subscriber_count("t1"), 2);
    }
}
