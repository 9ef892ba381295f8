//! Self-healing WebSocket connection to the relay.

use std::collections::HashSet;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::ws::{ClientFrame, ServerFrame};

/// Fixed backoff between reconnection attempts. Retries are unbounded.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Buffer sizes for the command and frame channels.
const COMMAND_BUFFER_SIZE: usize = 16;
const FRAME_BUFFER_SIZE: usize = 64;

/// Handle to a persistent relay connection.
///
/// The driver task owns the socket. On unexpected closure it reconnects
/// after [`RECONNECT_DELAY`] and re-issues the active subscriptions, so a
/// viewer keeps receiving pushes across relay restarts. Dropping the handle
/// ends the driver.
pub struct RelaySocket {
    frames: mpsc::Receiver<ServerFrame>,
    commands: mpsc::Sender<ClientFrame>,
}

impl RelaySocket {
    /// Spawn the connection driver for `ws_url` (e.g. `ws://host:port/ws`).
    pub fn connect(ws_url: impl Into<String>) -> Self {
        let (frame_tx, frame_rx) = mpsc::channel(FRAME_BUFFER_SIZE);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER_SIZE);
        tokio::spawn(drive(ws_url.into(), frame_tx, command_rx));
        Self {
            frames: frame_rx,
            commands: command_tx,
        }
    }

    /// Next pushed frame; `None` once the driver has shut down.
    pub async fn next_frame(&mut self) -> Option<ServerFrame> {
        self.frames.recv().await
    }

    pub async fn subscribe(&self, thread_id: &str) {
        let _ = self
            .commands
            .send(ClientFrame::SubscribeThread {
                thread_id: thread_id.to_string(),
            })
            .await;
    }

    pub async fn unsubscribe(&self, thread_id: &str) {
        let _ = self
            .commands
            .send(ClientFrame::UnsubscribeThread {
                thread_id: thread_id.to_string(),
            })
            .await;
    }
}

/// Connection driver: connect, pump, reconnect forever.
async fn drive(
    url: String,
    frame_tx: mpsc::Sender<ServerFrame>,
    mut command_rx: mpsc::Receiver<ClientFrame>,
) {
    let mut subscriptions: HashSet<String> = HashSet::new();

    loop {
        let stream = match connect_async(url.as_str()).await {
            Ok((stream, _)) => stream,
            Err(err) => {
                warn!(%err, "relay connection failed, retrying in {:?}", RECONNECT_DELAY);
                if frame_tx.is_closed() {
                    return;
                }
                sleep(RECONNECT_DELAY).await;
                continue;
            }
        };
        info!(url = %url, "connected to relay");
        let (mut sink, mut source) = stream.split();

        // Re-issue active subscriptions after a reconnect.
        for thread_id in &subscriptions {
            let frame = ClientFrame::SubscribeThread {
                thread_id: thread_id.clone(),
            };
            if send_frame(&mut sink, &frame).await.is_err() {
                break;
            }
        }

        loop {
            tokio::select! {
                command = command_rx.recv() => {
                    let Some(frame) = command else {
                        // Handle dropped: shut the driver down.
                        return;
                    };
                    track_subscription(&frame, &mut subscriptions);
                    if send_frame(&mut sink, &frame).await.is_err() {
                        break;
                    }
                }
                message = source.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            match serde_json::from_str::<ServerFrame>(text.as_str()) {
                                Ok(frame) => {
                                    if frame_tx.send(frame).await.is_err() {
                                        return;
                                    }
                                }
                                Err(err) => debug!(%err, "ignoring unrecognized relay frame"),
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(err)) => {
                            warn!(%err, "relay connection error");
                            break;
                        }
                    }
                }
            }
        }

        warn!("relay connection lost, reconnecting in {:?}", RECONNECT_DELAY);
        sleep(RECONNECT_DELAY).await;
    }
}

fn track_subscription(frame: &ClientFrame, subscriptions: &mut HashSet<String>) {
    match frame {
        ClientFrame::SubscribeThread { thread_id } => {
            subscriptions.insert(thread_id.clone());
        }
        ClientFrame::UnsubscribeThread { thread_id } => {
            subscriptions.remove(thread_id);
        }
    }
}

async fn send_frame<S>(sink: &mut S, frame: &ClientFrame) -> Result<(), ()>
where
    S: SinkExt<Message> + Unpin,
{
    let json = match serde_json::to_string(frame) {
        Ok(json) => json,
        Err(err) => {
            warn!(%err, "failed to serialize client frame");
            return Ok(());
        }
    };
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}
