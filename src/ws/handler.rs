//! WebSocket handler for client connections.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tracing::{debug, warn};

use crate::api::AppState;

use super::hub::WsHub;
use super::types::{parse_client_frame, ClientFrame, FrameParse};

/// WebSocket upgrade handler.
///
/// GET /ws
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let hub = state.hub.clone();
    ws.on_upgrade(move |socket| handle_connection(socket, hub))
}

/// Drive one client connection until it closes.
async fn handle_connection(socket: WebSocket, hub: Arc<WsHub>) {
    let (mut sink, mut stream) = socket.split();
    let (conn_id, mut frames) = hub.register_connection();

    // Forward hub broadcasts to this client.
    let send_task = tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            let json = match serde_json::to_string(&frame) {
                Ok(json) => json,
                Err(err) => {
                    warn!(%err, "failed to serialize server frame");
                    continue;
                }
            };
            if sink.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => match parse_client_frame(text.as_str()) {
                FrameParse::Frame(ClientFrame::SubscribeThread { thread_id }) => {
                    hub.subscribe(conn_id, &thread_id);
                }
                FrameParse::Frame(ClientFrame::UnsubscribeThread { thread_id }) => {
                    hub.unsubscribe(conn_id, &thread_id);
                }
                FrameParse::Ignored => {
                    debug!(conn_id, "ignoring unrecognized frame");
                }
                FrameParse::Malformed(err) => {
                    warn!(conn_id, %err, "dropping malformed websocket frame");
                }
            },
            Ok(Message::Close(_)) => break,
            // Binary frames are not part of the protocol; pings are answered
            // by axum itself.
            Ok(_) => {}
            Err(err) => {
                warn!(conn_id, %err, "websocket error");
                break;
            }
        }
    }

    send_task.abort();
    hub.remove_connection(conn_id);
}
