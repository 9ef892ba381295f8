//! Test utilities: relay app builder plus a mock upstream provider.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use thread_relay::api::{create_router, AppState};
use thread_relay::upstream::ThreadsClient;

/// Credential the mock upstream accepts.
pub const VALID_KEY: &str = "sk-test";

/// Mock upstream provider holding one thread's messages in chronological
/// order. Tests mutate it to simulate new upstream activity.
#[derive(Clone)]
pub struct MockUpstream {
    pub thread_id: String,
    messages: Arc<Mutex<Vec<Value>>>,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    order: Option<String>,
}

impl MockUpstream {
    pub fn new(thread_id: &str) -> Self {
        Self {
            thread_id: thread_id.to_string(),
            messages: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Append a message to the mock thread (chronological input order).
    pub fn push_message(&self, id: &str, role: &str, content: &str, created_at: i64) {
        self.messages.lock().unwrap().push(json!({
            "id": id,
            "object": "thread.message",
            "created_at": created_at,
            "thread_id": self.thread_id,
            "role": role,
            "content": [{
                "type": "text",
                "text": { "value": content, "annotations": [] }
            }]
        }));
    }

    /// Serve the provider API on an ephemeral port, returning its base URL.
    pub async fn spawn(&self) -> String {
        let router = Router::new()
            .route("/threads/{thread_id}/messages", get(list_messages))
            .with_state(self.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }
}

async fn list_messages(
    State(upstream): State<MockUpstream>,
    Path(thread_id): Path<String>,
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if authorization != format!("Bearer {VALID_KEY}") {
        return Err(provider_error(
            StatusCode::UNAUTHORIZED,
            "Incorrect API key provided.",
        ));
    }
    if thread_id != upstream.thread_id {
        return Err(provider_error(
            StatusCode::NOT_FOUND,
            "No thread found with the given id.",
        ));
    }

    let mut data = upstream.messages.lock().unwrap().clone();
    if query.order.as_deref() == Some("desc") {
        data.reverse();
    }
    if let Some(limit) = query.limit {
        data.truncate(limit);
    }
    Ok(Json(json!({
        "object": "list",
        "data": data,
        "has_more": false
    })))
}

fn provider_error(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": { "message": message } })))
}

/// Build a relay app pointed at a fresh mock upstream. Returns the router,
/// the shared state (for hub access), and the mock.
pub async fn test_app(thread_id: &str) -> (Router, AppState, MockUpstream) {
    let upstream = MockUpstream::new(thread_id);
    let base_url = upstream.spawn().await;
    let state = AppState::new(ThreadsClient::new(base_url));
    let router = create_router(state.clone());
    (router, state, upstream)
}

/// A mock upstream preloaded with three messages, oldest first.
pub async fn test_app_with_history(thread_id: &str) -> (Router, AppState, MockUpstream) {
    let (router, state, upstream) = test_app(thread_id).await;
    upstream.push_message("m1", "user", "hello", 100);
    upstream.push_message("m2", "assistant", "hi there", 200);
    upstream.push_message("m3", "user", "how are you?", 300);
    (router, state, upstream)
}
