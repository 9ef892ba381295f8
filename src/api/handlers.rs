//! API request handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::protocol::{
    CheckUpdatesRequest, CheckUpdatesResponse, LoadThreadRequest, MessagesResponse, WireMessage,
};
use crate::reconcile::find_new_messages;
use crate::store::MessageDraft;
use crate::upstream::{ListOptions, ListOrder, NormalizedMessage};
use crate::ws::ServerFrame;

use super::error::{ApiError, ApiResult};
use super::state::AppState;

/// Fetch window for incremental update checks.
const CHECK_UPDATES_LIMIT: u32 = 20;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint.
///
/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Load a thread's messages from the upstream provider, cache them, and
/// notify subscribers with a full refresh.
///
/// POST /api/threads/{threadId}/messages
pub async fn load_thread_messages(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    Json(request): Json<LoadThreadRequest>,
) -> ApiResult<Json<MessagesResponse>> {
    let api_key = require_api_key(&request.api_key)?;
    let thread_id = require_thread_id(&thread_id)?;

    // Serialize fetch+store per thread so concurrent loads cannot interleave
    // their create_messages calls.
    let _token = state.fetch_locks.acquire(thread_id).await;

    let batch = state
        .upstream
        .list_messages(thread_id, api_key, ListOptions::default())
        .await?;

    state
        .store
        .ensure_thread(thread_id, &format!("Thread {thread_id}"));
    persist_unseen(&state, thread_id, &batch);

    let messages: Vec<WireMessage> = batch.iter().map(WireMessage::from_upstream).collect();
    info!(thread_id, count = messages.len(), "loaded thread from upstream");

    let reached = state
        .hub
        .broadcast(
            thread_id,
            &ServerFrame::MessagesUpdated {
                thread_id: thread_id.to_string(),
                messages: messages.clone(),
            },
        )
        .await;
    if reached > 0 {
        info!(thread_id, reached, "broadcast full refresh");
    }

    Ok(Json(MessagesResponse { messages }))
}

/// Serve a thread's messages from the store only; no upstream call.
///
/// GET /api/threads/{threadId}/messages
pub async fn stored_messages(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<MessagesResponse>> {
    let messages = state
        .store
        .get_messages(&thread_id)
        .iter()
        .map(WireMessage::from_stored)
        .collect();
    Ok(Json(MessagesResponse { messages }))
}

/// Check the upstream provider for messages newer than the client's last
/// known one; persist and broadcast any suffix found.
///
/// POST /api/threads/{threadId}/check-updates
pub async fn check_updates(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    Json(request): Json<CheckUpdatesRequest>,
) -> ApiResult<Json<CheckUpdatesResponse>> {
    let api_key = require_api_key(&request.api_key)?;
    let thread_id = require_thread_id(&thread_id)?;

    let _token = state.fetch_locks.acquire(thread_id).await;

    let batch = state
        .upstream
        .list_messages(
            thread_id,
            api_key,
            ListOptions {
                limit: Some(CHECK_UPDATES_LIMIT),
                order: ListOrder::Desc,
            },
        )
        .await?;

    let new_messages = find_new_messages(&batch, request.last_message_id.as_deref());
    if new_messages.is_empty() {
        return Ok(Json(CheckUpdatesResponse {
            has_new_messages: false,
            new_messages: vec![],
        }));
    }

    persist_unseen(&state, thread_id, new_messages);

    let formatted: Vec<WireMessage> = new_messages.iter().map(WireMessage::from_upstream).collect();
    info!(thread_id, count = formatted.len(), "found new messages");

    state
        .hub
        .broadcast(
            thread_id,
            &ServerFrame::NewMessages {
                thread_id: thread_id.to_string(),
                messages: formatted.clone(),
            },
        )
        .await;

    Ok(Json(CheckUpdatesResponse {
        has_new_messages: true,
        new_messages: formatted,
    }))
}

/// Store the messages of a batch that are not yet present for the thread.
/// The store itself never deduplicates; this is the callers' discovery step.
fn persist_unseen(state: &AppState, thread_id: &str, batch: &[NormalizedMessage]) {
    let drafts: Vec<MessageDraft> = batch
        .iter()
        .filter(|msg| !state.store.contains_message(thread_id, &msg.id))
        .map(|msg| MessageDraft {
            message_id: msg.id.clone(),
            role: msg.role,
            content: msg.content.clone(),
            timestamp: msg.created_at,
        })
        .collect();
    if !drafts.is_empty() {
        state.store.create_messages(thread_id, drafts);
    }
}

fn require_api_key(api_key: &str) -> ApiResult<&str> {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(ApiError::missing_input("API key is required"));
    }
    Ok(api_key)
}

fn require_thread_id(thread_id: &str) -> ApiResult<&str> {
    let thread_id = thread_id.trim();
    if thread_id.is_empty() {
        return Err(ApiError::missing_input("Thread ID is required"));
    }
    Ok(thread_id)
}
