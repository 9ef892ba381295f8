//! Upstream HTTP client.

use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::error::{UpstreamError, UpstreamResult};
use super::types::{normalize, ListOptions, MessageList, NormalizedMessage};

/// Production base URL for the thread provider.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Beta header the provider requires for the threads API.
const BETA_HEADER: (&str, &str) = ("OpenAI-Beta", "assistants=v2");

/// Client for the upstream thread/message listing API.
///
/// The credential is per-call, not per-client: every request carries the key
/// the browser user supplied. No timeout is set; the relay inherits reqwest's
/// default and leaves retry policy to its callers.
#[derive(Debug, Clone)]
pub struct ThreadsClient {
    client: Client,
    base_url: String,
}

/// Provider error envelope: `{"error": {"message": ...}}`.
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl ThreadsClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// List messages for a thread, returned in chronological (oldest-first)
    /// order regardless of the order requested from the provider.
    pub async fn list_messages(
        &self,
        thread_id: &str,
        api_key: &str,
        options: ListOptions,
    ) -> UpstreamResult<Vec<NormalizedMessage>> {
        let url = format!("{}/threads/{}/messages", self.base_url, thread_id);
        let mut request = self
            .client
            .get(&url)
            .bearer_auth(api_key)
            .header(BETA_HEADER.0, BETA_HEADER.1)
            .query(&[("order", options.order.as_str())]);
        if let Some(limit) = options.limit {
            request = request.query(&[("limit", limit)]);
        }

        let response = request.send().await?;
        match response.status() {
            status if status.is_success() => {
                let list: MessageList = response
                    .json()
                    .await
                    .map_err(|e| UpstreamError::Parse(e.to_string()))?;
                Ok(normalize(list, options.order))
            }
            StatusCode::NOT_FOUND => Err(UpstreamError::ThreadNotFound(thread_id.to_string())),
            StatusCode::UNAUTHORIZED => Err(UpstreamError::InvalidCredential),
            status => Err(UpstreamError::Api {
                status: status.as_u16(),
                message: error_message(response).await,
            }),
        }
    }
}

/// Pull a human-readable message out of a provider error body, falling back
/// to the raw text when it does not match the envelope.
async fn error_message(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ApiErrorEnvelope>(&body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if !body.is_empty() => body,
        Err(_) => "upstream returned an error with no body".to_string(),
    }
}
