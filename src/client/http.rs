//! HTTP calls from the client to the relay.

use anyhow::{bail, Context, Result};
use reqwest::Client;

use crate::api::ErrorResponse;
use crate::protocol::{
    CheckUpdatesRequest, CheckUpdatesResponse, LoadThreadRequest, MessagesResponse, WireMessage,
};

/// Client for the relay's thread endpoints.
#[derive(Debug, Clone)]
pub struct RelayHttp {
    client: Client,
    base_url: String,
}

impl RelayHttp {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Load a thread from the upstream provider via the relay.
    pub async fn load_thread(&self, thread_id: &str, api_key: &str) -> Result<Vec<WireMessage>> {
        let url = format!("{}/api/threads/{}/messages", self.base_url, thread_id);
        let response = self
            .client
            .post(&url)
            .json(&LoadThreadRequest {
                api_key: api_key.to_string(),
            })
            .send()
            .await
            .context("sending load request to relay")?;

        if !response.status().is_success() {
            bail!(relay_error(response).await);
        }
        let body: MessagesResponse = response
            .json()
            .await
            .context("decoding load response from relay")?;
        Ok(body.messages)
    }

    /// Ask the relay for messages newer than `last_message_id`.
    pub async fn check_updates(
        &self,
        thread_id: &str,
        api_key: &str,
        last_message_id: Option<String>,
    ) -> Result<CheckUpdatesResponse> {
        let url = format!("{}/api/threads/{}/check-updates", self.base_url, thread_id);
        let response = self
            .client
            .post(&url)
            .json(&CheckUpdatesRequest {
                api_key: api_key.to_string(),
                last_message_id,
            })
            .send()
            .await
            .context("sending check-updates request to relay")?;

        if !response.status().is_success() {
            bail!(relay_error(response).await);
        }
        response
            .json()
            .await
            .context("decoding check-updates response from relay")
    }
}

/// Extract the relay's structured error message, falling back to the status.
async fn relay_error(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<ErrorResponse>().await {
        Ok(body) => body.message,
        Err(_) => format!("relay returned {status}"),
    }
}
