//! Gmail REST API client.
//!
//! Thin typed wrapper over `users.messages.list` and `users.messages.get`.
//! The nested multipart payload Gmail returns is flattened into the
//! pipeline's [`RawMessage`] shape here; nothing downstream knows about
//! the wire format.

use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::adapters::MailProvider;
use crate::error::{JobtrailError, Result};
use crate::types::{MessageHeader, MessagePart, RawMessage};

const GMAIL_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct MessageListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    id: String,
    payload: Option<PayloadDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PayloadDto {
    #[serde(default)]
    headers: Vec<HeaderDto>,
    mime_type: Option<String>,
    body: Option<BodyDto>,
    #[serde(default)]
    parts: Vec<PayloadDto>,
}

#[derive(Debug, Deserialize)]
struct HeaderDto {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct BodyDto {
    data: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Shared HTTP client for the Gmail API.
pub struct GmailClient {
    http: reqwest::Client,
    base_url: String,
}

impl GmailClient {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| JobtrailError::Provider(format!("HTTP client error: {}", e)))?;
        Ok(Self {
            http,
            base_url: GMAIL_BASE_URL.to_string(),
        })
    }
}

/// One authenticated view of the user's mailbox: the shared client plus
/// the access token resolved for the current refresh pass.
pub struct GmailMailbox {
    client: Arc<GmailClient>,
    access_token: String,
}

impl GmailMailbox {
    pub fn new(client: Arc<GmailClient>, access_token: String) -> Self {
        Self {
            client,
            access_token,
        }
    }
}

impl MailProvider for GmailMailbox {
    async fn list_recent_ids(
        &self,
        max_results: u32,
        newer_than_days: u32,
    ) -> Result<Vec<String>> {
        let endpoint = format!("{}/users/me/messages", self.client.base_url);
        let query = format!("newer_than:{}d", newer_than_days);
        let max_results = max_results.to_string();

        debug!(query = %query, max_results = %max_results, "Listing recent messages");

        let response = self
            .client
            .http
            .get(&endpoint)
            .query(&[("q", query.as_str()), ("maxResults", max_results.as_str())])
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| JobtrailError::Provider(format!("message list failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(JobtrailError::Provider(format!(
                "message list returned {}: {}",
                status, body
            )));
        }

        let parsed: MessageListResponse = response
            .json()
            .await
            .map_err(|e| JobtrailError::Provider(format!("message list decode failed: {}", e)))?;

        Ok(parsed.messages.into_iter().map(|m| m.id).collect())
    }

    async fn fetch_message(&self, id: &str) -> Result<RawMessage> {
        let endpoint = format!("{}/users/me/messages/{}", self.client.base_url, id);

        let response = self
            .client
            .http
            .get(&endpoint)
            .query(&[("format", "full")])
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| JobtrailError::Provider(format!("message get {} failed: {}", id, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(JobtrailError::Provider(format!(
                "message get {} returned {}: {}",
                id, status, body
            )));
        }

        let parsed: MessageResponse = response.json().await.map_err(|e| {
            JobtrailError::Provider(format!("message get {} decode failed: {}", id, e))
        })?;

        Ok(into_raw_message(parsed))
    }
}

// ---------------------------------------------------------------------------
// Payload flattening
// ---------------------------------------------------------------------------

fn into_raw_message(message: MessageResponse) -> RawMessage {
    let mut headers = Vec::new();
    let mut parts = Vec::new();

    if let Some(payload) = message.payload {
        headers = payload
            .headers
            .iter()
            .map(|h| MessageHeader {
                name: h.name.clone(),
                value: h.value.clone(),
            })
            .collect();
        flatten_payload(payload, &mut parts);
    }

    RawMessage {
        id: message.id,
        headers,
        parts,
    }
}

/// Preorder walk of the multipart tree. Leaves become [`MessagePart`]s;
/// multipart containers contribute only their children.
fn flatten_payload(payload: PayloadDto, out: &mut Vec<MessagePart>) {
    if payload.parts.is_empty() {
        out.push(MessagePart {
            mime_type: payload.mime_type.unwrap_or_default(),
            data: payload.body.and_then(|b| b.data),
        });
    } else {
        for part in payload.parts {
            flatten_payload(part, out);
        }
    }
}
