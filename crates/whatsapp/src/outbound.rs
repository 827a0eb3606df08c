use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("message send transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("message send rejected ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("message send response missing delivery id")]
    MissingDeliveryId,
}

/// Delivers exactly one reply per request back to the original sender.
/// Failures are the caller's to log; they never abort a request.
#[async_trait]
pub trait OutboundMessenger: Send + Sync {
    /// Returns the channel's delivery identifier.
    async fn send_text(&self, to: &str, body: &str) -> Result<String, SendError>;
}

/// WhatsApp Cloud API implementation:
/// `POST {api_base}/{phone_number_id}/messages` with a bearer token.
pub struct CloudApiMessenger {
    client: reqwest::Client,
    api_base: String,
    phone_number_id: String,
    access_token: SecretString,
}

impl CloudApiMessenger {
    pub fn new(api_base: String, phone_number_id: String, access_token: SecretString) -> Self {
        Self { client: reqwest::Client::new(), api_base, phone_number_id, access_token }
    }

    fn messages_url(&self) -> String {
        format!("{}/{}/messages", self.api_base.trim_end_matches('/'), self.phone_number_id)
    }
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

#[async_trait]
impl OutboundMessenger for CloudApiMessenger {
    async fn send_text(&self, to: &str, body: &str) -> Result<String, SendError> {
        let payload = json!({
            "messaging_product": "whatsapp",
            "to": to,
            "text": { "body": body },
        });

        let response = self
            .client
            .post(self.messages_url())
            .bearer_auth(self.access_token.expose_secret())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SendError::Rejected { status: status.as_u16(), body });
        }

        let decoded: SendResponse = response.json().await?;
        let delivery_id =
            decoded.messages.into_iter().next().map(|message| message.id).ok_or(SendError::MissingDeliveryId)?;

        debug!(
            event_name = "whatsapp.outbound.sent",
            delivery_id = %delivery_id,
            "reply delivered"
        );
        Ok(delivery_id)
    }
}

/// Records sends without touching the network. Used by tests and by the CLI
/// doctor command.
#[derive(Default)]
pub struct NoopMessenger {
    sent: tokio::sync::Mutex<Vec<(String, String)>>,
}

impl NoopMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl OutboundMessenger for NoopMessenger {
    async fn send_text(&self, to: &str, body: &str) -> Result<String, SendError> {
        let mut sent = self.sent.lock().await;
        sent.push((to.to_string(), body.to_string()));
        Ok(format!("noop-{}", sent.len()))
    }
}
