//! HTTP client for the Gemini `generateContent` REST endpoint.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::llm::{Content, FunctionDeclaration, GenerateRequest, LlmClient, LlmError, ModelReply};

pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

impl GeminiClient {
    pub fn new(
        base_url: String,
        model: String,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url, model, api_key })
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url.trim_end_matches('/'), self.model)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest<'a> {
    contents: &'a [Content],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTools<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireSystemInstruction<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<WireGenerationConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireTools<'a> {
    function_declarations: &'a [FunctionDeclaration],
}

#[derive(Serialize)]
struct WireSystemInstruction<'a> {
    parts: [WireTextPart<'a>; 1],
}

#[derive(Serialize)]
struct WireTextPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
}

#[derive(Deserialize)]
struct WireCandidate {
    #[serde(default)]
    content: Option<Content>,
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<ModelReply, LlmError> {
        let wire = WireRequest {
            contents: &request.contents,
            tools: if request.tools.is_empty() {
                None
            } else {
                Some(vec![WireTools { function_declarations: &request.tools }])
            },
            system_instruction: request
                .system_instruction
                .as_deref()
                .map(|text| WireSystemInstruction { parts: [WireTextPart { text }] }),
            generation_config: request
                .force_json
                .then_some(WireGenerationConfig { response_mime_type: "application/json" }),
        };

        let response = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&wire)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::QuotaExhausted(body));
        }
        if status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Unavailable { status: status.as_u16(), body });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Rejected { status: status.as_u16(), body });
        }

        let decoded: WireResponse = response
            .json()
            .await
            .map_err(|error| LlmError::Decode(error.to_string()))?;

        let parts = decoded
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts)
            .unwrap_or_default();
        if parts.is_empty() {
            return Err(LlmError::Empty);
        }

        debug!(event_name = "agent.llm.reply", part_count = parts.len(), "model replied");
        Ok(ModelReply { parts })
    }
}
