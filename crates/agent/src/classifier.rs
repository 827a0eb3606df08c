//! Strict-JSON backend: one model call, fixed output schema, no tools.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tiendita_core::domain::{ClassifiedIntent, IntentFields, IntentKind, TenantIdentity};
use tiendita_core::trace::RequestTrace;
use tracing::warn;

use crate::backend::{reply_for_llm_error, BackendReply, ClassifierBackend};
use crate::llm::{Content, GenerateRequest, LlmClient};

const SYSTEM_PROMPT: &str = "\
You are the back-office assistant for a small retail store. The owner sends \
short, informal messages in Spanish. Translate each message into exactly one \
JSON object with this shape and nothing else:

{\"intent\": \"<intent>\", \"data\": {...}, \"reply\": \"<short confirmation in Spanish>\"}

Allowed intents and their data fields:
- \"add_product\": name (required), price (required, number), stock (required, integer), category (optional)
- \"update_product\": name (required), new_name / price / stock (at least one)
- \"delete_product\": name (required)
- \"register_sale\": amount (required, number, in soles)
- \"update_business\": company_name (required)
- \"search_product\": name (required, the search term)
- \"sales_report\": no data fields
- \"chat\": no data fields; put the conversational answer in \"reply\"

Rules:
- Omit data fields you are not sure about. Never invent values.
- If a required field is missing, use intent \"chat\" and ask for it in \"reply\".
- Amounts like \"vendí 50 soles\" mean register_sale with amount 50.
- \"reply\" is shown to the owner verbatim; keep it one sentence, in Spanish.";

/// Model output envelope. Decoding is strict: an unknown intent tag or a
/// malformed body fails the whole decode and the raw text falls back to chat.
#[derive(Debug, Deserialize)]
struct IntentEnvelope {
    intent: IntentKind,
    #[serde(default)]
    data: IntentFields,
    #[serde(default)]
    reply: String,
}

pub struct StrictJsonClassifier {
    llm: Arc<dyn LlmClient>,
}

impl StrictJsonClassifier {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

/// Some models wrap JSON in a markdown fence even when asked not to.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn parse_envelope(raw: &str) -> Option<ClassifiedIntent> {
    let envelope: IntentEnvelope = serde_json::from_str(strip_code_fence(raw)).ok()?;
    Some(ClassifiedIntent { kind: envelope.intent, fields: envelope.data, reply_draft: envelope.reply })
}

#[async_trait]
impl ClassifierBackend for StrictJsonClassifier {
    async fn classify(
        &self,
        tenant: &TenantIdentity,
        message: &str,
        trace: &mut RequestTrace,
    ) -> BackendReply {
        let request = GenerateRequest {
            system_instruction: Some(format!(
                "{SYSTEM_PROMPT}\n\nThe store is called \"{}\".",
                tenant.display_name
            )),
            contents: vec![Content::user(message)],
            tools: Vec::new(),
            force_json: true,
        };

        let reply = match self.llm.generate(request).await {
            Ok(reply) => reply,
            Err(error) => {
                warn!(event_name = "agent.classify.llm_error", error = %error, "classifier call failed");
                trace.push(format!("classifier error: {error}"));
                return BackendReply::Final(reply_for_llm_error(&error).to_string());
            }
        };

        let Some(raw) = reply.text() else {
            trace.push("classifier returned a non-text reply".to_string());
            return BackendReply::Final(tiendita_core::replies::COULD_NOT_PROCESS.to_string());
        };

        match parse_envelope(raw) {
            Some(intent) => {
                trace.push(format!("classified as {}", intent.kind.as_str()));
                BackendReply::Intent(intent)
            }
            None => {
                // The model answered in prose; treat it as a chat turn.
                trace.push("classifier output was not a valid intent envelope".to_string());
                BackendReply::Intent(ClassifiedIntent::chat(raw))
            }
        }
    }
}
