//! Provider-agnostic wire model for `generateContent`-style chat endpoints.
//!
//! The shapes mirror the Gemini REST surface (camelCase `functionCall` /
//! `functionResponse` parts) but carry no HTTP concerns; `LlmClient` is the
//! seam that backends and tests program against.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    /// 429 from the provider. The account's request quota is spent.
    #[error("model quota exhausted: {0}")]
    QuotaExhausted(String),
    /// 5xx from the provider.
    #[error("model unavailable ({status}): {body}")]
    Unavailable { status: u16, body: String },
    /// Any other non-success status.
    #[error("model request rejected ({status}): {body}")]
    Rejected { status: u16, body: String },
    /// 200 with no candidates or no parts.
    #[error("model returned no content")]
    Empty,
    #[error("model transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("model response decode failure: {0}")]
    Decode(String),
}

/// A tool invocation requested by the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

/// The tool's result fed back on the second pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    pub response: Value,
}

/// One slot of a content turn. Exactly one of the fields is populated.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_response: Option<FunctionResponse>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), ..Self::default() }
    }

    pub fn function_call(name: impl Into<String>, args: Value) -> Self {
        Self { function_call: Some(FunctionCall { name: name.into(), args }), ..Self::default() }
    }

    pub fn function_response(name: impl Into<String>, response: Value) -> Self {
        Self {
            function_response: Some(FunctionResponse { name: name.into(), response }),
            ..Self::default()
        }
    }
}

/// One conversation turn, role `user`, `model` or `function`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: "user".to_string(), parts: vec![Part::text(text)] }
    }

    pub fn model(parts: Vec<Part>) -> Self {
        Self { role: "model".to_string(), parts }
    }

    pub fn function_result(name: impl Into<String>, response: Value) -> Self {
        Self { role: "function".to_string(), parts: vec![Part::function_response(name, response)] }
    }
}

/// Tool surface advertised to the model. `parameters` is a JSON Schema object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Inputs for one model call. `force_json` asks the provider for a strict
/// `application/json` response body; it is mutually exclusive with `tools` in
/// practice and the backends never set both.
#[derive(Clone, Debug, Default)]
pub struct GenerateRequest {
    pub system_instruction: Option<String>,
    pub contents: Vec<Content>,
    pub tools: Vec<FunctionDeclaration>,
    pub force_json: bool,
}

/// The model's turn, as parts. Helpers pull out the dominant shape.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelReply {
    pub parts: Vec<Part>,
}

impl ModelReply {
    /// First text part, trimmed, if any.
    pub fn text(&self) -> Option<&str> {
        self.parts.iter().find_map(|part| part.text.as_deref()).map(str::trim)
    }

    /// First function call part, if any. Tool calls take precedence over text
    /// when both appear in one turn.
    pub fn function_call(&self) -> Option<&FunctionCall> {
        self.parts.iter().find_map(|part| part.function_call.as_ref())
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<ModelReply, LlmError>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ModelReply, Part};

    #[test]
    fn function_call_takes_precedence_over_text() {
        let reply = ModelReply {
            parts: vec![
                Part::text("Looking that up."),
                Part::function_call("get_inventory", json!({"query": "arroz"})),
            ],
        };

        assert_eq!(reply.function_call().expect("call").name, "get_inventory");
        assert_eq!(reply.text(), Some("Looking that up."));
    }

    #[test]
    fn text_is_trimmed() {
        let reply = ModelReply { parts: vec![Part::text("  hola  \n")] };
        assert_eq!(reply.text(), Some("hola"));
    }

    #[test]
    fn serialized_parts_use_camel_case_keys() {
        let part = Part::function_call("update_stock", json!({"sku": "SKU-1", "quantity": -2}));
        let encoded = serde_json::to_value(&part).expect("encode");
        assert!(encoded.get("functionCall").is_some());
        assert!(encoded.get("function_call").is_none());
    }
}
