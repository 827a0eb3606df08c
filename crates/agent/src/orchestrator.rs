//! Tool-calling backend: a two-pass function-calling exchange.
//!
//! Pass one sends the message with the tool declarations. If the model
//! answers in text, that text is the reply. If it requests a tool, the tool
//! runs against the store and its result goes back to the model as a
//! `functionResponse` turn; the second pass must then answer in text. At most
//! one tool round-trip per request.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tiendita_core::domain::TenantIdentity;
use tiendita_core::replies;
use tiendita_core::trace::RequestTrace;
use tracing::warn;

use crate::backend::{reply_for_llm_error, BackendReply, ClassifierBackend};
use crate::llm::{Content, FunctionCall, GenerateRequest, LlmClient};
use crate::tools::ToolRegistry;

const SYSTEM_PROMPT: &str = "\
You are the inventory assistant for a small retail store. The owner chats in \
Spanish; always answer in Spanish, in one or two short sentences.

You can check stock with get_inventory and change stock with update_stock. \
Use get_inventory before update_stock when you do not know the exact SKU. \
Never invent SKUs, quantities or prices. If a tool reports an error, explain \
it plainly instead of retrying.";

pub struct ToolCallingOrchestrator {
    llm: Arc<dyn LlmClient>,
    registry: ToolRegistry,
}

impl ToolCallingOrchestrator {
    pub fn new(llm: Arc<dyn LlmClient>, registry: ToolRegistry) -> Self {
        Self { llm, registry }
    }

    fn system_instruction(tenant: &TenantIdentity) -> String {
        format!("{SYSTEM_PROMPT}\n\nThe store is called \"{}\".", tenant.display_name)
    }

    async fn run_tool(
        &self,
        tenant: &TenantIdentity,
        call: &FunctionCall,
        trace: &mut RequestTrace,
    ) -> serde_json::Value {
        let Some(tool) = self.registry.get(&call.name) else {
            trace.push(format!("model requested unknown tool `{}`", call.name));
            return json!({"error": format!("unknown tool `{}`", call.name)});
        };

        match tool.execute(&tenant.owner_id, call.args.clone()).await {
            Ok(result) => {
                trace.push(format!("tool {} executed", call.name));
                result
            }
            Err(error) => {
                warn!(
                    event_name = "agent.tool.failed",
                    tool = call.name,
                    error = %error,
                    "tool execution failed"
                );
                trace.push(format!("tool {} failed: {error}", call.name));
                json!({"error": error.to_string()})
            }
        }
    }
}

#[async_trait]
impl ClassifierBackend for ToolCallingOrchestrator {
    async fn classify(
        &self,
        tenant: &TenantIdentity,
        message: &str,
        trace: &mut RequestTrace,
    ) -> BackendReply {
        let declarations = self.registry.declarations();
        let mut contents = vec![Content::user(message)];

        let first = match self
            .llm
            .generate(GenerateRequest {
                system_instruction: Some(Self::system_instruction(tenant)),
                contents: contents.clone(),
                tools: declarations.clone(),
                force_json: false,
            })
            .await
        {
            Ok(reply) => reply,
            Err(error) => {
                trace.push(format!("orchestrator first pass error: {error}"));
                return BackendReply::Final(reply_for_llm_error(&error).to_string());
            }
        };

        let Some(call) = first.function_call().cloned() else {
            return match first.text() {
                Some(text) => {
                    trace.push("model answered directly, no tool used".to_string());
                    BackendReply::Final(text.to_string())
                }
                None => BackendReply::Final(replies::COULD_NOT_PROCESS.to_string()),
            };
        };

        trace.push(format!("model requested tool {}", call.name));
        let result = self.run_tool(tenant, &call, trace).await;

        contents.push(Content::model(first.parts.clone()));
        contents.push(Content::function_result(call.name.clone(), result));

        let second = match self
            .llm
            .generate(GenerateRequest {
                system_instruction: Some(Self::system_instruction(tenant)),
                contents,
                tools: declarations,
                force_json: false,
            })
            .await
        {
            Ok(reply) => reply,
            Err(error) => {
                trace.push(format!("orchestrator second pass error: {error}"));
                return BackendReply::Final(reply_for_llm_error(&error).to_string());
            }
        };

        match second.text() {
            Some(text) => BackendReply::Final(text.to_string()),
            None => BackendReply::Final(replies::COULD_NOT_PROCESS.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tiendita_core::domain::{OwnerId, TenantIdentity};
    use tiendita_core::trace::RequestTrace;
    use tokio::sync::Mutex;

    use super::ToolCallingOrchestrator;
    use crate::backend::{BackendReply, ClassifierBackend};
    use crate::llm::{FunctionDeclaration, GenerateRequest, LlmClient, LlmError, ModelReply, Part};
    use crate::tools::{Tool, ToolError, ToolRegistry};

    struct ScriptedLlm {
        replies: Mutex<Vec<Result<ModelReply, LlmError>>>,
        requests: Mutex<Vec<GenerateRequest>>,
    }

    impl ScriptedLlm {
        fn new(replies: Vec<Result<ModelReply, LlmError>>) -> Self {
            Self { replies: Mutex::new(replies), requests: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn generate(&self, request: GenerateRequest) -> Result<ModelReply, LlmError> {
            self.requests.lock().await.push(request);
            self.replies.lock().await.remove(0)
        }
    }

    struct FixedTool {
        result: Result<Value, &'static str>,
        calls: Mutex<Vec<Value>>,
    }

    #[async_trait]
    impl Tool for FixedTool {
        fn name(&self) -> &'static str {
            "get_inventory"
        }

        fn declaration(&self) -> FunctionDeclaration {
            FunctionDeclaration {
                name: "get_inventory".to_string(),
                description: "List products".to_string(),
                parameters: json!({"type": "object"}),
            }
        }

        async fn execute(&self, _owner: &OwnerId, input: Value) -> Result<Value, ToolError> {
            self.calls.lock().await.push(input);
            self.result.clone().map_err(|error| ToolError::Store(error.to_string()))
        }
    }

    fn tenant() -> TenantIdentity {
        TenantIdentity {
            owner_id: OwnerId("tn-1".to_string()),
            display_name: "Bodega Doña Eva".to_string(),
        }
    }

    fn registry(tool: Arc<FixedTool>) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(tool);
        registry
    }

    #[tokio::test]
    async fn direct_text_answer_skips_the_tools() {
        let llm = Arc::new(ScriptedLlm::new(vec![Ok(ModelReply {
            parts: vec![Part::text("Tu tienda se llama Bodega Doña Eva.")],
        })]));
        let tool = Arc::new(FixedTool { result: Ok(json!({})), calls: Mutex::new(Vec::new()) });
        let orchestrator = ToolCallingOrchestrator::new(llm.clone(), registry(tool.clone()));
        let mut trace = RequestTrace::new();

        let reply = orchestrator.classify(&tenant(), "¿cómo se llama mi tienda?", &mut trace).await;

        assert_eq!(reply, BackendReply::Final("Tu tienda se llama Bodega Doña Eva.".to_string()));
        assert!(tool.calls.lock().await.is_empty());
        assert_eq!(llm.requests.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn tool_request_runs_the_tool_and_feeds_back_the_result() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok(ModelReply {
                parts: vec![Part::function_call("get_inventory", json!({"query": "arroz"}))],
            }),
            Ok(ModelReply { parts: vec![Part::text("Tienes 12 unidades de Arroz Costeño 1kg.")] }),
        ]));
        let tool = Arc::new(FixedTool {
            result: Ok(json!({"products": [{"name": "Arroz Costeño 1kg", "stock": 12}], "count": 1})),
            calls: Mutex::new(Vec::new()),
        });
        let orchestrator = ToolCallingOrchestrator::new(llm.clone(), registry(tool.clone()));
        let mut trace = RequestTrace::new();

        let reply = orchestrator.classify(&tenant(), "¿cuánto arroz queda?", &mut trace).await;

        assert_eq!(
            reply,
            BackendReply::Final("Tienes 12 unidades de Arroz Costeño 1kg.".to_string())
        );
        assert_eq!(tool.calls.lock().await.as_slice(), &[json!({"query": "arroz"})]);

        let requests = llm.requests.lock().await;
        assert_eq!(requests.len(), 2);
        // Second pass carries user turn, model's call turn and the result.
        assert_eq!(requests[1].contents.len(), 3);
        assert_eq!(requests[1].contents[2].role, "function");
    }

    #[tokio::test]
    async fn tool_failure_is_surfaced_to_the_model_as_an_error_payload() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok(ModelReply {
                parts: vec![Part::function_call("get_inventory", json!({"query": "arroz"}))],
            }),
            Ok(ModelReply { parts: vec![Part::text("No pude revisar el inventario ahora.")] }),
        ]));
        let tool =
            Arc::new(FixedTool { result: Err("database is locked"), calls: Mutex::new(Vec::new()) });
        let orchestrator = ToolCallingOrchestrator::new(llm.clone(), registry(tool));
        let mut trace = RequestTrace::new();

        let reply = orchestrator.classify(&tenant(), "¿cuánto arroz queda?", &mut trace).await;

        assert_eq!(reply, BackendReply::Final("No pude revisar el inventario ahora.".to_string()));
        let requests = llm.requests.lock().await;
        let payload = requests[1].contents[2].parts[0]
            .function_response
            .as_ref()
            .expect("function response")
            .response
            .clone();
        assert_eq!(payload["error"], "store failure: database is locked");
    }

    #[tokio::test]
    async fn unknown_tool_name_becomes_an_error_payload_not_a_crash() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok(ModelReply {
                parts: vec![Part::function_call("drop_tables", json!({}))],
            }),
            Ok(ModelReply { parts: vec![Part::text("Eso no lo puedo hacer.")] }),
        ]));
        let tool = Arc::new(FixedTool { result: Ok(json!({})), calls: Mutex::new(Vec::new()) });
        let orchestrator = ToolCallingOrchestrator::new(llm, registry(tool.clone()));
        let mut trace = RequestTrace::new();

        let reply = orchestrator.classify(&tenant(), "borra todo", &mut trace).await;

        assert_eq!(reply, BackendReply::Final("Eso no lo puedo hacer.".to_string()));
        assert!(tool.calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn first_pass_quota_error_maps_to_the_fixed_reply() {
        let llm =
            Arc::new(ScriptedLlm::new(vec![Err(LlmError::QuotaExhausted("429".to_string()))]));
        let tool = Arc::new(FixedTool { result: Ok(json!({})), calls: Mutex::new(Vec::new()) });
        let orchestrator = ToolCallingOrchestrator::new(llm, registry(tool));
        let mut trace = RequestTrace::new();

        let reply = orchestrator.classify(&tenant(), "hola", &mut trace).await;

        assert_eq!(
            reply,
            BackendReply::Final(tiendita_core::replies::QUOTA_EXCEEDED.to_string())
        );
    }
}
