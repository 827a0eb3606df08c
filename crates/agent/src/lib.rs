//! Classifier backends - the language-model side of the runtime.
//!
//! This crate turns one inbound message into either a structured
//! `ClassifiedIntent` (strict-JSON backend) or a finished reply produced
//! through at most one tool round-trip (tool-calling backend). Both backends
//! sit behind the `ClassifierBackend` seam so the server selects one by
//! configuration without the webhook pipeline changing shape.
//!
//! # Architecture
//!
//! 1. **Wire model** (`llm`) - provider-agnostic request/reply types and the
//!    `LlmClient` trait
//! 2. **HTTP client** (`gemini`) - `generateContent`-style endpoint client
//! 3. **Strict-JSON backend** (`classifier`) - one call, fixed output schema
//! 4. **Tool-calling backend** (`orchestrator` + `tools`) - two-pass
//!    function-calling exchange over a registry of declared tools
//!
//! # Safety Principle
//!
//! The model is strictly a translator. Every upstream failure degrades to a
//! fixed user-facing reply; nothing in this crate raises past the backend
//! seam, and nothing here touches the data store except through a declared
//! `Tool`.

pub mod backend;
pub mod classifier;
pub mod gemini;
pub mod llm;
pub mod orchestrator;
pub mod tools;

pub use backend::{BackendReply, ClassifierBackend};
pub use classifier::StrictJsonClassifier;
pub use gemini::GeminiClient;
pub use llm::{Content, FunctionCall, FunctionDeclaration, GenerateRequest, LlmClient, LlmError, ModelReply, Part};
pub use orchestrator::ToolCallingOrchestrator;
pub use tools::{Tool, ToolError, ToolRegistry};
