//! Tool seam for the tool-calling backend.
//!
//! Tools are declared to the model with a JSON Schema and executed against
//! the store scoped to the requesting owner. Concrete tools live in the
//! server crate, next to the repositories they wrap.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tiendita_core::domain::OwnerId;

use crate::llm::FunctionDeclaration;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("store failure: {0}")]
    Store(String),
    #[error("invalid tool input: {0}")]
    InvalidInput(String),
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn declaration(&self) -> FunctionDeclaration;

    /// Runs the tool for the given owner. Domain misses (an unknown SKU, an
    /// empty match set) are reported inside the `Ok` payload so the model can
    /// phrase them; `Err` is reserved for infrastructure failures.
    async fn execute(&self, owner: &OwnerId, input: Value) -> Result<Value, ToolError>;
}

#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<&'static str, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name(), tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Declarations in stable name order, for the model request.
    pub fn declarations(&self) -> Vec<FunctionDeclaration> {
        let mut declarations: Vec<_> =
            self.tools.values().map(|tool| tool.declaration()).collect();
        declarations.sort_by(|a, b| a.name.cmp(&b.name));
        declarations
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
