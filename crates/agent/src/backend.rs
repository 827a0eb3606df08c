//! The seam between the webhook pipeline and whichever model backend is
//! configured.

use async_trait::async_trait;
use tiendita_core::domain::TenantIdentity;
use tiendita_core::replies;
use tiendita_core::trace::RequestTrace;

use crate::llm::LlmError;

/// What a backend hands back to the pipeline.
#[derive(Clone, Debug, PartialEq)]
pub enum BackendReply {
    /// Structured intent for the dispatcher to act on.
    Intent(tiendita_core::domain::ClassifiedIntent),
    /// A finished reply. The dispatcher is skipped entirely.
    Final(String),
}

/// Classification never fails: every upstream error is absorbed into a fixed
/// user-facing reply so the webhook always answers something.
#[async_trait]
pub trait ClassifierBackend: Send + Sync {
    async fn classify(
        &self,
        tenant: &TenantIdentity,
        message: &str,
        trace: &mut RequestTrace,
    ) -> BackendReply;
}

/// Fixed reply for each upstream failure class. Quota gets its own message so
/// owners understand the assistant is rate-limited rather than broken.
pub fn reply_for_llm_error(error: &LlmError) -> &'static str {
    match error {
        LlmError::QuotaExhausted(_) => replies::QUOTA_EXCEEDED,
        LlmError::Unavailable { .. } | LlmError::Transport(_) => replies::ASSISTANT_UNAVAILABLE,
        LlmError::Rejected { .. } | LlmError::Empty | LlmError::Decode(_) => {
            replies::COULD_NOT_PROCESS
        }
    }
}
