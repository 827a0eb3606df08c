//! Webhook surface and the per-message pipeline behind it.
//!
//! Endpoints:
//! - `GET  /webhook` — channel subscription handshake (challenge echo)
//! - `POST /webhook` — inbound event; always answered with 200 so the channel
//!   never retries, with the processing outcome in the body
//!
//! The POST body reports `{status, logs, reply?}`: `SUCCESS` for a processed
//! message, `OK_UNLINKED_REPLIED` when the sender is not linked to a tenant
//! and got the enrollment notice, `CRASH` when processing panicked. The
//! pipeline runs on its own task so a panic is contained to the request.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use secrecy::SecretString;
use serde::Serialize;
use tiendita_agent::backend::{BackendReply, ClassifierBackend};
use tiendita_core::replies;
use tiendita_core::trace::RequestTrace;
use tiendita_db::repositories::TenantRepository;
use tiendita_whatsapp::inbound::{InboundMessage, WebhookPayload};
use tiendita_whatsapp::outbound::OutboundMessenger;
use tiendita_whatsapp::verify::{verify_subscription, VerifyOutcome, VerifyParams};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::dispatch::Dispatcher;
use crate::identity;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessStatus {
    Success,
    OkUnlinkedReplied,
    Crash,
}

#[derive(Clone, Debug, Serialize)]
pub struct WebhookResponse {
    pub status: ProcessStatus,
    pub logs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
}

/// Outcome of one POST: either a bare acknowledgement for events that carry
/// no text message, or a full processing report.
pub enum WebhookReply {
    Ack,
    Processed(WebhookResponse),
}

impl IntoResponse for WebhookReply {
    fn into_response(self) -> Response {
        match self {
            Self::Ack => (StatusCode::OK, "EVENT_RECEIVED").into_response(),
            Self::Processed(body) => (StatusCode::OK, Json(body)).into_response(),
        }
    }
}

pub struct MessagePipeline {
    tenants: Arc<dyn TenantRepository>,
    dispatcher: Dispatcher,
    backend: Arc<dyn ClassifierBackend>,
    messenger: Arc<dyn OutboundMessenger>,
}

impl MessagePipeline {
    pub fn new(
        tenants: Arc<dyn TenantRepository>,
        dispatcher: Dispatcher,
        backend: Arc<dyn ClassifierBackend>,
        messenger: Arc<dyn OutboundMessenger>,
    ) -> Self {
        Self { tenants, dispatcher, backend, messenger }
    }

    pub async fn handle(&self, message: InboundMessage) -> WebhookResponse {
        let mut trace = RequestTrace::new();
        trace.push(format!("received message from {}", message.sender));

        let Some(tenant) =
            identity::resolve(self.tenants.as_ref(), &message.sender, &mut trace).await
        else {
            let reply = replies::ENROLLMENT_NOTICE.to_string();
            self.deliver(&message.sender, &reply, &mut trace).await;
            return WebhookResponse {
                status: ProcessStatus::OkUnlinkedReplied,
                logs: trace.into_lines(),
                reply: Some(reply),
            };
        };

        let reply = match self.backend.classify(&tenant, &message.body, &mut trace).await {
            BackendReply::Final(text) => text,
            BackendReply::Intent(intent) => {
                self.dispatcher.dispatch(&tenant, intent, &mut trace).await
            }
        };

        self.deliver(&message.sender, &reply, &mut trace).await;
        WebhookResponse {
            status: ProcessStatus::Success,
            logs: trace.into_lines(),
            reply: Some(reply),
        }
    }

    /// Delivery failures are logged but never change the request outcome.
    async fn deliver(&self, to: &str, body: &str, trace: &mut RequestTrace) {
        match self.messenger.send_text(to, body).await {
            Ok(delivery_id) => trace.push(format!("reply delivered ({delivery_id})")),
            Err(error) => {
                warn!(event_name = "webhook.delivery_failed", error = %error, "reply delivery failed");
                trace.push(format!("reply delivery failed: {error}"));
            }
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub verify_token: SecretString,
    pub pipeline: Arc<MessagePipeline>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", get(verify_webhook).post(receive_webhook))
        .with_state(state)
}

pub async fn verify_webhook(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> (StatusCode, String) {
    match verify_subscription(&params, &state.verify_token) {
        VerifyOutcome::Accepted(challenge) => {
            info!(event_name = "webhook.verified", "subscription handshake accepted");
            (StatusCode::OK, challenge)
        }
        VerifyOutcome::Rejected => {
            warn!(event_name = "webhook.verify_rejected", "subscription handshake rejected");
            (StatusCode::FORBIDDEN, String::new())
        }
    }
}

pub async fn receive_webhook(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> WebhookReply {
    process_payload(&state, payload).await
}

pub async fn process_payload(state: &AppState, payload: WebhookPayload) -> WebhookReply {
    let Some(message) = payload.first_text_message() else {
        return WebhookReply::Ack;
    };

    let correlation_id = Uuid::new_v4().to_string();
    info!(
        event_name = "webhook.message_received",
        correlation_id = %correlation_id,
        sender = %message.sender,
        "processing inbound message"
    );

    let pipeline = state.pipeline.clone();
    let task = tokio::spawn(async move { pipeline.handle(message).await });
    match task.await {
        Ok(outcome) => WebhookReply::Processed(outcome),
        Err(join_error) => {
            error!(
                event_name = "webhook.pipeline_panicked",
                correlation_id = %correlation_id,
                error = %join_error,
                "message pipeline panicked"
            );
            WebhookReply::Processed(WebhookResponse {
                status: ProcessStatus::Crash,
                logs: vec![format!("pipeline panicked: {join_error}")],
                reply: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use secrecy::SecretString;
    use tiendita_agent::backend::{BackendReply, ClassifierBackend};
    use tiendita_core::domain::{ClassifiedIntent, IntentFields, IntentKind, TenantIdentity};
    use tiendita_core::replies;
    use tiendita_core::trace::RequestTrace;
    use tiendita_db::repositories::{
        OrderRepository, SqlOrderRepository, SqlProductRepository, SqlTenantRepository,
    };
    use tiendita_db::{connect_with_settings, fixtures, migrations, DbPool};
    use tiendita_whatsapp::inbound::WebhookPayload;
    use tiendita_whatsapp::outbound::NoopMessenger;
    use tiendita_whatsapp::verify::VerifyParams;

    use super::{
        process_payload, verify_webhook, AppState, MessagePipeline, ProcessStatus, WebhookReply,
    };
    use crate::dispatch::Dispatcher;

    struct ScriptedBackend {
        reply: BackendReply,
    }

    #[async_trait]
    impl ClassifierBackend for ScriptedBackend {
        async fn classify(
            &self,
            _tenant: &TenantIdentity,
            _message: &str,
            trace: &mut RequestTrace,
        ) -> BackendReply {
            trace.push("classified (scripted)".to_string());
            self.reply.clone()
        }
    }

    struct PanickingBackend;

    #[async_trait]
    impl ClassifierBackend for PanickingBackend {
        async fn classify(
            &self,
            _tenant: &TenantIdentity,
            _message: &str,
            _trace: &mut RequestTrace,
        ) -> BackendReply {
            panic!("scripted panic");
        }
    }

    async fn state_with(
        backend: Arc<dyn ClassifierBackend>,
    ) -> (AppState, Arc<NoopMessenger>, DbPool) {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        fixtures::seed_demo(&pool).await.expect("seed");

        let tenants = Arc::new(SqlTenantRepository::new(pool.clone()));
        let dispatcher = Dispatcher::new(
            tenants.clone(),
            Arc::new(SqlProductRepository::new(pool.clone())),
            Arc::new(SqlOrderRepository::new(pool.clone())),
        );
        let messenger = Arc::new(NoopMessenger::new());
        let pipeline =
            MessagePipeline::new(tenants, dispatcher, backend, messenger.clone());

        let state = AppState {
            verify_token: SecretString::from("verify-secret".to_string()),
            pipeline: Arc::new(pipeline),
        };
        (state, messenger, pool)
    }

    fn payload_from(sender: &str, body: &str) -> WebhookPayload {
        serde_json::from_str(&format!(
            r#"{{"entry": [{{"changes": [{{"value": {{"messages": [{{"from": "{sender}", "text": {{"body": "{body}"}}}}]}}}}]}}]}}"#
        ))
        .expect("payload")
    }

    #[tokio::test]
    async fn handshake_echoes_the_challenge() {
        let backend = Arc::new(ScriptedBackend { reply: BackendReply::Final("hola".to_string()) });
        let (state, _, pool) = state_with(backend).await;

        let params = VerifyParams {
            mode: Some("subscribe".to_string()),
            verify_token: Some("verify-secret".to_string()),
            challenge: Some("ABC123".to_string()),
        };
        let (status, body) = verify_webhook(State(state), Query(params)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ABC123");
        pool.close().await;
    }

    #[tokio::test]
    async fn handshake_with_wrong_token_is_forbidden() {
        let backend = Arc::new(ScriptedBackend { reply: BackendReply::Final("hola".to_string()) });
        let (state, _, pool) = state_with(backend).await;

        let params = VerifyParams {
            mode: Some("subscribe".to_string()),
            verify_token: Some("wrong".to_string()),
            challenge: Some("ABC123".to_string()),
        };
        let (status, _) = verify_webhook(State(state), Query(params)).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        pool.close().await;
    }

    #[tokio::test]
    async fn status_only_event_is_acknowledged_without_processing() {
        let backend = Arc::new(ScriptedBackend { reply: BackendReply::Final("hola".to_string()) });
        let (state, messenger, pool) = state_with(backend).await;

        let payload: WebhookPayload = serde_json::from_str(
            r#"{"entry": [{"changes": [{"value": {"statuses": [{"status": "delivered"}]}}]}]}"#,
        )
        .expect("payload");

        let reply = process_payload(&state, payload).await;
        assert!(matches!(reply, WebhookReply::Ack));
        assert!(messenger.sent().await.is_empty());
        pool.close().await;
    }

    #[tokio::test]
    async fn linked_sender_with_sale_message_succeeds_end_to_end() {
        let backend = Arc::new(ScriptedBackend {
            reply: BackendReply::Intent(ClassifiedIntent {
                kind: IntentKind::RegisterSale,
                fields: IntentFields { amount: Some(50.0), ..IntentFields::default() },
                reply_draft: "Venta de S/ 50 registrada.".to_string(),
            }),
        });
        let (state, messenger, pool) = state_with(backend).await;

        let reply = process_payload(
            &state,
            payload_from(fixtures::DEMO_CONTACT_ADDRESS, "Vendí 50 soles"),
        )
        .await;

        let WebhookReply::Processed(outcome) = reply else { panic!("expected outcome") };
        assert_eq!(outcome.status, ProcessStatus::Success);
        assert_eq!(outcome.reply.as_deref(), Some("Venta de S/ 50 registrada."));
        assert!(outcome.logs.iter().any(|line| line.contains("sale")));

        let sent = messenger.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, "Venta de S/ 50 registrada.");

        let orders = SqlOrderRepository::new(pool.clone());
        let tenants = SqlTenantRepository::new(pool.clone());
        let tenant = tiendita_db::repositories::TenantRepository::find_by_contact(
            &tenants,
            fixtures::DEMO_CONTACT_ADDRESS,
        )
        .await
        .expect("lookup")
        .expect("tenant");
        assert_eq!(orders.completed_total(&tenant.owner_id).await.expect("total"), 50.0);
        pool.close().await;
    }

    #[tokio::test]
    async fn unlinked_sender_gets_the_enrollment_notice_and_no_writes() {
        let backend = Arc::new(ScriptedBackend { reply: BackendReply::Final("hola".to_string()) });
        let (state, messenger, pool) = state_with(backend).await;

        let reply = process_payload(&state, payload_from("19995550000", "hola")).await;

        let WebhookReply::Processed(outcome) = reply else { panic!("expected outcome") };
        assert_eq!(outcome.status, ProcessStatus::OkUnlinkedReplied);
        assert_eq!(outcome.reply.as_deref(), Some(replies::ENROLLMENT_NOTICE));

        let sent = messenger.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "19995550000");
        assert_eq!(sent[0].1, replies::ENROLLMENT_NOTICE);

        let order_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(order_count, 0);
        pool.close().await;
    }

    #[tokio::test]
    async fn pipeline_panic_is_reported_as_a_crash_outcome() {
        let (state, messenger, pool) = state_with(Arc::new(PanickingBackend)).await;

        let reply =
            process_payload(&state, payload_from(fixtures::DEMO_CONTACT_ADDRESS, "hola")).await;

        let WebhookReply::Processed(outcome) = reply else { panic!("expected outcome") };
        assert_eq!(outcome.status, ProcessStatus::Crash);
        assert!(outcome.reply.is_none());
        assert!(outcome.logs.iter().any(|line| line.contains("panicked")));
        assert!(messenger.sent().await.is_empty());
        pool.close().await;
    }

    #[test]
    fn status_serializes_screaming_snake_case() {
        assert_eq!(serde_json::to_string(&ProcessStatus::Success).expect("encode"), "\"SUCCESS\"");
        assert_eq!(
            serde_json::to_string(&ProcessStatus::OkUnlinkedReplied).expect("encode"),
            "\"OK_UNLINKED_REPLIED\""
        );
        assert_eq!(serde_json::to_string(&ProcessStatus::Crash).expect("encode"), "\"CRASH\"");
    }
}
