//! WhatsApp Cloud API channel adapter.
//!
//! Three concerns, each behind its own module:
//! - `inbound`: the webhook envelope Meta POSTs and extraction of the one
//!   text message this runtime cares about per event;
//! - `verify`: the subscription handshake (`hub.mode` / `hub.verify_token` /
//!   `hub.challenge`);
//! - `outbound`: the messenger seam plus the Cloud API implementation that
//!   delivers replies.

pub mod inbound;
pub mod outbound;
pub mod verify;

pub use inbound::{InboundMessage, WebhookPayload};
pub use outbound::{CloudApiMessenger, NoopMessenger, OutboundMessenger, SendError};
pub use verify::{verify_subscription, VerifyOutcome, VerifyParams};
