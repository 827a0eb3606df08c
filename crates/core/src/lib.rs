//! Shared domain model and configuration for the tiendita runtime.
//!
//! Everything that more than one crate needs lives here: the tenant and
//! catalog types, the closed intent model produced by the classifier, the
//! per-request trace collector, the fixed user-facing reply strings, and the
//! layered application configuration.
//!
//! # Safety Principle
//!
//! The language model is strictly a translator. It never touches the store
//! directly; it produces a `ClassifiedIntent` (or a tool request) that the
//! deterministic dispatcher validates and executes under tenant scoping.

pub mod config;
pub mod domain;
pub mod replies;
pub mod trace;

pub use domain::intent::{ClassifiedIntent, IntentFields, IntentKind};
pub use domain::order::{Order, OrderStatus};
pub use domain::product::Product;
pub use domain::tenant::{OwnerId, TenantIdentity};
pub use trace::RequestTrace;
