//! Executes one classified intent against the store and composes the reply.
//!
//! Guard rule: the model proposes, the dispatcher disposes. A structured
//! intent missing its required slots is demoted to a plain chat reply rather
//! than guessed at; a store failure becomes a fixed apology. The dispatcher
//! never raises.

use std::sync::Arc;

use chrono::Utc;
use tiendita_core::domain::product::{Product, DEFAULT_CATEGORY};
use tiendita_core::domain::{ClassifiedIntent, IntentKind, TenantIdentity};
use tiendita_core::replies;
use tiendita_core::trace::RequestTrace;
use tiendita_db::repositories::{
    OrderRepository, ProductChanges, ProductRepository, RepositoryError, TenantRepository,
};
use tracing::{info, warn};
use uuid::Uuid;

/// Matches shown for a product search before the list stops being readable
/// in a chat bubble.
const SEARCH_LIMIT: u32 = 5;

/// What executing an intent did, before reply composition. Composition
/// precedence: `error` > `replacement` > model draft (+ `enrichment`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DispatchOutcome {
    /// A store mutation actually happened.
    pub applied: bool,
    /// Store failure text; composed into the fixed apology reply.
    pub error: Option<String>,
    /// Overrides the model draft entirely (not-found, computed report).
    pub replacement: Option<String>,
    /// Appended under the model draft (search listing).
    pub enrichment: Option<String>,
}

impl DispatchOutcome {
    fn applied() -> Self {
        Self { applied: true, ..Self::default() }
    }

    fn passthrough() -> Self {
        Self::default()
    }

    fn replaced(reply: String) -> Self {
        Self { replacement: Some(reply), ..Self::default() }
    }
}

pub struct Dispatcher {
    tenants: Arc<dyn TenantRepository>,
    products: Arc<dyn ProductRepository>,
    orders: Arc<dyn OrderRepository>,
}

impl Dispatcher {
    pub fn new(
        tenants: Arc<dyn TenantRepository>,
        products: Arc<dyn ProductRepository>,
        orders: Arc<dyn OrderRepository>,
    ) -> Self {
        Self { tenants, products, orders }
    }

    pub async fn dispatch(
        &self,
        tenant: &TenantIdentity,
        intent: ClassifiedIntent,
        trace: &mut RequestTrace,
    ) -> String {
        info!(
            event_name = "dispatch.intent",
            intent = intent.kind.as_str(),
            owner_id = %tenant.owner_id,
            "dispatching intent"
        );

        let outcome = match self.execute(tenant, &intent, trace).await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(
                    event_name = "dispatch.store_failure",
                    intent = intent.kind.as_str(),
                    error = %error,
                    "store operation failed"
                );
                trace.push(format!("dispatch: store failure: {error}"));
                DispatchOutcome { error: Some(error.to_string()), ..DispatchOutcome::default() }
            }
        };

        compose_reply(&intent, outcome)
    }

    async fn execute(
        &self,
        tenant: &TenantIdentity,
        intent: &ClassifiedIntent,
        trace: &mut RequestTrace,
    ) -> Result<DispatchOutcome, RepositoryError> {
        match intent.kind {
            IntentKind::AddProduct => self.add_product(tenant, intent, trace).await,
            IntentKind::UpdateProduct => self.update_product(tenant, intent, trace).await,
            IntentKind::DeleteProduct => self.delete_product(tenant, intent, trace).await,
            IntentKind::RegisterSale => self.register_sale(tenant, intent, trace).await,
            IntentKind::UpdateBusiness => self.update_business(tenant, intent, trace).await,
            IntentKind::SearchProduct => self.search_product(tenant, intent, trace).await,
            IntentKind::SalesReport => self.sales_report(tenant, trace).await,
            IntentKind::Chat => Ok(DispatchOutcome::passthrough()),
        }
    }

    async fn add_product(
        &self,
        tenant: &TenantIdentity,
        intent: &ClassifiedIntent,
        trace: &mut RequestTrace,
    ) -> Result<DispatchOutcome, RepositoryError> {
        let (Some(name), Some(price), Some(stock)) =
            (intent.fields.name.as_deref(), intent.fields.price, intent.fields.stock)
        else {
            trace.push("dispatch: add_product missing required fields, demoted to chat".to_string());
            return Ok(DispatchOutcome::passthrough());
        };

        let now = Utc::now();
        let product = Product {
            id: format!("prd-{}", Uuid::new_v4().simple()),
            owner_id: tenant.owner_id.clone(),
            sku: Product::generate_sku(now),
            name: name.to_string(),
            category: intent
                .fields
                .category
                .clone()
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            price,
            stock,
            created_at: now,
        };
        let sku = product.sku.clone();
        self.products.insert(product).await?;
        trace.push(format!("dispatch: product inserted with sku {sku}"));
        Ok(DispatchOutcome::applied())
    }

    async fn update_product(
        &self,
        tenant: &TenantIdentity,
        intent: &ClassifiedIntent,
        trace: &mut RequestTrace,
    ) -> Result<DispatchOutcome, RepositoryError> {
        let Some(name) = intent.fields.name.as_deref() else {
            trace.push("dispatch: update_product missing name, demoted to chat".to_string());
            return Ok(DispatchOutcome::passthrough());
        };
        let changes = ProductChanges {
            new_name: intent.fields.new_name.clone(),
            price: intent.fields.price,
            stock: intent.fields.stock,
        };
        if changes.is_empty() {
            trace.push("dispatch: update_product carries no changes, demoted to chat".to_string());
            return Ok(DispatchOutcome::passthrough());
        }

        let updated = self.products.update_by_name(&tenant.owner_id, name, changes).await?;
        trace.push(format!("dispatch: update_product touched {updated} row(s)"));
        if updated == 0 {
            return Ok(DispatchOutcome::replaced(replies::product_not_found(name)));
        }
        Ok(DispatchOutcome::applied())
    }

    async fn delete_product(
        &self,
        tenant: &TenantIdentity,
        intent: &ClassifiedIntent,
        trace: &mut RequestTrace,
    ) -> Result<DispatchOutcome, RepositoryError> {
        let Some(name) = intent.fields.name.as_deref() else {
            trace.push("dispatch: delete_product missing name, demoted to chat".to_string());
            return Ok(DispatchOutcome::passthrough());
        };

        let deleted = self.products.delete_by_name(&tenant.owner_id, name).await?;
        trace.push(format!("dispatch: delete_product removed {deleted} row(s)"));
        if deleted == 0 {
            return Ok(DispatchOutcome::replaced(replies::product_not_found(name)));
        }
        Ok(DispatchOutcome::applied())
    }

    async fn register_sale(
        &self,
        tenant: &TenantIdentity,
        intent: &ClassifiedIntent,
        trace: &mut RequestTrace,
    ) -> Result<DispatchOutcome, RepositoryError> {
        let Some(amount) = intent.fields.amount else {
            trace.push("dispatch: register_sale missing amount, demoted to chat".to_string());
            return Ok(DispatchOutcome::passthrough());
        };

        let order = self.orders.insert_sale(&tenant.owner_id, amount).await?;
        trace.push(format!("dispatch: sale {} recorded for S/ {amount:.2}", order.id));
        Ok(DispatchOutcome::applied())
    }

    async fn update_business(
        &self,
        tenant: &TenantIdentity,
        intent: &ClassifiedIntent,
        trace: &mut RequestTrace,
    ) -> Result<DispatchOutcome, RepositoryError> {
        let Some(company_name) = intent.fields.company_name.as_deref() else {
            trace.push("dispatch: update_business missing company_name, demoted to chat".to_string());
            return Ok(DispatchOutcome::passthrough());
        };

        let updated = self.tenants.rename_business(&tenant.owner_id, company_name).await?;
        trace.push(format!("dispatch: update_business touched {updated} row(s)"));
        Ok(DispatchOutcome { applied: updated > 0, ..DispatchOutcome::default() })
    }

    async fn search_product(
        &self,
        tenant: &TenantIdentity,
        intent: &ClassifiedIntent,
        trace: &mut RequestTrace,
    ) -> Result<DispatchOutcome, RepositoryError> {
        let Some(name) = intent.fields.name.as_deref() else {
            trace.push("dispatch: search_product missing name, demoted to chat".to_string());
            return Ok(DispatchOutcome::passthrough());
        };

        let hits = self.products.search_by_name(&tenant.owner_id, name, SEARCH_LIMIT).await?;
        trace.push(format!("dispatch: search_product matched {} row(s)", hits.len()));
        if hits.is_empty() {
            // Whatever the model drafted assumed matches; replace it outright.
            return Ok(DispatchOutcome::replaced(replies::product_not_found(name)));
        }

        let listing = hits
            .iter()
            .map(|product| {
                format!("• {} — S/ {:.2} (stock: {})", product.name, product.price, product.stock)
            })
            .collect::<Vec<_>>()
            .join("\n");
        Ok(DispatchOutcome { enrichment: Some(listing), ..DispatchOutcome::default() })
    }

    async fn sales_report(
        &self,
        tenant: &TenantIdentity,
        trace: &mut RequestTrace,
    ) -> Result<DispatchOutcome, RepositoryError> {
        let total = self.orders.completed_total(&tenant.owner_id).await?;
        trace.push(format!("dispatch: sales_report total S/ {total:.2}"));
        Ok(DispatchOutcome::replaced(replies::sales_report_total(total)))
    }
}

/// Merges the store outcome with the model's drafted confirmation.
fn compose_reply(intent: &ClassifiedIntent, outcome: DispatchOutcome) -> String {
    if let Some(error) = outcome.error {
        return replies::action_failed(&error);
    }
    if let Some(replacement) = outcome.replacement {
        return replacement;
    }

    let draft = intent.reply_draft.trim();
    let mut reply =
        if draft.is_empty() { replies::PROCESSED_FALLBACK.to_string() } else { draft.to_string() };
    if let Some(enrichment) = outcome.enrichment {
        reply.push('\n');
        reply.push_str(&enrichment);
    }
    reply
}
