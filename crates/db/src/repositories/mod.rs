use async_trait::async_trait;
use thiserror::Error;

use tiendita_core::domain::order::Order;
use tiendita_core::domain::product::Product;
use tiendita_core::domain::tenant::{OwnerId, TenantIdentity};

pub mod order;
pub mod product;
pub mod tenant;

pub use order::SqlOrderRepository;
pub use product::SqlProductRepository;
pub use tenant::SqlTenantRepository;

/// Escapes `%`, `_`, and the escape character itself so user text binds into
/// a `LIKE` pattern literally. The query must carry `ESCAPE '\'`.
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Read-only tenant lookups plus the single business-rename write. Tenant
/// rows are never created here.
#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn find_by_contact(
        &self,
        address: &str,
    ) -> Result<Option<TenantIdentity>, RepositoryError>;

    /// Matches stored addresses ending with `suffix`, tolerating country-code
    /// or formatting prefixes on either side. First result wins.
    async fn find_by_contact_suffix(
        &self,
        suffix: &str,
    ) -> Result<Option<TenantIdentity>, RepositoryError>;

    /// Returns the number of rows updated.
    async fn rename_business(
        &self,
        owner: &OwnerId,
        business_name: &str,
    ) -> Result<u64, RepositoryError>;
}

/// Fields an update-by-name may change. Absent fields keep their stored
/// value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProductChanges {
    pub new_name: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i64>,
}

impl ProductChanges {
    pub fn is_empty(&self) -> bool {
        self.new_name.is_none() && self.price.is_none() && self.stock.is_none()
    }
}

/// Result of an atomic stock adjustment.
#[derive(Clone, Debug, PartialEq)]
pub struct StockAdjustment {
    pub sku: String,
    pub new_stock: i64,
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn insert(&self, product: Product) -> Result<(), RepositoryError>;

    /// Case-insensitive name match within the tenant. Returns rows updated.
    async fn update_by_name(
        &self,
        owner: &OwnerId,
        name: &str,
        changes: ProductChanges,
    ) -> Result<u64, RepositoryError>;

    /// Case-insensitive name match within the tenant. Returns rows deleted.
    async fn delete_by_name(&self, owner: &OwnerId, name: &str) -> Result<u64, RepositoryError>;

    /// Case-insensitive substring search, capped at `limit` rows.
    async fn search_by_name(
        &self,
        owner: &OwnerId,
        query: &str,
        limit: u32,
    ) -> Result<Vec<Product>, RepositoryError>;

    /// Unfiltered tenant listing, capped at `limit` rows, arbitrary order.
    async fn list(&self, owner: &OwnerId, limit: u32) -> Result<Vec<Product>, RepositoryError>;

    /// Applies `stock = stock + delta` in a single statement so concurrent
    /// adjustments to the same SKU cannot interleave a stale read. Returns
    /// `None` when the SKU does not exist for the tenant.
    async fn adjust_stock(
        &self,
        owner: &OwnerId,
        sku: &str,
        delta: i64,
    ) -> Result<Option<StockAdjustment>, RepositoryError>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Inserts one completed "Direct Sale" order and returns it.
    async fn insert_sale(&self, owner: &OwnerId, total: f64) -> Result<Order, RepositoryError>;

    /// Sum of `total_amount` over the tenant's completed orders.
    async fn completed_total(&self, owner: &OwnerId) -> Result<f64, RepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("Descuento 100%"), "Descuento 100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("Inca Kola"), "Inca Kola");
    }
}
