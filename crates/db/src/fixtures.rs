//! Deterministic demo fixtures for local development and tests.
//!
//! `seed_demo` links one demo tenant to a WhatsApp number and gives it a
//! small catalog. Seeding is idempotent: re-running against an already
//! seeded database changes nothing.

use chrono::Utc;
use uuid::Uuid;

use tiendita_core::domain::tenant::OwnerId;

use crate::repositories::RepositoryError;
use crate::DbPool;

pub const DEMO_CONTACT_ADDRESS: &str = "51987654321";
pub const DEMO_BUSINESS_NAME: &str = "Bodega Doña Eva";
pub const DEMO_PRODUCT_NAMES: &[&str] = &["Inca Kola 500ml", "Pan Francés", "Arroz Costeño 1kg"];

#[derive(Clone, Debug)]
pub struct SeedSummary {
    pub owner_id: OwnerId,
    pub tenants_inserted: u64,
    pub products_inserted: u64,
}

pub async fn seed_demo(pool: &DbPool) -> Result<SeedSummary, RepositoryError> {
    let existing = sqlx::query_scalar::<_, Option<String>>(
        "SELECT id FROM tenants WHERE contact_address = ?",
    )
    .bind(DEMO_CONTACT_ADDRESS)
    .fetch_optional(pool)
    .await?
    .flatten();

    if let Some(id) = existing {
        return Ok(SeedSummary {
            owner_id: OwnerId(id),
            tenants_inserted: 0,
            products_inserted: 0,
        });
    }

    let owner_id = OwnerId(format!("tenant-{}", Uuid::new_v4().simple()));
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO tenants (id, contact_address, business_name, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&owner_id.0)
    .bind(DEMO_CONTACT_ADDRESS)
    .bind(DEMO_BUSINESS_NAME)
    .bind(&now)
    .execute(pool)
    .await?;

    let mut products_inserted = 0u64;
    for (index, name) in DEMO_PRODUCT_NAMES.iter().enumerate() {
        let result = sqlx::query(
            "INSERT INTO products (id, owner_id, sku, name, category, price, stock, created_at) \
             VALUES (?, ?, ?, ?, 'General', ?, ?, ?)",
        )
        .bind(format!("prod-demo-{index}"))
        .bind(&owner_id.0)
        .bind(format!("SKU-DEMO-{index}"))
        .bind(name)
        .bind(2.5 + index as f64)
        .bind(24i64)
        .bind(&now)
        .execute(pool)
        .await?;
        products_inserted += result.rows_affected();
    }

    Ok(SeedSummary { owner_id, tenants_inserted: 1, products_inserted })
}

#[cfg(test)]
mod tests {
    use super::seed_demo;
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn seeding_twice_is_idempotent() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");

        let first = seed_demo(&pool).await.expect("first seed");
        assert_eq!(first.tenants_inserted, 1);
        assert_eq!(first.products_inserted, 3);

        let second = seed_demo(&pool).await.expect("second seed");
        assert_eq!(second.tenants_inserted, 0);
        assert_eq!(second.products_inserted, 0);
        assert_eq!(first.owner_id, second.owner_id);

        pool.close().await;
    }
}
