use chrono::{DateTime, Utc};
use sqlx::Row;

use tiendita_core::domain::product::Product;
use tiendita_core::domain::tenant::OwnerId;

use super::{ProductChanges, ProductRepository, RepositoryError, StockAdjustment};
use crate::DbPool;

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const PRODUCT_COLUMNS: &str = "id, owner_id, sku, name, category, price, stock, created_at";

fn product_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Product, RepositoryError> {
    let created_at_raw = row.get::<String, _>("created_at");
    let created_at = DateTime::parse_from_rfc3339(&created_at_raw)
        .map_err(|error| {
            RepositoryError::Decode(format!("invalid created_at `{created_at_raw}`: {error}"))
        })?
        .with_timezone(&Utc);

    Ok(Product {
        id: row.get::<String, _>("id"),
        owner_id: OwnerId(row.get::<String, _>("owner_id")),
        sku: row.get::<String, _>("sku"),
        name: row.get::<String, _>("name"),
        category: row.get::<String, _>("category"),
        price: row.get::<f64, _>("price"),
        stock: row.get::<i64, _>("stock"),
        created_at,
    })
}

#[async_trait::async_trait]
impl ProductRepository for SqlProductRepository {
    async fn insert(&self, product: Product) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO products (id, owner_id, sku, name, category, price, stock, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&product.id)
        .bind(&product.owner_id.0)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price)
        .bind(product.stock)
        .bind(product.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_by_name(
        &self,
        owner: &OwnerId,
        name: &str,
        changes: ProductChanges,
    ) -> Result<u64, RepositoryError> {
        if changes.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            "UPDATE products SET \
                name = COALESCE(?, name), \
                price = COALESCE(?, price), \
                stock = COALESCE(?, stock) \
             WHERE owner_id = ? AND LOWER(name) = LOWER(?)",
        )
        .bind(changes.new_name.as_deref())
        .bind(changes.price)
        .bind(changes.stock)
        .bind(&owner.0)
        .bind(name)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_by_name(&self, owner: &OwnerId, name: &str) -> Result<u64, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM products WHERE owner_id = ? AND LOWER(name) = LOWER(?)")
                .bind(&owner.0)
                .bind(name)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    async fn search_by_name(
        &self,
        owner: &OwnerId,
        query: &str,
        limit: u32,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE owner_id = ? AND LOWER(name) LIKE '%' || LOWER(?) || '%' ESCAPE '\\' \
             ORDER BY name LIMIT ?"
        ))
        .bind(&owner.0)
        .bind(super::escape_like(query))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(product_from_row).collect()
    }

    async fn list(&self, owner: &OwnerId, limit: u32) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE owner_id = ? LIMIT ?"
        ))
        .bind(&owner.0)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(product_from_row).collect()
    }

    async fn adjust_stock(
        &self,
        owner: &OwnerId,
        sku: &str,
        delta: i64,
    ) -> Result<Option<StockAdjustment>, RepositoryError> {
        let new_stock = sqlx::query_scalar::<_, i64>(
            "UPDATE products SET stock = stock + ? \
             WHERE owner_id = ? AND sku = ? \
             RETURNING stock",
        )
        .bind(delta)
        .bind(&owner.0)
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(new_stock.map(|stock| StockAdjustment { sku: sku.to_string(), new_stock: stock }))
    }
}
