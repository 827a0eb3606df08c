use chrono::Utc;
use uuid::Uuid;

use tiendita_core::domain::order::{Order, OrderStatus, DIRECT_SALE_CUSTOMER};
use tiendita_core::domain::tenant::OwnerId;

use super::{OrderRepository, RepositoryError};
use crate::DbPool;

pub struct SqlOrderRepository {
    pool: DbPool,
}

impl SqlOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl OrderRepository for SqlOrderRepository {
    async fn insert_sale(&self, owner: &OwnerId, total: f64) -> Result<Order, RepositoryError> {
        let order = Order {
            id: format!("ORD-{}", Uuid::new_v4().simple()),
            owner_id: owner.clone(),
            customer_name: DIRECT_SALE_CUSTOMER.to_string(),
            total_amount: total,
            status: OrderStatus::Completed,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO orders (id, owner_id, customer_name, total_amount, status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&order.id)
        .bind(&order.owner_id.0)
        .bind(&order.customer_name)
        .bind(order.total_amount)
        .bind(order.status.as_str())
        .bind(order.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(order)
    }

    async fn completed_total(&self, owner: &OwnerId) -> Result<f64, RepositoryError> {
        let total = sqlx::query_scalar::<_, f64>(
            "SELECT COALESCE(SUM(total_amount), 0.0) FROM orders \
             WHERE owner_id = ? AND status = 'completed'",
        )
        .bind(&owner.0)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}
