use sqlx::Row;

use tiendita_core::domain::tenant::{OwnerId, TenantIdentity};

use super::{RepositoryError, TenantRepository};
use crate::DbPool;

pub struct SqlTenantRepository {
    pool: DbPool,
}

impl SqlTenantRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn identity_from_row(row: &sqlx::sqlite::SqliteRow) -> TenantIdentity {
    TenantIdentity {
        owner_id: OwnerId(row.get::<String, _>("id")),
        display_name: row.get::<String, _>("business_name"),
    }
}

#[async_trait::async_trait]
impl TenantRepository for SqlTenantRepository {
    async fn find_by_contact(
        &self,
        address: &str,
    ) -> Result<Option<TenantIdentity>, RepositoryError> {
        let row = sqlx::query("SELECT id, business_name FROM tenants WHERE contact_address = ?")
            .bind(address)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(identity_from_row))
    }

    async fn find_by_contact_suffix(
        &self,
        suffix: &str,
    ) -> Result<Option<TenantIdentity>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, business_name FROM tenants \
             WHERE contact_address LIKE '%' || ? ESCAPE '\\' \
             ORDER BY created_at LIMIT 1",
        )
        .bind(super::escape_like(suffix))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(identity_from_row))
    }

    async fn rename_business(
        &self,
        owner: &OwnerId,
        business_name: &str,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query("UPDATE tenants SET business_name = ? WHERE id = ?")
            .bind(business_name)
            .bind(&owner.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
