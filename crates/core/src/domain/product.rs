use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tenant::OwnerId;

pub const DEFAULT_CATEGORY: &str = "General";

/// One catalog row, always scoped to its owner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub owner_id: OwnerId,
    pub sku: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// SKU derived from the insertion instant. Unique enough for a single
    /// tenant adding products by hand over chat.
    pub fn generate_sku(at: DateTime<Utc>) -> String {
        format!("SKU-{}", at.timestamp_millis())
    }
}
