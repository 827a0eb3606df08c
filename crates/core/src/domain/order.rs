use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tenant::OwnerId;

/// Customer label recorded for sales registered over chat, where no customer
/// record exists.
pub const DIRECT_SALE_CUSTOMER: &str = "Direct Sale";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub owner_id: OwnerId,
    pub customer_name: String,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}
