//! Store-backed tools exposed to the tool-calling backend.
//!
//! Only two operations are declared: reading inventory and adjusting stock.
//! The model never sees any other store surface, so the blast radius of a
//! misunderstood message stays at these two queries.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tiendita_agent::llm::FunctionDeclaration;
use tiendita_agent::tools::{Tool, ToolError};
use tiendita_core::domain::product::Product;
use tiendita_core::domain::OwnerId;
use tiendita_db::repositories::ProductRepository;

/// Sentinel query value that means "the whole catalog".
const ALL_ITEMS: &str = "ALL_ITEMS";
const LIST_LIMIT: u32 = 20;
const SEARCH_LIMIT: u32 = 5;

pub struct GetInventoryTool {
    products: Arc<dyn ProductRepository>,
}

impl GetInventoryTool {
    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        Self { products }
    }
}

#[derive(Debug, Deserialize)]
struct GetInventoryInput {
    #[serde(default)]
    query: String,
}

fn product_payload(product: &Product) -> Value {
    json!({
        "name": product.name,
        "sku": product.sku,
        "price": product.price,
        "stock": product.stock,
    })
}

/// Models phrase "show me everything" inconsistently; treat the sentinel and
/// any query mentioning "todo" as a full listing.
fn wants_full_listing(query: &str) -> bool {
    query == ALL_ITEMS || query.to_lowercase().contains("todo")
}

#[async_trait]
impl Tool for GetInventoryTool {
    fn name(&self) -> &'static str {
        "get_inventory"
    }

    fn declaration(&self) -> FunctionDeclaration {
        FunctionDeclaration {
            name: "get_inventory".to_string(),
            description: format!(
                "Look up products in the store catalog by name. \
                 Pass query=\"{ALL_ITEMS}\" to list the whole catalog."
            ),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Product name or fragment to search for"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn execute(&self, owner: &OwnerId, input: Value) -> Result<Value, ToolError> {
        let input: GetInventoryInput = serde_json::from_value(input)
            .map_err(|error| ToolError::InvalidInput(error.to_string()))?;

        let hits = if wants_full_listing(&input.query) {
            self.products.list(owner, LIST_LIMIT).await
        } else {
            self.products.search_by_name(owner, &input.query, SEARCH_LIMIT).await
        }
        .map_err(|error| ToolError::Store(error.to_string()))?;

        Ok(json!({
            "count": hits.len(),
            "products": hits.iter().map(product_payload).collect::<Vec<_>>(),
        }))
    }
}

pub struct UpdateStockTool {
    products: Arc<dyn ProductRepository>,
}

impl UpdateStockTool {
    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        Self { products }
    }
}

#[derive(Debug, Deserialize)]
struct UpdateStockInput {
    sku: String,
    quantity: i64,
}

#[async_trait]
impl Tool for UpdateStockTool {
    fn name(&self) -> &'static str {
        "update_stock"
    }

    fn declaration(&self) -> FunctionDeclaration {
        FunctionDeclaration {
            name: "update_stock".to_string(),
            description: "Adjust the stock of a product by a signed quantity. \
                 Use a negative quantity for units sold or removed."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "sku": {
                        "type": "string",
                        "description": "Exact SKU of the product, as returned by get_inventory"
                    },
                    "quantity": {
                        "type": "integer",
                        "description": "Signed number of units to add to the current stock"
                    }
                },
                "required": ["sku", "quantity"]
            }),
        }
    }

    async fn execute(&self, owner: &OwnerId, input: Value) -> Result<Value, ToolError> {
        let input: UpdateStockInput = serde_json::from_value(input)
            .map_err(|error| ToolError::InvalidInput(error.to_string()))?;

        let adjustment = self
            .products
            .adjust_stock(owner, &input.sku, input.quantity)
            .await
            .map_err(|error| ToolError::Store(error.to_string()))?;

        match adjustment {
            Some(adjustment) => Ok(json!({
                "success": true,
                "sku": adjustment.sku,
                "new_stock": adjustment.new_stock,
            })),
            None => Ok(json!({"error": "SKU not found"})),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use tiendita_agent::tools::Tool;
    use tiendita_core::domain::OwnerId;
    use tiendita_db::repositories::SqlProductRepository;
    use tiendita_db::{connect_with_settings, fixtures, migrations, DbPool};

    use super::{GetInventoryTool, UpdateStockTool};

    async fn seeded() -> (Arc<SqlProductRepository>, OwnerId, DbPool) {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        let summary = fixtures::seed_demo(&pool).await.expect("seed");
        (Arc::new(SqlProductRepository::new(pool.clone())), summary.owner_id, pool)
    }

    #[tokio::test]
    async fn inventory_search_returns_matching_products() {
        let (products, owner, pool) = seeded().await;
        let tool = GetInventoryTool::new(products);

        let result = tool.execute(&owner, json!({"query": "inca"})).await.expect("execute");

        assert_eq!(result["count"], 1);
        assert_eq!(result["products"][0]["name"], "Inca Kola 500ml");
        pool.close().await;
    }

    #[tokio::test]
    async fn sentinel_query_lists_the_whole_catalog() {
        let (products, owner, pool) = seeded().await;
        let tool = GetInventoryTool::new(products);

        let result = tool.execute(&owner, json!({"query": "ALL_ITEMS"})).await.expect("execute");
        assert_eq!(result["count"], fixtures::DEMO_PRODUCT_NAMES.len());

        let result = tool
            .execute(&owner, json!({"query": "muéstrame todo"}))
            .await
            .expect("execute");
        assert_eq!(result["count"], fixtures::DEMO_PRODUCT_NAMES.len());
        pool.close().await;
    }

    #[tokio::test]
    async fn no_matches_yields_an_empty_listing_not_an_error() {
        let (products, owner, pool) = seeded().await;
        let tool = GetInventoryTool::new(products);

        let result = tool.execute(&owner, json!({"query": "tamales"})).await.expect("execute");
        assert_eq!(result["count"], 0);
        pool.close().await;
    }

    #[tokio::test]
    async fn stock_update_on_unknown_sku_reports_it_in_the_payload() {
        let (products, owner, pool) = seeded().await;
        let tool = UpdateStockTool::new(products);

        let result = tool
            .execute(&owner, json!({"sku": "SKU-MISSING", "quantity": 3}))
            .await
            .expect("execute");

        assert_eq!(result["error"], "SKU not found");
        pool.close().await;
    }

    #[tokio::test]
    async fn stock_update_applies_a_signed_delta() {
        let (products, owner, pool) = seeded().await;
        let inventory = GetInventoryTool::new(products.clone());
        let listing = inventory.execute(&owner, json!({"query": "inca"})).await.expect("execute");
        let sku = listing["products"][0]["sku"].as_str().expect("sku").to_string();
        let stock = listing["products"][0]["stock"].as_i64().expect("stock");

        let tool = UpdateStockTool::new(products);
        let result =
            tool.execute(&owner, json!({"sku": sku, "quantity": -2})).await.expect("execute");

        assert_eq!(result["success"], true);
        assert_eq!(result["new_stock"], stock - 2);
        pool.close().await;
    }

    #[tokio::test]
    async fn malformed_input_is_rejected() {
        let (products, owner, pool) = seeded().await;
        let tool = UpdateStockTool::new(products);

        let result = tool.execute(&owner, json!({"sku": "SKU-1"})).await;
        assert!(result.is_err());
        pool.close().await;
    }
}
