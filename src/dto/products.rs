use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct CreateProductRequest {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub stock: i32,
    pub category: String,
    pub description: String,
    pub image: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateStockRequest {
    pub stock: i32,
}

/// One `{productId, quantity}` pair sent to the stock validation endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRequestItem {
    pub product_id: String,
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct BulkStockValidationRequest {
    pub items: Vec<StockRequestItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleStockValidationResponse {
    pub available: bool,
    #[serde(default)]
    pub available_stock: i32,
}
