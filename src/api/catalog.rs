use std::collections::HashMap;

use crate::{
    dto::products::{
        BulkStockValidationRequest, CreateProductRequest, SingleStockValidationResponse,
        StockRequestItem, UpdateStockRequest,
    },
    error::AppResult,
    models::{Product, StockValidation},
};

use super::ApiClient;

impl ApiClient {
    /// Fetch the full catalog. The backend keys products by id; callers get a
    /// stable id-sorted list.
    pub async fn list_products(&self) -> AppResult<Vec<Product>> {
        let map: HashMap<String, Product> = self.get_json("/products").await?;
        let mut products: Vec<Product> = map.into_values().collect();
        products.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(products)
    }

    pub async fn get_product(&self, id: &str) -> AppResult<Product> {
        self.get_json(&format!("/product/{id}")).await
    }

    pub async fn create_product(&self, payload: &CreateProductRequest) -> AppResult<Product> {
        self.post_json("/products", payload).await
    }

    pub async fn update_stock(&self, id: &str, stock: i32) -> AppResult<Product> {
        self.put_json(&format!("/product/{id}/stock"), &UpdateStockRequest { stock })
            .await
    }

    pub async fn validate_stock(
        &self,
        item: &StockRequestItem,
    ) -> AppResult<SingleStockValidationResponse> {
        self.post_json("/product/validate-stock", item).await
    }

    pub async fn validate_bulk_stock(
        &self,
        items: Vec<StockRequestItem>,
    ) -> AppResult<StockValidation> {
        self.post_json(
            "/products/validate-bulk-stock",
            &BulkStockValidationRequest { items },
        )
        .await
    }
}
