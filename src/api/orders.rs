use crate::{
    dto::orders::OrderAck,
    error::AppResult,
    models::Order,
};

use super::ApiClient;

impl ApiClient {
    /// Atomic order creation: the backend re-checks stock and rejects the
    /// order if it changed since the pre-checkout validation.
    pub async fn create_order_with_stock_validation(&self, order: &Order) -> AppResult<OrderAck> {
        self.post_json("/orders/with-stock-validation", order).await
    }

    pub async fn list_orders(&self) -> AppResult<Vec<Order>> {
        self.get_json("/orders").await
    }

    pub async fn get_order(&self, id: &str) -> AppResult<Order> {
        self.get_json(&format!("/order/{id}")).await
    }

    /// Cancel an order; the backend restores stock for all of its items.
    pub async fn cancel_order(&self, id: &str) -> AppResult<OrderAck> {
        self.put_empty(&format!("/order/{id}/cancel")).await
    }
}
