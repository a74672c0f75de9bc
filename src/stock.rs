//! Pre-checkout stock validation.
//!
//! Advisory-but-required: this check runs immediately before any payment flow
//! is initiated, but stock can still change before order creation, so final
//! authority rests with the order-creation endpoint.

use crate::{
    api::ApiClient,
    cart::Cart,
    dto::products::StockRequestItem,
    error::{AppError, AppResult},
    models::{StockCheck, StockValidation},
};

/// Validate every cart line against live stock. The result is computed fresh
/// on each call and must not be cached.
pub async fn validate_cart(api: &ApiClient, cart: &Cart) -> AppResult<StockValidation> {
    let items: Vec<StockRequestItem> = cart
        .lines()
        .iter()
        .map(|line| StockRequestItem {
            product_id: line.product.id.clone(),
            quantity: line.quantity,
        })
        .collect();

    tracing::debug!(items = items.len(), "validating bulk stock");
    api.validate_bulk_stock(items).await
}

/// Validate the cart and convert any shortfall into an error carrying the
/// exact requested-vs-available quantities per product.
pub async fn ensure_cart_available(api: &ApiClient, cart: &Cart) -> AppResult<()> {
    let validation = validate_cart(api, cart).await?;
    if !validation.all_available {
        return Err(AppError::StockShortfall(validation.shortfalls()));
    }
    Ok(())
}

/// Single-line check used by scanner and manual-entry flows before adding a
/// product to the cart.
pub async fn validate_line(
    api: &ApiClient,
    product_id: &str,
    quantity: i32,
) -> AppResult<StockCheck> {
    let item = StockRequestItem {
        product_id: product_id.to_string(),
        quantity,
    };
    let response = api.validate_stock(&item).await?;
    Ok(StockCheck {
        product_id: item.product_id,
        requested_quantity: quantity,
        available_stock: response.available_stock,
        available: response.available,
    })
}
