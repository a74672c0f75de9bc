//! Admin surface: session lifecycle around the opaque bearer token, inventory
//! mutation, and order lifecycle management.

use futures_util::future::join_all;

use crate::{
    api::ApiClient,
    dto::{auth::AdminProfile, products::CreateProductRequest},
    error::{AppError, AppResult},
    models::{Order, OrderStatus, Product},
    storage::{AdminSession, StateStore},
};

pub const LOW_STOCK_THRESHOLD: i32 = 10;

/// Log in and persist the session. The token is opaque to the client; it is
/// only ever attached as a bearer header.
pub async fn login(
    api: &mut ApiClient,
    store: &StateStore,
    email: &str,
    password: &str,
) -> AppResult<AdminProfile> {
    let response = api.login(email, password).await?;
    if !response.success || response.token.is_empty() {
        return Err(AppError::Unauthorized);
    }
    let admin = response.admin.unwrap_or(AdminProfile {
        email: email.to_string(),
        name: String::new(),
    });

    let session = AdminSession {
        token: response.token,
        admin: admin.clone(),
    };
    store.save_admin_session(&session).await?;
    api.set_bearer_token(Some(session.token));
    tracing::debug!(email = %admin.email, "admin logged in");
    Ok(admin)
}

/// Revalidate a persisted session on startup. Invalid or unverifiable tokens
/// are discarded locally.
pub async fn restore_session(api: &mut ApiClient, store: &StateStore) -> Option<AdminProfile> {
    let session = store.load_admin_session().await?;
    api.set_bearer_token(Some(session.token));

    match api.verify_token().await {
        Ok(verified) if verified.valid => Some(verified.admin.unwrap_or(session.admin)),
        // A flaky connection is not an invalid token; keep the session and
        // let the backend reject individual calls if it disagrees.
        Err(AppError::Network(err)) => {
            tracing::warn!(error = %err, "could not verify stored admin token; keeping session");
            Some(session.admin)
        }
        _ => {
            tracing::debug!("stored admin token failed verification; clearing");
            api.set_bearer_token(None);
            if let Err(err) = store.clear_admin_session().await {
                tracing::warn!(error = %err, "failed to clear admin session");
            }
            None
        }
    }
}

/// Clear the session locally; the backend notification is best-effort.
pub async fn logout(api: &mut ApiClient, store: &StateStore) -> AppResult<()> {
    if api.bearer_token().is_some() {
        if let Err(err) = api.logout().await {
            tracing::warn!(error = %err, "backend logout failed");
        }
    }
    api.set_bearer_token(None);
    store.clear_admin_session().await
}

fn ensure_admin(api: &ApiClient) -> AppResult<()> {
    if api.bearer_token().is_none() {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

pub async fn add_product(api: &ApiClient, payload: CreateProductRequest) -> AppResult<Product> {
    ensure_admin(api)?;
    if payload.id.trim().is_empty() || payload.name.trim().is_empty() {
        return Err(AppError::Validation(
            "product id and name are required".to_string(),
        ));
    }
    if payload.price <= 0 {
        return Err(AppError::Validation("price must be positive".to_string()));
    }
    if payload.stock < 0 {
        return Err(AppError::Validation("stock cannot be negative".to_string()));
    }
    api.create_product(&payload).await
}

pub async fn set_stock(api: &ApiClient, product_id: &str, stock: i32) -> AppResult<Product> {
    ensure_admin(api)?;
    if stock < 0 {
        return Err(AppError::Validation("stock cannot be negative".to_string()));
    }
    api.update_stock(product_id, stock).await
}

/// Outcome of a bulk stock update with per-product attribution; a partial
/// failure names exactly which products failed.
#[derive(Debug)]
pub struct BulkStockOutcome {
    pub updated: Vec<String>,
    pub failed: Vec<(String, AppError)>,
}

impl BulkStockOutcome {
    pub fn all_updated(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Set the same stock level on many products. All requests are issued
/// concurrently and all are awaited; ordering between them is irrelevant
/// since each targets a distinct product id.
pub async fn bulk_set_stock(
    api: &ApiClient,
    product_ids: &[String],
    stock: i32,
) -> AppResult<BulkStockOutcome> {
    ensure_admin(api)?;
    if stock < 0 {
        return Err(AppError::Validation("stock cannot be negative".to_string()));
    }

    let updates = product_ids.iter().map(|id| {
        let id = id.clone();
        async move {
            let result = api.update_stock(&id, stock).await;
            (id, result)
        }
    });

    let mut outcome = BulkStockOutcome {
        updated: Vec::new(),
        failed: Vec::new(),
    };
    for (id, result) in join_all(updates).await {
        match result {
            Ok(_) => outcome.updated.push(id),
            Err(err) => {
                tracing::warn!(product_id = %id, error = %err, "stock update failed");
                outcome.failed.push((id, err));
            }
        }
    }
    Ok(outcome)
}

/// Products at or below the low-stock threshold, out-of-stock first.
pub fn low_stock(products: &[Product], threshold: i32) -> Vec<Product> {
    let mut low: Vec<Product> = products
        .iter()
        .filter(|p| p.stock <= threshold)
        .cloned()
        .collect();
    low.sort_by_key(|p| p.stock);
    low
}

/// Cancel an order; the backend restores stock for its items. Cancelling an
/// already-cancelled order is rejected locally.
pub async fn cancel_order(api: &ApiClient, order: &Order) -> AppResult<()> {
    if order.status == OrderStatus::Cancelled {
        return Err(AppError::Validation(
            "order is already cancelled".to_string(),
        ));
    }
    api.cancel_order(&order.id).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, stock: i32) -> Product {
        Product {
            id: id.to_string(),
            name: id.to_string(),
            price: 100,
            stock,
            category: String::new(),
            description: String::new(),
            image: String::new(),
        }
    }

    #[test]
    fn low_stock_filters_and_sorts_by_scarcity() {
        let products = vec![product("A", 25), product("B", 0), product("C", 10)];
        let low = low_stock(&products, LOW_STOCK_THRESHOLD);
        let ids: Vec<&str> = low.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["B", "C"]);
    }
}
