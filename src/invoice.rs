//! Read-only invoice view over a completed order: local last-order snapshot
//! or remote lookup, plain-text rendering, file export. No business logic
//! beyond formatting.

use std::path::Path;

use tokio::fs;

use crate::{
    api::ApiClient,
    error::{AppError, AppResult},
    models::Order,
    storage::StateStore,
};

/// Resolve the order to show: by remote id when given, otherwise the local
/// last-order snapshot. "No order found" is the only failure here besides
/// transport errors.
pub async fn load_order(
    store: &StateStore,
    api: &ApiClient,
    order_id: Option<&str>,
) -> AppResult<Order> {
    match order_id {
        Some(id) => api.get_order(id).await,
        None => store.load_last_order().await.ok_or(AppError::NotFound),
    }
}

pub fn render(order: &Order) -> String {
    let mut out = String::new();
    out.push_str("================ INVOICE ================\n");
    out.push_str(&format!("Order ID:       {}\n", order.id));
    out.push_str(&format!("Date:           {}\n", order.date.format("%Y-%m-%d %H:%M UTC")));
    out.push_str(&format!("Customer:       {}\n", order.customer_email));
    out.push_str(&format!("Payment:        {}\n", order.payment_method));
    out.push_str(&format!("Transaction ID: {}\n", order.transaction_id));
    out.push_str(&format!("Status:         {}\n", order.status));
    out.push_str("-----------------------------------------\n");
    for line in &order.items {
        out.push_str(&format!(
            "{:<24} {:>3} x ₹{:<6} ₹{}\n",
            line.product.name,
            line.quantity,
            line.product.price,
            line.line_total(),
        ));
    }
    out.push_str("-----------------------------------------\n");
    out.push_str(&format!("Subtotal:   ₹{}\n", order.total));
    out.push_str(&format!("GST (18%):  ₹{}\n", order.tax));
    out.push_str(&format!("Total:      ₹{}\n", order.final_total));
    out.push_str("=========================================\n");
    out
}

/// Write the rendered invoice to `path`. Export failure is non-fatal and
/// locally recoverable; the order itself is unaffected.
pub async fn export(order: &Order, path: &Path) -> AppResult<()> {
    fs::write(path, render(order)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CartLine, OrderStatus, Product};
    use chrono::Utc;

    fn sample_order() -> Order {
        Order {
            id: "ORD-20260827-ab12cd34".to_string(),
            items: vec![CartLine {
                product: Product {
                    id: "FOOD001".to_string(),
                    name: "Samosa".to_string(),
                    price: 50,
                    stock: 18,
                    category: "food".to_string(),
                    description: String::new(),
                    image: String::new(),
                },
                quantity: 2,
            }],
            total: 100,
            tax: 18,
            final_total: 118,
            payment_method: "Demo Payment".to_string(),
            transaction_id: "TXN-12345678".to_string(),
            status: OrderStatus::Completed,
            currency: "INR".to_string(),
            date: Utc::now(),
            customer_email: "buyer@example.com".to_string(),
        }
    }

    #[test]
    fn render_includes_lines_and_totals() {
        let text = render(&sample_order());
        assert!(text.contains("ORD-20260827-ab12cd34"));
        assert!(text.contains("Samosa"));
        assert!(text.contains("Subtotal:   ₹100"));
        assert!(text.contains("GST (18%):  ₹18"));
        assert!(text.contains("Total:      ₹118"));
        assert!(text.contains("buyer@example.com"));
    }

    #[tokio::test]
    async fn export_writes_the_rendering() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice.txt");
        export(&sample_order(), &path).await.unwrap();
        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(written, render(&sample_order()));
    }
}
