use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Read-only snapshot of a catalog product. The remote catalog owns the
/// record; `stock` here reflects the moment it was fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: i64,
    #[serde(deserialize_with = "non_negative_stock")]
    pub stock: i32,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
}

/// One cart entry. Keyed by `product.id`; at most one line per product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub product: Product,
    #[serde(deserialize_with = "positive_quantity")]
    pub quantity: i32,
}

fn non_negative_stock<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let stock = i32::deserialize(deserializer)?;
    if stock < 0 {
        return Err(serde::de::Error::custom("stock cannot be negative"));
    }
    Ok(stock)
}

fn positive_quantity<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let quantity = i32::deserialize(deserializer)?;
    if quantity < 1 {
        return Err(serde::de::Error::custom("quantity must be at least 1"));
    }
    Ok(quantity)
}

impl CartLine {
    pub fn line_total(&self) -> i64 {
        self.product.price * i64::from(self.quantity)
    }
}

/// Per-product result of a pre-checkout stock check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockCheck {
    pub product_id: String,
    pub requested_quantity: i32,
    pub available_stock: i32,
    pub available: bool,
}

/// Aggregate bulk validation result. Computed fresh per checkout attempt,
/// never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockValidation {
    pub all_available: bool,
    pub items: Vec<StockCheck>,
}

impl StockValidation {
    pub fn shortfalls(&self) -> Vec<StockCheck> {
        self.items.iter().filter(|c| !c.available).cloned().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// An order as created at payment confirmation. The backend owns the record;
/// the client keeps only a local last-order snapshot for the invoice view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub items: Vec<CartLine>,
    pub total: i64,
    pub tax: i64,
    pub final_total: i64,
    pub payment_method: String,
    pub transaction_id: String,
    pub status: OrderStatus,
    pub currency: String,
    pub date: DateTime<Utc>,
    pub customer_email: String,
}
