use thiserror::Error;

use crate::models::StockCheck;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Stock shortfall for {} item(s)", .0.len())]
    StockShortfall(Vec<StockCheck>),

    #[error("Payment was cancelled")]
    PaymentCancelled,

    #[error("Payment verification failed")]
    PaymentVerification,

    #[error("Stock changed after payment was taken")]
    StockConflictAfterPayment,

    #[error("Backend returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response shape")]
    Decode(#[source] reqwest::Error),

    #[error("Network error")]
    Network(#[from] reqwest::Error),

    #[error("Local state error")]
    Storage(#[from] std::io::Error),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True when re-running the same action without any user correction can
    /// reasonably succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            AppError::Network(_)
                | AppError::PaymentCancelled
                | AppError::PaymentVerification
                | AppError::Api { .. }
        )
    }

    /// Human-readable message for end users. Payment-path failures never leak
    /// raw technical detail.
    pub fn user_message(&self) -> String {
        match self {
            AppError::NotFound => "Not found.".into(),
            AppError::Unauthorized => "Admin session expired. Please log in again.".into(),
            AppError::Validation(msg) => msg.clone(),
            AppError::StockShortfall(items) => {
                let detail: Vec<String> = items
                    .iter()
                    .filter(|c| !c.available)
                    .map(|c| {
                        format!(
                            "{}: requested {}, available {}",
                            c.product_id, c.requested_quantity, c.available_stock
                        )
                    })
                    .collect();
                format!(
                    "Some items are no longer available in the requested quantities ({})",
                    detail.join("; ")
                )
            }
            AppError::PaymentCancelled => {
                "Payment was cancelled or failed. Please try again.".into()
            }
            AppError::PaymentVerification => {
                "Payment verification failed. Please contact support.".into()
            }
            AppError::StockConflictAfterPayment => {
                "Some items ran out of stock after your payment. The order was not placed. \
                 Please contact support for reconciliation."
                    .into()
            }
            AppError::Api { .. } | AppError::Decode(_) | AppError::Internal(_) => {
                "Something went wrong. Please try again.".into()
            }
            AppError::Network(_) => {
                "Network error. Please check your connection and try again.".into()
            }
            AppError::Storage(_) => "Could not read or write local state.".into(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
