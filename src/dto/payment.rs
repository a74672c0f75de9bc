use serde::{Deserialize, Serialize};

use crate::models::Order;

#[derive(Debug, Serialize)]
pub struct CreatePaymentOrderRequest {
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

/// Provider-side payment order backing the hosted checkout widget.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

/// Asynchronous completion callback from the hosted checkout widget. The
/// signature must pass server-side verification before payment counts as
/// confirmed.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutCallback {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendInvoiceRequest<'a> {
    pub email: &'a str,
    pub order_data: &'a Order,
}
