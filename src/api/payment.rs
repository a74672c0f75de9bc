use crate::{
    dto::payment::{
        CheckoutCallback, CreatePaymentOrderRequest, PaymentOrder, SendInvoiceRequest,
        VerifyPaymentResponse,
    },
    error::{AppError, AppResult},
    models::Order,
};

use super::ApiClient;

impl ApiClient {
    /// Create a provider-side payment order for the hosted checkout widget.
    pub async fn create_payment_order(
        &self,
        amount: i64,
        receipt: &str,
    ) -> AppResult<PaymentOrder> {
        self.post_json(
            "/payment/create-order",
            &CreatePaymentOrderRequest {
                amount,
                currency: "INR".to_string(),
                receipt: receipt.to_string(),
            },
        )
        .await
    }

    /// Server-side signature verification of a hosted checkout callback.
    /// Anything short of an explicit success is a verification failure.
    pub async fn verify_payment(&self, callback: &CheckoutCallback) -> AppResult<()> {
        let verified: VerifyPaymentResponse = self
            .post_json("/payment/verify", callback)
            .await
            .map_err(|err| match err {
                AppError::Network(_) => err,
                _ => AppError::PaymentVerification,
            })?;
        if !verified.success {
            return Err(AppError::PaymentVerification);
        }
        Ok(())
    }

    pub async fn send_invoice_email(&self, email: &str, order: &Order) -> AppResult<()> {
        let _: serde_json::Value = self
            .post_json(
                "/payment/send-invoice",
                &SendInvoiceRequest {
                    email,
                    order_data: order,
                },
            )
            .await?;
        Ok(())
    }
}
