//! Checkout orchestration: email and stock validation, payment strategy
//! dispatch, confirmed-payment order creation, and the failure taxonomy in
//! between.

use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    api::ApiClient,
    cart::Cart,
    dto::payment::{CheckoutCallback, PaymentOrder},
    error::{AppError, AppResult},
    models::{Order, OrderStatus},
    stock,
    storage::StateStore,
};

/// How long the UPI flow waits before prompting the user to self-report the
/// payment outcome.
pub const UPI_CONFIRM_DELAY: Duration = Duration::from_secs(3);

#[cfg(any(test, feature = "demo-payments"))]
pub const DEMO_PAYMENT_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    /// Redirect-intent payment via a `upi://pay` URI. Completion cannot be
    /// observed programmatically; the user self-reports it.
    UpiIntent,
    /// Hosted checkout widget backed by a server-created payment order and a
    /// signed completion callback.
    HostedCheckout,
    /// Simulated payment that always succeeds after a fixed delay.
    #[cfg(any(test, feature = "demo-payments"))]
    Demo,
}

impl PaymentMethod {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::UpiIntent => "UPI Payment",
            PaymentMethod::HostedCheckout => "Razorpay",
            #[cfg(any(test, feature = "demo-payments"))]
            PaymentMethod::Demo => "Demo Payment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    Idle,
    Validating,
    AwaitingPayment,
    Confirming,
    Succeeded,
    Failed,
}

/// What the caller must do next to move the payment forward.
#[derive(Debug, Clone)]
pub enum PaymentInstruction {
    /// Navigate the user agent to `uri`, then after `confirm_after` ask the
    /// user whether the payment went through.
    UpiIntent {
        uri: String,
        reference: String,
        confirm_after: Duration,
    },
    /// Open the vendor checkout widget for `payment_order` and feed its
    /// completion callback back into the orchestrator.
    HostedCheckout {
        payment_order: PaymentOrder,
        key_id: String,
        reference: String,
    },
    #[cfg(any(test, feature = "demo-payments"))]
    Demo {
        delay: Duration,
        reference: String,
    },
}

/// Drives one checkout attempt through
/// `Idle -> Validating -> AwaitingPayment -> Confirming -> Succeeded | Failed`.
///
/// Terminal states are only left through an explicit [`Checkout::reset`].
/// Payment confirmations arriving after the machine has left
/// `AwaitingPayment` are ignored, so a duplicate or late callback never
/// creates a second order.
#[derive(Debug)]
pub struct Checkout {
    api: ApiClient,
    store: StateStore,
    upi_vpa: String,
    upi_payee: String,
    razorpay_key_id: String,
    state: CheckoutState,
    email: String,
    method: Option<PaymentMethod>,
    reference: Option<String>,
    failure: Option<String>,
}

impl Checkout {
    pub fn new(api: ApiClient, store: StateStore, config: &crate::config::AppConfig) -> Self {
        Self {
            api,
            store,
            upi_vpa: config.upi_vpa.clone(),
            upi_payee: config.upi_payee.clone(),
            razorpay_key_id: config.razorpay_key_id.clone(),
            state: CheckoutState::Idle,
            email: String::new(),
            method: None,
            reference: None,
            failure: None,
        }
    }

    pub fn state(&self) -> CheckoutState {
        self.state
    }

    /// Reason the last attempt failed, in end-user wording.
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Start a checkout attempt: email format check, then live stock
    /// validation, then dispatch to the selected payment strategy. Either
    /// validation failure returns the machine to `Idle` with the error
    /// surfaced; the cart is untouched.
    pub async fn begin(
        &mut self,
        cart: &Cart,
        email: &str,
        method: PaymentMethod,
    ) -> AppResult<PaymentInstruction> {
        if self.state != CheckoutState::Idle {
            return Err(AppError::Validation(
                "a checkout is already in progress; reset it first".to_string(),
            ));
        }
        if cart.is_empty() {
            return Err(AppError::Validation("cart is empty".to_string()));
        }

        self.state = CheckoutState::Validating;

        if let Err(err) = validate_email(email) {
            self.state = CheckoutState::Idle;
            return Err(err);
        }
        if let Err(err) = stock::ensure_cart_available(&self.api, cart).await {
            self.state = CheckoutState::Idle;
            return Err(err);
        }

        let reference = build_order_reference();
        let amount = final_total(cart.total());
        self.email = email.to_string();
        self.method = Some(method);
        self.reference = Some(reference.clone());
        self.failure = None;

        let instruction = match method {
            PaymentMethod::UpiIntent => PaymentInstruction::UpiIntent {
                uri: build_upi_intent(&self.upi_vpa, &self.upi_payee, amount, &reference),
                reference,
                confirm_after: UPI_CONFIRM_DELAY,
            },
            PaymentMethod::HostedCheckout => {
                let payment_order = match self.api.create_payment_order(amount, &reference).await {
                    Ok(order) => order,
                    Err(err) => return Err(self.fail(err)),
                };
                PaymentInstruction::HostedCheckout {
                    payment_order,
                    key_id: self.razorpay_key_id.clone(),
                    reference,
                }
            }
            #[cfg(any(test, feature = "demo-payments"))]
            PaymentMethod::Demo => PaymentInstruction::Demo {
                delay: DEMO_PAYMENT_DELAY,
                reference,
            },
        };

        self.state = CheckoutState::AwaitingPayment;
        tracing::debug!(state = ?self.state, method = method.label(), "payment initiated");
        Ok(instruction)
    }

    /// Self-reported UPI outcome. Ignored (returns `Ok(None)`) unless a
    /// payment is actually awaited.
    pub async fn report_upi_outcome(
        &mut self,
        cart: &mut Cart,
        paid: bool,
    ) -> AppResult<Option<Order>> {
        if self.state != CheckoutState::AwaitingPayment {
            tracing::debug!(state = ?self.state, "ignoring UPI outcome report");
            return Ok(None);
        }
        if !paid {
            return Err(self.fail(AppError::PaymentCancelled));
        }
        let transaction_id = build_transaction_reference();
        self.place_order(cart, transaction_id).await.map(Some)
    }

    /// Hosted checkout completion callback. The signature is verified
    /// server-side before payment counts as confirmed. Duplicate or late
    /// callbacks are ignored.
    pub async fn confirm_hosted(
        &mut self,
        cart: &mut Cart,
        callback: CheckoutCallback,
    ) -> AppResult<Option<Order>> {
        if self.state != CheckoutState::AwaitingPayment {
            tracing::debug!(state = ?self.state, "ignoring duplicate checkout callback");
            return Ok(None);
        }
        if let Err(err) = self.api.verify_payment(&callback).await {
            return Err(self.fail(err));
        }
        self.place_order(cart, callback.razorpay_payment_id)
            .await
            .map(Some)
    }

    /// Simulated payment confirmation. Test/demo builds only.
    #[cfg(any(test, feature = "demo-payments"))]
    pub async fn confirm_demo(&mut self, cart: &mut Cart) -> AppResult<Option<Order>> {
        if self.state != CheckoutState::AwaitingPayment {
            tracing::debug!(state = ?self.state, "ignoring demo confirmation");
            return Ok(None);
        }
        let transaction_id = build_transaction_reference();
        self.place_order(cart, transaction_id).await.map(Some)
    }

    /// Explicit re-entry to `Idle` from a terminal state.
    pub fn reset(&mut self) {
        self.state = CheckoutState::Idle;
        self.email.clear();
        self.method = None;
        self.reference = None;
        self.failure = None;
    }

    async fn place_order(&mut self, cart: &mut Cart, transaction_id: String) -> AppResult<Order> {
        self.state = CheckoutState::Confirming;

        let method = self
            .method
            .ok_or_else(|| anyhow::anyhow!("payment method missing in Confirming state"))?;
        let reference = self
            .reference
            .clone()
            .ok_or_else(|| anyhow::anyhow!("order reference missing in Confirming state"))?;

        let total = cart.total();
        let tax = gst_tax(total);
        let order = Order {
            id: reference,
            items: cart.lines().to_vec(),
            total,
            tax,
            final_total: total + tax,
            payment_method: method.label().to_string(),
            transaction_id,
            status: OrderStatus::Completed,
            currency: "INR".to_string(),
            date: Utc::now(),
            customer_email: self.email.clone(),
        };

        // The backend re-validates stock here; it is the final authority and
        // can fail even though the pre-check passed.
        if let Err(err) = self.api.create_order_with_stock_validation(&order).await {
            return Err(self.fail(as_post_payment_error(err)));
        }

        // Best-effort side effects; the order is already placed remotely.
        if let Err(err) = self.api.send_invoice_email(&self.email, &order).await {
            tracing::warn!(error = %err, "invoice email dispatch failed");
        }
        if let Err(err) = self.store.save_last_order(&order).await {
            tracing::warn!(error = %err, "failed to persist last-order snapshot");
        }

        cart.clear();
        if let Err(err) = self.store.save_cart(cart).await {
            tracing::warn!(error = %err, "failed to persist cleared cart");
        }

        self.state = CheckoutState::Succeeded;
        tracing::debug!(order_id = %order.id, "order placed");
        Ok(order)
    }

    fn fail(&mut self, err: AppError) -> AppError {
        self.state = CheckoutState::Failed;
        self.failure = Some(err.user_message());
        err
    }
}

/// Distinguish "payment succeeded but stock ran out" from generic
/// order-creation failures. This case needs manual reconciliation and must
/// never be silently folded into a retry message.
fn as_post_payment_error(err: AppError) -> AppError {
    match err {
        AppError::StockShortfall(_) => AppError::StockConflictAfterPayment,
        AppError::Api { ref message, .. } => {
            let lower = message.to_lowercase();
            if lower.contains("insufficient stock") || lower.contains("stock changed") {
                AppError::StockConflictAfterPayment
            } else {
                err
            }
        }
        other => other,
    }
}

/// Required, standard-shape address check: one `@`, non-empty local part, a
/// dotted domain, no whitespace.
pub fn validate_email(email: &str) -> AppResult<()> {
    if email.is_empty() {
        return Err(AppError::Validation(
            "Email is required for invoice".to_string(),
        ));
    }
    if !is_valid_email(email) {
        return Err(AppError::Validation(
            "Please enter a valid email address".to_string(),
        ));
    }
    Ok(())
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// 18% GST on the integer subtotal, rounded half-up.
pub fn gst_tax(subtotal: i64) -> i64 {
    (subtotal * 18 + 50) / 100
}

pub fn final_total(subtotal: i64) -> i64 {
    subtotal + gst_tax(subtotal)
}

fn build_upi_intent(vpa: &str, payee: &str, amount: i64, reference: &str) -> String {
    format!("upi://pay?pa={vpa}&pn={payee}&am={amount}&tn=Order {reference}&cu=INR")
}

fn build_order_reference() -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = Uuid::new_v4().to_string();
    format!("ORD-{}-{}", date, &suffix[..8])
}

fn build_transaction_reference() -> String {
    let suffix = Uuid::new_v4().to_string();
    format!("TXN-{}", &suffix[..8])
}
