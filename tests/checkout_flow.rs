//! End-to-end checkout flows against an in-process stub backend.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
};
use tokio::sync::Mutex;

use pos_checkout::{
    admin,
    api::ApiClient,
    cart::Cart,
    checkout::{Checkout, CheckoutState, PaymentMethod},
    config::AppConfig,
    dto::{auth::AdminProfile, payment::CheckoutCallback},
    error::AppError,
    models::{Order, Product, StockCheck, StockValidation},
    storage::{AdminSession, StateStore},
};

const GOOD_SIGNATURE: &str = "valid-sig";
const GOOD_TOKEN: &str = "token-abc123";

#[derive(Default)]
struct Stub {
    products: Mutex<HashMap<String, Product>>,
    orders: Mutex<Vec<Order>>,
    validate_calls: AtomicUsize,
    order_posts: AtomicUsize,
    // When set, the order endpoint reports a shortfall even though the
    // pre-checkout validation passed, simulating a stock race.
    conflict_on_order: AtomicBool,
}

fn product(id: &str, price: i64, stock: i32) -> Product {
    Product {
        id: id.to_string(),
        name: format!("Product {id}"),
        price,
        stock,
        category: "test".to_string(),
        description: String::new(),
        image: String::new(),
    }
}

async fn list_products(State(stub): State<Arc<Stub>>) -> Json<HashMap<String, Product>> {
    Json(stub.products.lock().await.clone())
}

async fn get_product(
    State(stub): State<Arc<Stub>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, StatusCode> {
    stub.products
        .lock()
        .await
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidateItem {
    product_id: String,
    quantity: i32,
}

#[derive(serde::Deserialize)]
struct BulkValidateRequest {
    items: Vec<ValidateItem>,
}

async fn validate_bulk_stock(
    State(stub): State<Arc<Stub>>,
    Json(request): Json<BulkValidateRequest>,
) -> Json<StockValidation> {
    stub.validate_calls.fetch_add(1, Ordering::SeqCst);
    let products = stub.products.lock().await;
    let items: Vec<StockCheck> = request
        .items
        .iter()
        .map(|item| {
            let available_stock = products.get(&item.product_id).map_or(0, |p| p.stock);
            StockCheck {
                product_id: item.product_id.clone(),
                requested_quantity: item.quantity,
                available_stock,
                available: available_stock >= item.quantity,
            }
        })
        .collect();
    Json(StockValidation {
        all_available: items.iter().all(|c| c.available),
        items,
    })
}

async fn validate_single_stock(
    State(stub): State<Arc<Stub>>,
    Json(item): Json<ValidateItem>,
) -> Json<serde_json::Value> {
    let products = stub.products.lock().await;
    let available_stock = products.get(&item.product_id).map_or(0, |p| p.stock);
    Json(serde_json::json!({
        "available": available_stock >= item.quantity,
        "availableStock": available_stock,
    }))
}

async fn create_order(
    State(stub): State<Arc<Stub>>,
    Json(order): Json<Order>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let mut products = stub.products.lock().await;
    let conflict = stub.conflict_on_order.load(Ordering::SeqCst);
    for line in &order.items {
        let stock = products.get(&line.product.id).map_or(0, |p| p.stock);
        if conflict || stock < line.quantity {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "message": format!("Insufficient stock for {}", line.product.id)
                })),
            ));
        }
    }
    for line in &order.items {
        if let Some(p) = products.get_mut(&line.product.id) {
            p.stock -= line.quantity;
        }
    }
    stub.orders.lock().await.push(order);
    stub.order_posts.fetch_add(1, Ordering::SeqCst);
    Ok(Json(serde_json::json!({ "message": "order created" })))
}

async fn create_payment_order(
    Json(request): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "id": "pay_stub_123",
        "amount": request["amount"],
        "currency": "INR",
    }))
}

async fn verify_payment(Json(callback): Json<serde_json::Value>) -> Json<serde_json::Value> {
    let success = callback["razorpay_signature"] == GOOD_SIGNATURE;
    Json(serde_json::json!({ "success": success }))
}

async fn send_invoice() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "sent" }))
}

async fn update_stock(
    State(stub): State<Arc<Stub>>,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<Product>, (StatusCode, Json<serde_json::Value>)> {
    let stock = body["stock"].as_i64().unwrap_or(0) as i32;
    let mut products = stub.products.lock().await;
    match products.get_mut(&id) {
        Some(p) => {
            p.stock = stock;
            Ok(Json(p.clone()))
        }
        None => Err((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "message": "product not found" })),
        )),
    }
}

async fn verify_token(headers: HeaderMap) -> Json<serde_json::Value> {
    let valid = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {GOOD_TOKEN}"))
        .unwrap_or(false);
    Json(serde_json::json!({
        "valid": valid,
        "admin": { "email": "admin@example.com", "name": "Admin" },
    }))
}

async fn start_stub(products: Vec<Product>) -> (Arc<Stub>, String) {
    let stub = Arc::new(Stub {
        products: Mutex::new(products.into_iter().map(|p| (p.id.clone(), p)).collect()),
        ..Stub::default()
    });

    let app = Router::new()
        .route("/products", get(list_products))
        .route("/product/{id}", get(get_product))
        .route("/product/validate-stock", post(validate_single_stock))
        .route("/products/validate-bulk-stock", post(validate_bulk_stock))
        .route("/orders/with-stock-validation", post(create_order))
        .route("/payment/create-order", post(create_payment_order))
        .route("/payment/verify", post(verify_payment))
        .route("/payment/send-invoice", post(send_invoice))
        .route("/product/{id}/stock", put(update_stock))
        .route("/auth/verify", post(verify_token))
        .route(
            "/order/{id}/cancel",
            put(|| async { Json(serde_json::json!({ "message": "cancelled" })) }),
        )
        .with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (stub, format!("http://{addr}"))
}

struct Harness {
    stub: Arc<Stub>,
    api: ApiClient,
    store: StateStore,
    config: AppConfig,
    _dir: tempfile::TempDir,
}

async fn harness(products: Vec<Product>) -> Harness {
    let (stub, base_url) = start_stub(products).await;
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        api_base_url: base_url,
        http_timeout: Duration::from_secs(5),
        state_dir: dir.path().to_path_buf(),
        upi_vpa: "store@okicici".to_string(),
        upi_payee: "QR Scanner Store".to_string(),
        razorpay_key_id: "rzp_test_key".to_string(),
    };
    let api = ApiClient::new(&config).unwrap();
    let store = StateStore::new(config.state_dir.clone());
    Harness {
        stub,
        api,
        store,
        config,
        _dir: dir,
    }
}

#[tokio::test]
async fn demo_payment_places_order_with_gst_and_clears_cart() {
    let h = harness(vec![product("FOOD001", 50, 10)]).await;

    let mut cart = Cart::new();
    let food = h.api.get_product("FOOD001").await.unwrap();
    cart.add_once(food).unwrap();
    cart.set_quantity("FOOD001", 2).unwrap();

    let mut checkout = Checkout::new(h.api.clone(), h.store.clone(), &h.config);
    checkout
        .begin(&cart, "buyer@example.com", PaymentMethod::Demo)
        .await
        .unwrap();
    let order = checkout.confirm_demo(&mut cart).await.unwrap().unwrap();

    assert_eq!(checkout.state(), CheckoutState::Succeeded);
    assert_eq!(order.total, 100);
    assert_eq!(order.tax, 18);
    assert_eq!(order.final_total, 118);
    assert!(cart.is_empty());

    // Backend decremented stock and recorded exactly one order.
    let remaining = h.api.get_product("FOOD001").await.unwrap();
    assert_eq!(remaining.stock, 8);
    assert_eq!(h.stub.order_posts.load(Ordering::SeqCst), 1);

    // Last-order snapshot is available for the invoice view.
    let snapshot = h.store.load_last_order().await.unwrap();
    assert_eq!(snapshot.id, order.id);
    assert_eq!(snapshot.customer_email, "buyer@example.com");
}

#[tokio::test]
async fn shortfall_blocks_checkout_and_leaves_cart_untouched() {
    let h = harness(vec![product("ELEC001", 500, 0)]).await;

    let mut cart = Cart::new();
    cart.add_once(product("ELEC001", 500, 1)).unwrap();

    let mut checkout = Checkout::new(h.api.clone(), h.store.clone(), &h.config);
    let err = checkout
        .begin(&cart, "buyer@example.com", PaymentMethod::Demo)
        .await
        .unwrap_err();

    match err {
        AppError::StockShortfall(items) => {
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].product_id, "ELEC001");
            assert_eq!(items[0].requested_quantity, 1);
            assert_eq!(items[0].available_stock, 0);
        }
        other => panic!("expected StockShortfall, got {other:?}"),
    }

    // Back to Idle for cart editing; nothing was ordered.
    assert_eq!(checkout.state(), CheckoutState::Idle);
    assert_eq!(cart.len(), 1);
    assert_eq!(h.stub.order_posts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn invalid_email_never_reaches_stock_validation_or_payment() {
    let h = harness(vec![product("FOOD001", 50, 10)]).await;

    let mut cart = Cart::new();
    cart.add_once(product("FOOD001", 50, 10)).unwrap();

    let mut checkout = Checkout::new(h.api.clone(), h.store.clone(), &h.config);
    let err = checkout
        .begin(&cart, "not-an-email", PaymentMethod::Demo)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(checkout.state(), CheckoutState::Idle);
    assert_eq!(h.stub.validate_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.stub.order_posts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn duplicate_payment_confirmation_creates_exactly_one_order() {
    let h = harness(vec![product("FOOD001", 50, 10)]).await;

    let mut cart = Cart::new();
    cart.add_once(product("FOOD001", 50, 10)).unwrap();

    let mut checkout = Checkout::new(h.api.clone(), h.store.clone(), &h.config);
    checkout
        .begin(&cart, "buyer@example.com", PaymentMethod::Demo)
        .await
        .unwrap();

    let first = checkout.confirm_demo(&mut cart).await.unwrap();
    assert!(first.is_some());

    // A late or duplicate confirmation is ignored, not reprocessed.
    let second = checkout.confirm_demo(&mut cart).await.unwrap();
    assert!(second.is_none());
    assert_eq!(checkout.state(), CheckoutState::Succeeded);
    assert_eq!(h.stub.order_posts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn hosted_checkout_requires_verified_signature() {
    let h = harness(vec![product("FOOD001", 50, 10)]).await;

    let mut cart = Cart::new();
    cart.add_once(product("FOOD001", 50, 10)).unwrap();

    let mut checkout = Checkout::new(h.api.clone(), h.store.clone(), &h.config);
    checkout
        .begin(&cart, "buyer@example.com", PaymentMethod::HostedCheckout)
        .await
        .unwrap();

    let err = checkout
        .confirm_hosted(
            &mut cart,
            CheckoutCallback {
                razorpay_order_id: "pay_stub_123".to_string(),
                razorpay_payment_id: "pay_abc".to_string(),
                razorpay_signature: "forged".to_string(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::PaymentVerification));
    assert_eq!(checkout.state(), CheckoutState::Failed);
    assert_eq!(h.stub.order_posts.load(Ordering::SeqCst), 0);

    // Explicit retry with a verifiable callback succeeds.
    checkout.reset();
    checkout
        .begin(&cart, "buyer@example.com", PaymentMethod::HostedCheckout)
        .await
        .unwrap();
    let order = checkout
        .confirm_hosted(
            &mut cart,
            CheckoutCallback {
                razorpay_order_id: "pay_stub_123".to_string(),
                razorpay_payment_id: "pay_abc".to_string(),
                razorpay_signature: GOOD_SIGNATURE.to_string(),
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.transaction_id, "pay_abc");
    assert!(cart.is_empty());
}

#[tokio::test]
async fn stock_race_after_payment_is_surfaced_distinctly() {
    let h = harness(vec![product("FOOD001", 50, 10)]).await;

    let mut cart = Cart::new();
    cart.add_once(product("FOOD001", 50, 10)).unwrap();

    let mut checkout = Checkout::new(h.api.clone(), h.store.clone(), &h.config);
    checkout
        .begin(&cart, "buyer@example.com", PaymentMethod::Demo)
        .await
        .unwrap();

    // Stock changes between pre-check and order creation.
    h.stub.conflict_on_order.store(true, Ordering::SeqCst);

    let err = checkout.confirm_demo(&mut cart).await.unwrap_err();
    assert!(matches!(err, AppError::StockConflictAfterPayment));
    assert_eq!(checkout.state(), CheckoutState::Failed);
    assert!(
        checkout
            .failure_reason()
            .unwrap()
            .contains("contact support")
    );
    // The cart survives for reconciliation.
    assert_eq!(cart.len(), 1);
}

#[tokio::test]
async fn upi_self_report_failure_is_retriable() {
    let h = harness(vec![product("FOOD001", 50, 10)]).await;

    let mut cart = Cart::new();
    cart.add_once(product("FOOD001", 50, 10)).unwrap();

    let mut checkout = Checkout::new(h.api.clone(), h.store.clone(), &h.config);
    checkout
        .begin(&cart, "buyer@example.com", PaymentMethod::UpiIntent)
        .await
        .unwrap();

    let err = checkout
        .report_upi_outcome(&mut cart, false)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PaymentCancelled));
    assert!(err.is_retriable());
    assert_eq!(checkout.state(), CheckoutState::Failed);

    checkout.reset();
    checkout
        .begin(&cart, "buyer@example.com", PaymentMethod::UpiIntent)
        .await
        .unwrap();
    let order = checkout
        .report_upi_outcome(&mut cart, true)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.payment_method, "UPI Payment");
    assert!(cart.is_empty());
}

#[tokio::test]
async fn bulk_stock_update_attributes_failures_per_product() {
    let h = harness(vec![product("FOOD001", 50, 2), product("FOOD002", 30, 0)]).await;

    let mut api = h.api.clone();
    api.set_bearer_token(Some(GOOD_TOKEN.to_string()));

    // GONE001 is not in the catalog, so its update fails while the others
    // succeed; the outcome must name each id on the right side.
    let ids = vec![
        "FOOD001".to_string(),
        "GONE001".to_string(),
        "FOOD002".to_string(),
    ];
    let outcome = admin::bulk_set_stock(&api, &ids, 25).await.unwrap();

    assert!(!outcome.all_updated());
    let mut updated = outcome.updated.clone();
    updated.sort();
    assert_eq!(updated, vec!["FOOD001", "FOOD002"]);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].0, "GONE001");
    assert!(matches!(outcome.failed[0].1, AppError::NotFound));

    // The successful updates actually landed.
    assert_eq!(api.get_product("FOOD001").await.unwrap().stock, 25);
    assert_eq!(api.get_product("FOOD002").await.unwrap().stock, 25);
}

#[tokio::test]
async fn stale_admin_token_is_cleared_on_restore() {
    let h = harness(vec![]).await;

    h.store
        .save_admin_session(&AdminSession {
            token: "stale-token".to_string(),
            admin: AdminProfile {
                email: "admin@example.com".to_string(),
                name: String::new(),
            },
        })
        .await
        .unwrap();

    let mut api = h.api.clone();
    assert!(admin::restore_session(&mut api, &h.store).await.is_none());
    assert!(api.bearer_token().is_none());
    assert!(h.store.load_admin_session().await.is_none());
}

#[tokio::test]
async fn network_failure_during_verify_keeps_admin_session() {
    // A bound-then-dropped listener gives an address that refuses
    // connections, so token verification fails with a transport error.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        api_base_url: format!("http://{dead_addr}"),
        http_timeout: Duration::from_secs(2),
        state_dir: dir.path().to_path_buf(),
        upi_vpa: "store@okicici".to_string(),
        upi_payee: "QR Scanner Store".to_string(),
        razorpay_key_id: "rzp_test_key".to_string(),
    };
    let store = StateStore::new(config.state_dir.clone());
    let mut api = ApiClient::new(&config).unwrap();

    store
        .save_admin_session(&AdminSession {
            token: GOOD_TOKEN.to_string(),
            admin: AdminProfile {
                email: "admin@example.com".to_string(),
                name: String::new(),
            },
        })
        .await
        .unwrap();

    let profile = admin::restore_session(&mut api, &store).await;
    assert_eq!(profile.unwrap().email, "admin@example.com");
    assert!(api.bearer_token().is_some());
    assert!(store.load_admin_session().await.is_some());
}
