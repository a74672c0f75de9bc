use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pos_checkout::{
    admin,
    api::ApiClient,
    cart::Cart,
    checkout::{Checkout, PaymentInstruction, PaymentMethod},
    config::AppConfig,
    dto::{payment::CheckoutCallback, products::CreateProductRequest},
    error::{AppError, AppResult},
    invoice,
    models::Product,
    stock,
    storage::StateStore,
};

#[derive(Parser)]
#[command(name = "pos", about = "Point-of-sale checkout terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the product catalog
    Products,
    /// Look up a product and add it to the cart
    Scan { code: String },
    /// Show or edit the cart
    Cart {
        #[command(subcommand)]
        action: Option<CartAction>,
    },
    /// Validate stock and pay for the cart
    Checkout(CheckoutArgs),
    /// List orders (admin)
    Orders,
    /// Show one order
    Order { id: String },
    /// Cancel an order and restore its stock
    Cancel { id: String },
    /// Show or export the invoice for the last (or a given) order
    Invoice {
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Admin session and inventory management
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Remove a line
    Remove { product_id: String },
    /// Change a line's quantity
    Qty { product_id: String, quantity: i32 },
    /// Empty the cart
    Clear,
}

#[derive(Args)]
struct CheckoutArgs {
    #[arg(long)]
    email: String,
    /// upi, razorpay or demo
    #[arg(long, default_value = "upi")]
    method: String,
}

#[derive(Subcommand)]
enum AdminAction {
    Login {
        #[arg(long)]
        email: String,
    },
    Logout,
    #[command(flatten)]
    Inventory(InventoryAction),
}

/// Admin actions that require a restored session before dispatch.
#[derive(Subcommand)]
enum InventoryAction {
    AddProduct {
        id: String,
        name: String,
        price: i64,
        stock: i32,
        #[arg(long, default_value = "")]
        category: String,
    },
    SetStock {
        product_id: String,
        stock: i32,
    },
    BulkStock {
        #[arg(long, value_delimiter = ',')]
        ids: Vec<String>,
        stock: i32,
    },
    LowStock,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,pos_checkout=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    let store = StateStore::new(config.state_dir.clone());
    let mut api = ApiClient::new(&config)?;

    if let Err(err) = run(cli.command, &config, &store, &mut api).await {
        eprintln!("error: {}", err.user_message());
        std::process::exit(1);
    }
    Ok(())
}

async fn run(
    command: Command,
    config: &AppConfig,
    store: &StateStore,
    api: &mut ApiClient,
) -> AppResult<()> {
    match command {
        Command::Products => {
            for product in api.list_products().await? {
                print_product(&product);
            }
            Ok(())
        }
        Command::Scan { code } => scan(api, store, &code).await,
        Command::Cart { action } => edit_cart(store, action).await,
        Command::Checkout(args) => run_checkout(api, config, store, args).await,
        Command::Orders => {
            admin::restore_session(api, store).await;
            for order in api.list_orders().await? {
                println!(
                    "{}  {}  ₹{}  {}  {}",
                    order.id, order.date.format("%Y-%m-%d"), order.final_total,
                    order.status, order.customer_email
                );
            }
            Ok(())
        }
        Command::Order { id } => {
            let order = api.get_order(&id).await?;
            print!("{}", invoice::render(&order));
            Ok(())
        }
        Command::Cancel { id } => {
            let order = api.get_order(&id).await?;
            admin::cancel_order(api, &order).await?;
            println!("Order {} cancelled; stock restored.", order.id);
            Ok(())
        }
        Command::Invoice { id, export } => {
            let order = invoice::load_order(store, api, id.as_deref()).await?;
            match export {
                Some(path) => {
                    invoice::export(&order, &path).await?;
                    println!("Invoice written to {}", path.display());
                }
                None => print!("{}", invoice::render(&order)),
            }
            Ok(())
        }
        Command::Admin { action } => run_admin(api, store, action).await,
    }
}

async fn scan(api: &ApiClient, store: &StateStore, code: &str) -> AppResult<()> {
    let mut cart = store.load_cart().await.unwrap_or_default();
    if cart.contains(code) {
        println!("{code} is already in the cart.");
        return Ok(());
    }

    let product = api.get_product(code).await?;
    let check = stock::validate_line(api, &product.id, 1).await?;
    if !check.available {
        return Err(AppError::StockShortfall(vec![check]));
    }

    cart.add_once(product.clone())?;
    store.save_cart(&cart).await?;
    println!("Added {} (₹{}) — {} item(s) in cart.", product.name, product.price, cart.len());
    Ok(())
}

async fn edit_cart(store: &StateStore, action: Option<CartAction>) -> AppResult<()> {
    let mut cart = store.load_cart().await.unwrap_or_default();
    match action {
        None => print_cart(&cart),
        Some(CartAction::Remove { product_id }) => {
            cart.remove(&product_id);
            store.save_cart(&cart).await?;
            print_cart(&cart);
        }
        Some(CartAction::Qty { product_id, quantity }) => {
            cart.set_quantity(&product_id, quantity)?;
            store.save_cart(&cart).await?;
            print_cart(&cart);
        }
        Some(CartAction::Clear) => {
            cart.clear();
            store.save_cart(&cart).await?;
            println!("Cart cleared.");
        }
    }
    Ok(())
}

async fn run_checkout(
    api: &mut ApiClient,
    config: &AppConfig,
    store: &StateStore,
    args: CheckoutArgs,
) -> AppResult<()> {
    let method = match args.method.as_str() {
        "upi" => PaymentMethod::UpiIntent,
        "razorpay" => PaymentMethod::HostedCheckout,
        #[cfg(feature = "demo-payments")]
        "demo" => PaymentMethod::Demo,
        other => {
            return Err(AppError::Validation(format!(
                "unknown payment method: {other}"
            )));
        }
    };

    let mut cart = store.load_cart().await.unwrap_or_default();
    let mut checkout = Checkout::new(api.clone(), store.clone(), config);

    let instruction = checkout.begin(&cart, &args.email, method).await?;
    let order = match instruction {
        PaymentInstruction::UpiIntent { uri, reference, confirm_after } => {
            println!("Open this UPI link to pay (order {reference}):\n  {uri}");
            tokio::time::sleep(confirm_after).await;
            let answer = prompt("Did you complete the UPI payment? [y/N] ")?;
            let paid = matches!(answer.trim(), "y" | "Y" | "yes");
            checkout.report_upi_outcome(&mut cart, paid).await?
        }
        PaymentInstruction::HostedCheckout { payment_order, key_id, reference } => {
            println!(
                "Complete payment in the hosted checkout (key {key_id}, provider order {}, order {reference}).",
                payment_order.id
            );
            let payment_id = prompt("Payment id: ")?;
            let signature = prompt("Signature: ")?;
            checkout
                .confirm_hosted(
                    &mut cart,
                    CheckoutCallback {
                        razorpay_order_id: payment_order.id,
                        razorpay_payment_id: payment_id.trim().to_string(),
                        razorpay_signature: signature.trim().to_string(),
                    },
                )
                .await?
        }
        #[cfg(feature = "demo-payments")]
        PaymentInstruction::Demo { delay, reference } => {
            println!("Simulating payment for order {reference}…");
            tokio::time::sleep(delay).await;
            checkout.confirm_demo(&mut cart).await?
        }
    };

    if let Some(order) = order {
        println!("Payment confirmed. Order {} placed for ₹{}.", order.id, order.final_total);
        println!("Invoice saved; run `pos invoice` to view it.");
    }
    Ok(())
}

async fn run_admin(api: &mut ApiClient, store: &StateStore, action: AdminAction) -> AppResult<()> {
    match action {
        AdminAction::Login { email } => {
            let password = prompt("Password: ")?;
            let profile = admin::login(api, store, &email, password.trim()).await?;
            println!("Logged in as {}.", profile.email);
            Ok(())
        }
        AdminAction::Logout => {
            admin::restore_session(api, store).await;
            admin::logout(api, store).await?;
            println!("Logged out.");
            Ok(())
        }
        AdminAction::Inventory(action) => {
            if admin::restore_session(api, store).await.is_none() {
                return Err(AppError::Unauthorized);
            }
            match action {
                InventoryAction::AddProduct { id, name, price, stock, category } => {
                    let product = admin::add_product(
                        api,
                        CreateProductRequest {
                            id,
                            name,
                            price,
                            stock,
                            category,
                            description: String::new(),
                            image: String::new(),
                        },
                    )
                    .await?;
                    println!("Added product {}.", product.id);
                }
                InventoryAction::SetStock { product_id, stock } => {
                    let product = admin::set_stock(api, &product_id, stock).await?;
                    println!("{} stock set to {}.", product.id, product.stock);
                }
                InventoryAction::BulkStock { ids, stock } => {
                    let outcome = admin::bulk_set_stock(api, &ids, stock).await?;
                    println!("Updated {} product(s).", outcome.updated.len());
                    for (id, err) in &outcome.failed {
                        eprintln!("failed {}: {}", id, err.user_message());
                    }
                }
                InventoryAction::LowStock => {
                    let products = api.list_products().await?;
                    for product in admin::low_stock(&products, admin::LOW_STOCK_THRESHOLD) {
                        print_product(&product);
                    }
                }
            }
            Ok(())
        }
    }
}

fn print_product(product: &Product) {
    println!(
        "{:<10} {:<24} ₹{:<6} stock {}",
        product.id, product.name, product.price, product.stock
    );
}

fn print_cart(cart: &Cart) {
    if cart.is_empty() {
        println!("Cart is empty.");
        return;
    }
    for line in cart.lines() {
        println!(
            "{:<10} {:<24} {} x ₹{} = ₹{}",
            line.product.id, line.product.name, line.quantity,
            line.product.price, line.line_total()
        );
    }
    println!("Subtotal: ₹{}", cart.total());
}

fn prompt(message: &str) -> io::Result<String> {
    print!("{message}");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input)
}
