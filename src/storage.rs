//! Local JSON state under the configured state directory.
//!
//! Three files: the cart session, the last-order snapshot for the invoice
//! view, and the admin session token. Writes replace the whole file, so they
//! are idempotent; reads are shape-validated and a corrupt file is treated as
//! absent.

use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};
use tokio::fs;

use crate::{
    cart::Cart,
    dto::auth::AdminProfile,
    error::AppResult,
    models::Order,
};

const CART_FILE: &str = "cart.json";
const LAST_ORDER_FILE: &str = "last-order.json";
const ADMIN_SESSION_FILE: &str = "admin-session.json";

#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct AdminSession {
    pub token: String,
    pub admin: AdminProfile,
}

#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn load_cart(&self) -> Option<Cart> {
        self.load(CART_FILE).await
    }

    pub async fn save_cart(&self, cart: &Cart) -> AppResult<()> {
        self.save(CART_FILE, cart).await
    }

    pub async fn load_last_order(&self) -> Option<Order> {
        self.load(LAST_ORDER_FILE).await
    }

    pub async fn save_last_order(&self, order: &Order) -> AppResult<()> {
        self.save(LAST_ORDER_FILE, order).await
    }

    pub async fn load_admin_session(&self) -> Option<AdminSession> {
        self.load(ADMIN_SESSION_FILE).await
    }

    pub async fn save_admin_session(&self, session: &AdminSession) -> AppResult<()> {
        self.save(ADMIN_SESSION_FILE, session).await
    }

    pub async fn clear_admin_session(&self) -> AppResult<()> {
        self.delete(ADMIN_SESSION_FILE).await
    }

    async fn load<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let path = self.path(name);
        let raw = fs::read(&path).await.ok()?;
        match serde_json::from_slice(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::debug!(file = %path.display(), error = %err, "discarding malformed state file");
                None
            }
        }
    }

    async fn save<T: Serialize>(&self, name: &str, value: &T) -> AppResult<()> {
        fs::create_dir_all(&self.dir).await?;
        let raw = serde_json::to_vec_pretty(value)
            .map_err(|err| anyhow::anyhow!("state serialization failed: {err}"))?;
        fs::write(self.path(name), raw).await?;
        Ok(())
    }

    async fn delete(&self, name: &str) -> AppResult<()> {
        let path = self.path(name);
        if Path::new(&path).exists() {
            fs::remove_file(path).await?;
        }
        Ok(())
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}
