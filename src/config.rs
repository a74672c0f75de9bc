use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub http_timeout: Duration,
    pub state_dir: PathBuf,
    pub upi_vpa: String,
    pub upi_payee: String,
    pub razorpay_key_id: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_base_url = env::var("POS_API_BASE_URL")?;
        let http_timeout = env::var("POS_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));
        let state_dir = env::var("POS_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".pos-state"));
        let upi_vpa =
            env::var("POS_UPI_VPA").unwrap_or_else(|_| "store@okicici".to_string());
        let upi_payee =
            env::var("POS_UPI_PAYEE").unwrap_or_else(|_| "QR Scanner Store".to_string());
        let razorpay_key_id = env::var("POS_RAZORPAY_KEY_ID").unwrap_or_default();
        Ok(Self {
            api_base_url,
            http_timeout,
            state_dir,
            upi_vpa,
            upi_payee,
            razorpay_key_id,
        })
    }
}
