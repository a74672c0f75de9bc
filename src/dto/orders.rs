use serde::Deserialize;

/// Acknowledgement body for order creation and cancellation. The backend may
/// echo the order or just a message; only `message` is relied upon.
#[derive(Debug, Deserialize)]
pub struct OrderAck {
    #[serde(default)]
    pub message: String,
}
