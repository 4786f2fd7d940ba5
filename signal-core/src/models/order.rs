use serde::{Deserialize, Serialize};

/// Checkout payload from the pharmacy screen. Accepted and logged, not stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub items: Vec<serde_json::Value>,
    pub total: f64,
    pub payment_method: String,
}
