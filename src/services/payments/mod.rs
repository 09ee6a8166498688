pub mod midtrans;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A Snap-style transaction created at the gateway: the token is what the
/// browser widget consumes.
#[derive(Debug, Clone, Serialize)]
pub struct SnapTransaction {
    pub token: String,
    pub order_id: String,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_transaction(
        &self,
        order_id: &str,
        gross_amount: i64,
        customer_name: &str,
    ) -> anyhow::Result<SnapTransaction>;
}

/// Terminal states of the client-side payment widget. Reported by the
/// browser for logging only; the webhook notification is what actually
/// moves a booking's payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentOutcome {
    Success,
    Pending,
    Error,
    Closed,
}

impl PaymentOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentOutcome::Success => "success",
            PaymentOutcome::Pending => "pending",
            PaymentOutcome::Error => "error",
            PaymentOutcome::Closed => "closed",
        }
    }
}
