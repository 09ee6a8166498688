use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use super::{PaymentProvider, SnapTransaction};

pub struct MidtransProvider {
    server_key: String,
    snap_url: String,
    client: reqwest::Client,
}

impl MidtransProvider {
    pub fn new(server_key: String, snap_url: String) -> Self {
        Self {
            server_key,
            snap_url,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct SnapResponse {
    token: String,
}

#[async_trait]
impl PaymentProvider for MidtransProvider {
    async fn create_transaction(
        &self,
        order_id: &str,
        gross_amount: i64,
        customer_name: &str,
    ) -> anyhow::Result<SnapTransaction> {
        let body = serde_json::json!({
            "transaction_details": {
                "order_id": order_id,
                "gross_amount": gross_amount,
            },
            "customer_details": {
                "first_name": customer_name,
            },
        });

        let response: SnapResponse = self
            .client
            .post(&self.snap_url)
            .basic_auth(&self.server_key, Some(""))
            .json(&body)
            .send()
            .await
            .context("failed to reach payment gateway")?
            .error_for_status()
            .context("payment gateway returned error")?
            .json()
            .await
            .context("failed to decode snap response")?;

        Ok(SnapTransaction {
            token: response.token,
            order_id: order_id.to_string(),
        })
    }
}
