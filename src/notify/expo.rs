/// Expo push relay client
///
/// One JSON POST per message: `{ to, sound, title, body, data }`. A 2xx status is
/// a successful hand-off; every other status or transport error is reported as
/// undeliverable.

use crate::error::{Result, WorkflowError};
use crate::notify::{PushGateway, PushMessage};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

/// Public Expo push endpoint
pub const DEFAULT_PUSH_ENDPOINT: &str = "https://exp.host/--/api/v2/push/send";

#[derive(Debug, Clone)]
pub struct ExpoPushGateway {
    client: reqwest::Client,
    endpoint: String,
}

impl ExpoPushGateway {
    /// Create gateway posting to `endpoint` with a per-request timeout
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build push HTTP client: {}", e))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PushGateway for ExpoPushGateway {
    async fn send(&self, message: &PushMessage) -> Result<()> {
        tracing::debug!("🌍 Push request: POST {} (to: {})", self.endpoint, message.to);

        let body = json!({
            "to": message.to,
            "sound": "default",
            "title": message.title,
            "body": message.body,
            "data": message.data,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| WorkflowError::NotificationUndeliverable(format!("push request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!("📡 Push relay rejected message: {} {}", status, detail);
            return Err(WorkflowError::NotificationUndeliverable(format!(
                "push relay returned {}",
                status.as_u16()
            )));
        }

        tracing::info!("✅ Push delivered to relay (status: {})", status);
        Ok(())
    }
}
