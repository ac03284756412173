/// Notification Layer
///
/// Push delivery to the next role in the chain plus the canonical notification
/// stream each role reads its inbox from:
/// - `PushGateway` trait with the Expo HTTP adapter
/// - `NotificationInbox` over the document store

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Expo-style HTTP push relay client
pub mod expo;

// Canonical notification stream (one document per dispatch)
pub mod inbox;

pub use expo::ExpoPushGateway;
pub use inbox::{NotificationInbox, NotificationRecord};

/// Payload handed to the push relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    /// Recipient push token
    pub to: String,
    pub title: String,
    pub body: String,
    /// Routing data for the receiving client (always carries `path`)
    pub data: Value,
}

/// Best-effort push delivery; one call per dispatch, no retries
#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Deliver one message. Any failure is `NotificationUndeliverable`.
    async fn send(&self, message: &PushMessage) -> Result<()>;
}

/// Outcome of the notification side effect of a transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Delivery {
    Delivered,
    Undeliverable { reason: String },
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Delivered)
    }
}
