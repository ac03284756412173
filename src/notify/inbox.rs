/// Notification inbox
///
/// Every dispatch appends one document to `notifications`. A role reads its
/// pending notifications and consumes each one (read once, then deleted).

use crate::directory::Role;
use crate::error::{Result, WorkflowError};
use crate::store::{DocumentStore, SetOptions, Subscription};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const NOTIFICATION_COLLECTION: &str = "notifications";

/// One routed notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: String,
    pub title: String,
    pub body: String,
    /// Case path the notification refers to
    pub path: String,
    pub target_role: Role,
    pub created_at: DateTime<Utc>,
}

impl NotificationRecord {
    pub fn new(title: impl Into<String>, body: impl Into<String>, path: impl Into<String>, target_role: Role) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            title: title.into(),
            body: body.into(),
            path: path.into(),
            target_role,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone)]
pub struct NotificationInbox {
    store: Arc<dyn DocumentStore>,
}

impl NotificationInbox {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn append(&self, record: &NotificationRecord) -> Result<()> {
        let path = format!("{}/{}", NOTIFICATION_COLLECTION, record.id);
        self.store
            .set(&path, serde_json::to_value(record)?, SetOptions::replace())
            .await
    }

    /// Pending notifications for a role, oldest first
    pub async fn for_role(&self, role: Role) -> Result<Vec<NotificationRecord>> {
        let mut records = Vec::new();
        for document in self.store.list(NOTIFICATION_COLLECTION).await? {
            let record: NotificationRecord = serde_json::from_value(document.data)?;
            if record.target_role == role {
                records.push(record);
            }
        }
        records.sort_by_key(|record| record.created_at);
        Ok(records)
    }

    /// Read a notification once and remove it from the stream
    pub async fn consume(&self, id: &str) -> Result<NotificationRecord> {
        let path = format!("{}/{}", NOTIFICATION_COLLECTION, id);
        let value = self
            .store
            .get(&path)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("notification {}", id)))?;
        let record: NotificationRecord = serde_json::from_value(value)?;
        self.store.delete(&path).await?;

        tracing::debug!("📭 Consumed notification {} for {}", id, record.target_role);
        Ok(record)
    }

    /// Live feed of the notification stream
    pub fn subscribe(&self) -> Subscription {
        self.store.subscribe(NOTIFICATION_COLLECTION)
    }
}
