/// Document Store Layer
///
/// Key-path document database used by the workflow. Paths are slash-separated
/// (`request/<email>/<id>/Block A`); a document's collection is everything before
/// its last segment. Two adapters are provided:
/// - In-memory store for tests and embedded use
/// - SQLite store (sqlx) used by the server

use crate::error::{Result, WorkflowError};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

// In-memory adapter guarded by a tokio RwLock
pub mod memory;

// SQLite adapter storing documents as JSON rows
pub mod sqlite;

pub use memory::MemoryDocumentStore;
pub use sqlite::SqliteDocumentStore;

/// Options for a `set` call
#[derive(Debug, Clone, Copy, Default)]
pub struct SetOptions {
    /// Merge into the existing document instead of replacing it
    pub merge: bool,
}

impl SetOptions {
    pub fn replace() -> Self {
        Self { merge: false }
    }

    pub fn merge() -> Self {
        Self { merge: true }
    }
}

/// A stored document together with its location
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    /// Full document path
    pub path: String,
    /// Last path segment
    pub id: String,
    /// Document body (always a JSON object)
    pub data: Value,
}

/// What happened to a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Set,
    Deleted,
}

/// One change delivered to subscribers
#[derive(Debug, Clone)]
pub struct DocumentChange {
    pub kind: ChangeKind,
    pub path: String,
    /// Document body after the change; `None` for deletions
    pub data: Option<Value>,
}

impl DocumentChange {
    pub fn collection(&self) -> &str {
        split_path(&self.path).0
    }
}

/// Persistence capability consumed by the workflow engine
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document by path
    async fn get(&self, path: &str) -> Result<Option<Value>>;

    /// Write a document, replacing or merging according to `options`
    async fn set(&self, path: &str, data: Value, options: SetOptions) -> Result<()>;

    /// Delete a document; returns whether it existed
    async fn delete(&self, path: &str) -> Result<bool>;

    /// List the documents directly inside a collection, ordered by path
    async fn list(&self, collection: &str) -> Result<Vec<Document>>;

    /// Subscribe to changes of documents directly inside a collection
    fn subscribe(&self, collection: &str) -> Subscription;
}

/// Live view of changes to one collection
pub struct Subscription {
    collection: String,
    receiver: broadcast::Receiver<DocumentChange>,
}

impl Subscription {
    /// Wait for the next change in the subscribed collection
    ///
    /// Returns `None` once the store has been dropped. Lagged receivers skip the
    /// changes they missed and keep listening.
    pub async fn next(&mut self) -> Option<DocumentChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) if change.collection() == self.collection => return Some(change),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("⚠️ Subscription to '{}' lagged, skipped {} changes", self.collection, skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Broadcast feed shared by the store adapters
#[derive(Debug, Clone)]
pub(crate) struct ChangeFeed {
    sender: broadcast::Sender<DocumentChange>,
}

impl ChangeFeed {
    pub(crate) fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    pub(crate) fn publish(&self, change: DocumentChange) {
        // No subscribers is not an error
        let _ = self.sender.send(change);
    }

    pub(crate) fn subscribe(&self, collection: &str) -> Subscription {
        Subscription {
            collection: normalize_path(collection).unwrap_or_default(),
            receiver: self.sender.subscribe(),
        }
    }
}

/// Trim surrounding slashes and reject empty segments
pub(crate) fn normalize_path(path: &str) -> Result<String> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() || trimmed.split('/').any(|segment| segment.is_empty()) {
        return Err(WorkflowError::PersistenceFailure(format!(
            "invalid document path '{}'",
            path
        )));
    }
    Ok(trimmed.to_string())
}

/// Split a normalized path into (collection, id)
pub(crate) fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    }
}

/// Deep-merge `patch` into `base`; nested objects merge, everything else replaces
pub(crate) fn merge_documents(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                match base_map.get_mut(&key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        merge_documents(existing, value)
                    }
                    _ => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, patch) => *base = patch,
    }
}

/// Documents must be JSON objects
pub(crate) fn ensure_object(path: &str, data: &Value) -> Result<()> {
    if data.is_object() {
        Ok(())
    } else {
        Err(WorkflowError::PersistenceFailure(format!(
            "document '{}' must be a JSON object",
            path
        )))
    }
}
