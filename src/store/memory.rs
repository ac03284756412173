/// In-memory document store
///
/// Holds every document in a single ordered map behind a tokio RwLock. Used by
/// the test-suite and for running the engine without a database file.

use crate::error::Result;
use crate::store::{
    ensure_object, merge_documents, normalize_path, split_path, ChangeFeed, ChangeKind, Document,
    DocumentChange, DocumentStore, SetOptions, Subscription,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Debug)]
pub struct MemoryDocumentStore {
    /// Key: normalized document path
    documents: RwLock<BTreeMap<String, Value>>,
    feed: ChangeFeed,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(BTreeMap::new()),
            feed: ChangeFeed::new(),
        }
    }

    /// Number of stored documents
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        let path = normalize_path(path)?;
        Ok(self.documents.read().await.get(&path).cloned())
    }

    async fn set(&self, path: &str, data: Value, options: SetOptions) -> Result<()> {
        let path = normalize_path(path)?;
        ensure_object(&path, &data)?;

        let stored = {
            let mut documents = self.documents.write().await;
            let next = match (options.merge, documents.remove(&path)) {
                (true, Some(mut existing)) => {
                    merge_documents(&mut existing, data);
                    existing
                }
                _ => data,
            };
            documents.insert(path.clone(), next.clone());
            next
        };

        tracing::debug!("💾 Stored document: {} (merge: {})", path, options.merge);
        self.feed.publish(DocumentChange {
            kind: ChangeKind::Set,
            path,
            data: Some(stored),
        });
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<bool> {
        let path = normalize_path(path)?;
        let removed = self.documents.write().await.remove(&path).is_some();
        if removed {
            tracing::debug!("🗑️ Deleted document: {}", path);
            self.feed.publish(DocumentChange {
                kind: ChangeKind::Deleted,
                path,
                data: None,
            });
        }
        Ok(removed)
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>> {
        let collection = normalize_path(collection)?;
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .filter(|(path, _)| split_path(path).0 == collection)
            .map(|(path, data)| Document {
                path: path.clone(),
                id: split_path(path).1.to_string(),
                data: data.clone(),
            })
            .collect())
    }

    fn subscribe(&self, collection: &str) -> Subscription {
        self.feed.subscribe(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_replace_discards_previous_fields() {
        let store = MemoryDocumentStore::new();
        store
            .set("reports/c1", json!({ "content": "v1", "extra": true }), SetOptions::replace())
            .await
            .unwrap();
        store
            .set("reports/c1", json!({ "content": "v2" }), SetOptions::replace())
            .await
            .unwrap();

        assert_eq!(store.get("reports/c1").await.unwrap(), Some(json!({ "content": "v2" })));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn list_returns_direct_children_only() {
        let store = MemoryDocumentStore::new();
        store.set("users/user1", json!({ "expoPushToken": "t1" }), SetOptions::replace()).await.unwrap();
        store.set("users/user1/devices/d1", json!({}), SetOptions::replace()).await.unwrap();
        store.set("users/user4", json!({ "expoPushToken": "t4" }), SetOptions::replace()).await.unwrap();

        let docs = store.list("users").await.unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["user1", "user4"]);
    }

    #[tokio::test]
    async fn subscribers_see_changes_in_their_collection() {
        let store = MemoryDocumentStore::new();
        let mut subscription = store.subscribe("notifications");

        store.set("reports/c1", json!({ "content": "x" }), SetOptions::replace()).await.unwrap();
        store.set("notifications/n1", json!({ "title": "hello" }), SetOptions::replace()).await.unwrap();
        assert!(store.delete("notifications/n1").await.unwrap());

        let first = subscription.next().await.unwrap();
        assert_eq!(first.kind, ChangeKind::Set);
        assert_eq!(first.path, "notifications/n1");
        let second = subscription.next().await.unwrap();
        assert_eq!(second.kind, ChangeKind::Deleted);
        assert!(second.data.is_none());
    }

    #[tokio::test]
    async fn non_object_documents_are_rejected() {
        let store = MemoryDocumentStore::new();
        let err = store.set("reports/c1", json!("text"), SetOptions::replace()).await.unwrap_err();
        assert!(err.to_string().contains("must be a JSON object"));
    }
}
