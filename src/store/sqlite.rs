/// SQLite persistence layer for workflow documents
///
/// Every document is a row keyed by its full path, with the parent collection
/// kept in an indexed column for listing. Bodies are stored as JSON text.

use crate::error::Result;
use crate::store::{
    ensure_object, merge_documents, normalize_path, split_path, ChangeFeed, ChangeKind, Document,
    DocumentChange, DocumentStore, SetOptions, Subscription,
};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool},
    Row,
};
use std::path::Path;

/// Database file created inside the configured data directory
pub const DATABASE_FILE: &str = "canniflow.db";

/// SQLite-backed document store
///
/// Writes use UPSERT so `set` creates or replaces in one statement. Merge writes
/// read the current body inside a transaction before writing the merged result.
#[derive(Debug, Clone)]
pub struct SqliteDocumentStore {
    /// SQLite connection pool for the document database
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl SqliteDocumentStore {
    /// Create store over an existing pool (schema must be initialized separately)
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            feed: ChangeFeed::new(),
        }
    }

    /// Open (or create) `{data_dir}/canniflow.db` and initialize the schema
    pub async fn connect(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir).map_err(|e| {
            crate::error::WorkflowError::PersistenceFailure(format!(
                "Failed to create data directory '{}': {}",
                data_dir.display(),
                e
            ))
        })?;
        let db_path = data_dir.join(DATABASE_FILE);

        tracing::info!("🗄️ Opening document database: {}", db_path.display());

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        let store = Self::new(pool);
        store.init_schema().await?;

        tracing::info!("✅ Document database ready: {}", db_path.display());
        Ok(store)
    }

    /// Initialize the documents table
    ///
    /// Safe to call multiple times (uses IF NOT EXISTS).
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                path TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                data TEXT NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        let path = normalize_path(path)?;
        let row = sqlx::query("SELECT data FROM documents WHERE path = ?")
            .bind(&path)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let data_json: String = row.get("data");
                Ok(Some(serde_json::from_str(&data_json)?))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, path: &str, data: Value, options: SetOptions) -> Result<()> {
        let path = normalize_path(path)?;
        ensure_object(&path, &data)?;
        let collection = split_path(&path).0.to_string();

        let mut tx = self.pool.begin().await?;

        let body = if options.merge {
            let existing = sqlx::query("SELECT data FROM documents WHERE path = ?")
                .bind(&path)
                .fetch_optional(&mut *tx)
                .await?;
            match existing {
                Some(row) => {
                    let data_json: String = row.get("data");
                    let mut current: Value = serde_json::from_str(&data_json)?;
                    merge_documents(&mut current, data);
                    current
                }
                None => data,
            }
        } else {
            data
        };

        sqlx::query(
            r#"
            INSERT INTO documents (path, collection, data, updated_at)
            VALUES (?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(path) DO UPDATE SET
                data = excluded.data,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(&path)
        .bind(&collection)
        .bind(serde_json::to_string(&body)?)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!("💾 Stored document: {} (merge: {})", path, options.merge);
        self.feed.publish(DocumentChange {
            kind: ChangeKind::Set,
            path,
            data: Some(body),
        });
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<bool> {
        let path = normalize_path(path)?;
        let result = sqlx::query("DELETE FROM documents WHERE path = ?")
            .bind(&path)
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected() > 0;
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
        let rows = sqlx::query("SELECT path, data FROM documents WHERE collection = ? ORDER BY path")
            .bind(&collection)
            .fetch_all(&self.pool)
            .await?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let path: String = row.get("path");
            let data_json: String = row.get("data");
            documents.push(Document {
                id: split_path(&path).1.to_string(),
                data: serde_json::from_str(&data_json)?,
                path,
            });
        }

        Ok(documents)
    }

    fn subscribe(&self, collection: &str) -> Subscription {
        self.feed.subscribe(collection)
    }
}
