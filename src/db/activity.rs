//! Activity log operations

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::Result;

/// Activity log entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActivityEntry {
    pub id: String,
    pub user_id: Option<String>,
    pub document_id: Option<String>,
    pub action: String,
    pub details: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: String,
}

/// Activity log repository
pub struct ActivityRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ActivityRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Append a log entry. Details are stored as JSON.
    pub async fn log(
        &self,
        action: &str,
        details: serde_json::Value,
        document_id: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_log (id, user_id, document_id, action, details, ip_address, created_at)
            VALUES (?, NULL, ?, ?, ?, NULL, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(document_id)
        .bind(action)
        .bind(details.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Fetch recent log entries, newest first, optionally scoped to a document
    pub async fn recent(
        &self,
        document_id: Option<&str>,
        limit: i64,
    ) -> Result<Vec<ActivityEntry>> {
        let entries = match document_id {
            Some(doc_id) => {
                sqlx::query_as::<_, ActivityEntry>(
                    "SELECT id, user_id, document_id, action, details, ip_address, created_at \
                     FROM activity_log WHERE document_id = ? ORDER BY created_at DESC LIMIT ?",
                )
                .bind(doc_id)
                .bind(limit)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ActivityEntry>(
                    "SELECT id, user_id, document_id, action, details, ip_address, created_at \
                     FROM activity_log ORDER BY created_at DESC LIMIT ?",
                )
                .bind(limit)
                .fetch_all(self.pool)
                .await?
            }
        };

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use serde_json::json;

    #[tokio::test]
    async fn test_log_and_recent() {
        let pool = test_pool().await;
        let repo = ActivityRepository::new(&pool);

        repo.log("upload", json!({"filename": "a.pdf", "pages": 3}), Some("doc-1"))
            .await
            .unwrap();
        repo.log("delete", json!({"pdf_id": "doc-2"}), Some("doc-2"))
            .await
            .unwrap();

        let all = repo.recent(None, 50).await.unwrap();
        assert_eq!(all.len(), 2);

        let scoped = repo.recent(Some("doc-1"), 50).await.unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].action, "upload");
        assert!(scoped[0].details.as_deref().unwrap().contains("a.pdf"));
    }

    #[tokio::test]
    async fn test_recent_respects_limit() {
        let pool = test_pool().await;
        let repo = ActivityRepository::new(&pool);

        for i in 0..5 {
            repo.log("upload", json!({ "n": i }), None).await.unwrap();
        }

        let entries = repo.recent(None, 3).await.unwrap();
        assert_eq!(entries.len(), 3);
    }
}
