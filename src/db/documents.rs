//! Document metadata operations

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::Result;

/// Document record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub id: String,
    pub user_id: Option<String>,
    pub original_filename: String,
    pub stored_filename: String,
    pub file_path: String,
    pub file_size: i64,
    pub file_hash: String,
    pub total_pages: i64,
    pub session_id: String,
    pub status: String,
    pub is_active: bool,
    pub uploaded_at: String,
    pub updated_at: String,
}

/// Parameters for creating a document record
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub original_filename: String,
    pub stored_filename: String,
    pub file_path: String,
    pub file_size: i64,
    pub file_hash: String,
    pub total_pages: i64,
    pub session_id: String,
    pub user_id: Option<String>,
}

/// Aggregate storage statistics over active documents
#[derive(Debug, Clone, Serialize)]
pub struct StorageStats {
    pub total_pdfs: i64,
    pub total_versions: i64,
    pub total_storage_bytes: i64,
    pub total_storage_mb: f64,
}

const DOCUMENT_COLUMNS: &str = "id, user_id, original_filename, stored_filename, file_path, \
     file_size, file_hash, total_pages, session_id, status, is_active, uploaded_at, updated_at";

/// Document repository
pub struct DocumentRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> DocumentRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new document record
    pub async fn create(&self, data: &NewDocument) -> Result<Document> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO documents (id, user_id, original_filename, stored_filename, file_path,
                                   file_size, file_hash, total_pages, session_id, status,
                                   is_active, uploaded_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'ready', 1, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&data.user_id)
        .bind(&data.original_filename)
        .bind(&data.stored_filename)
        .bind(&data.file_path)
        .bind(data.file_size)
        .bind(&data.file_hash)
        .bind(data.total_pages)
        .bind(&data.session_id)
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await?;

        self.get(&id).await?.ok_or_else(|| {
            crate::error::AppError::Internal("Failed to fetch created document".to_string())
        })
    }

    /// Get an active document by id
    pub async fn get(&self, id: &str) -> Result<Option<Document>> {
        let document = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ? AND is_active = 1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(document)
    }

    /// Get an active document by upload session id
    pub async fn get_by_session(&self, session_id: &str) -> Result<Option<Document>> {
        let document = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE session_id = ? AND is_active = 1"
        ))
        .bind(session_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(document)
    }

    /// List active documents, newest first, with pagination
    pub async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Document>> {
        let documents = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE is_active = 1 \
             ORDER BY uploaded_at DESC LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(skip)
        .fetch_all(self.pool)
        .await?;

        Ok(documents)
    }

    /// Search active documents by filename substring, newest first
    pub async fn search(&self, query: &str) -> Result<Vec<Document>> {
        let pattern = format!("%{}%", query);
        let documents = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents \
             WHERE is_active = 1 AND original_filename LIKE ? \
             ORDER BY uploaded_at DESC"
        ))
        .bind(&pattern)
        .fetch_all(self.pool)
        .await?;

        Ok(documents)
    }

    /// Soft delete a document. Returns false if no active document matched.
    pub async fn soft_delete(&self, id: &str) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE documents SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1",
        )
        .bind(&now)
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Aggregate statistics over active documents
    pub async fn stats(&self) -> Result<StorageStats> {
        let (total_pdfs,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM documents WHERE is_active = 1")
                .fetch_one(self.pool)
                .await?;

        let (total_versions,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM document_versions v \
             JOIN documents d ON d.id = v.document_id WHERE d.is_active = 1",
        )
        .fetch_one(self.pool)
        .await?;

        let (total_storage,): (Option<i64>,) =
            sqlx::query_as("SELECT SUM(file_size) FROM documents WHERE is_active = 1")
                .fetch_one(self.pool)
                .await?;

        let total_storage_bytes = total_storage.unwrap_or(0);

        Ok(StorageStats {
            total_pdfs,
            total_versions,
            total_storage_bytes,
            total_storage_mb: (total_storage_bytes as f64 / (1024.0 * 1024.0) * 100.0).round()
                / 100.0,
        })
    }
}

#[cfg(test)]
pub(crate) fn sample_document(name: &str, session_id: &str) -> NewDocument {
    NewDocument {
        original_filename: name.to_string(),
        stored_filename: format!("20250101_000000_abc_{}", name),
        file_path: format!("uploads/20250101_000000_abc_{}", name),
        file_size: 12_345,
        file_hash: "deadbeef".to_string(),
        total_pages: 3,
        session_id: session_id.to_string(),
        user_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_create_and_get() {
        let pool = test_pool().await;
        let repo = DocumentRepository::new(&pool);

        let doc = repo
            .create(&sample_document("report.pdf", "session-1"))
            .await
            .unwrap();

        assert_eq!(doc.original_filename, "report.pdf");
        assert_eq!(doc.total_pages, 3);
        assert_eq!(doc.status, "ready");
        assert!(doc.is_active);

        let by_id = repo.get(&doc.id).await.unwrap().unwrap();
        assert_eq!(by_id.id, doc.id);

        let by_session = repo.get_by_session("session-1").await.unwrap().unwrap();
        assert_eq!(by_session.id, doc.id);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_document() {
        let pool = test_pool().await;
        let repo = DocumentRepository::new(&pool);

        let doc = repo
            .create(&sample_document("gone.pdf", "session-2"))
            .await
            .unwrap();

        assert!(repo.soft_delete(&doc.id).await.unwrap());
        assert!(repo.get(&doc.id).await.unwrap().is_none());
        assert!(repo.get_by_session("session-2").await.unwrap().is_none());
        assert!(repo.search("gone").await.unwrap().is_empty());

        // Second delete is a no-op
        assert!(!repo.soft_delete(&doc.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_pagination() {
        let pool = test_pool().await;
        let repo = DocumentRepository::new(&pool);

        for i in 0..5 {
            repo.create(&sample_document(
                &format!("doc{}.pdf", i),
                &format!("session-{}", i),
            ))
            .await
            .unwrap();
        }

        let page = repo.list(0, 3).await.unwrap();
        assert_eq!(page.len(), 3);

        let rest = repo.list(3, 100).await.unwrap();
        assert_eq!(rest.len(), 2);
    }

    #[tokio::test]
    async fn test_search_matches_substring() {
        let pool = test_pool().await;
        let repo = DocumentRepository::new(&pool);

        repo.create(&sample_document("annual-report.pdf", "s1"))
            .await
            .unwrap();
        repo.create(&sample_document("invoice.pdf", "s2"))
            .await
            .unwrap();

        let results = repo.search("report").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].original_filename, "annual-report.pdf");
    }

    #[tokio::test]
    async fn test_stats_ignore_deleted() {
        let pool = test_pool().await;
        let repo = DocumentRepository::new(&pool);

        let kept = repo.create(&sample_document("a.pdf", "s1")).await.unwrap();
        let dropped = repo.create(&sample_document("b.pdf", "s2")).await.unwrap();
        repo.soft_delete(&dropped.id).await.unwrap();

        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.total_pdfs, 1);
        assert_eq!(stats.total_storage_bytes, kept.file_size);
    }
}
