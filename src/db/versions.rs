//! Document version and edit-record operations

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::edit::TextEdit;
use crate::error::Result;

/// Version record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DocumentVersion {
    pub id: String,
    pub document_id: String,
    pub version_number: i64,
    pub version_name: Option<String>,
    pub stored_filename: String,
    pub file_path: String,
    pub file_size: i64,
    pub total_edits: i64,
    pub edit_summary: Option<String>,
    pub created_at: String,
}

/// Persisted edit record belonging to a version
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DocumentEdit {
    pub id: String,
    pub version_id: String,
    pub page_number: i64,
    pub bbox: String,
    pub old_text: Option<String>,
    pub new_text: Option<String>,
    pub font_size: Option<f64>,
    pub color: Option<String>,
    pub created_at: String,
}

/// Parameters for creating a version record
#[derive(Debug, Clone)]
pub struct NewVersion {
    pub document_id: String,
    pub stored_filename: String,
    pub file_path: String,
    pub file_size: i64,
    pub total_edits: i64,
    pub edit_summary: String,
}

/// Version repository
pub struct VersionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> VersionRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new version. The version number is assigned as
    /// max(existing) + 1 for the document.
    pub async fn create(&self, data: &NewVersion) -> Result<DocumentVersion> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        let (next_number,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(MAX(version_number), 0) + 1 FROM document_versions \
             WHERE document_id = ?",
        )
        .bind(&data.document_id)
        .fetch_one(self.pool)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO document_versions (id, document_id, version_number, version_name,
                                           stored_filename, file_path, file_size, total_edits,
                                           edit_summary, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&data.document_id)
        .bind(next_number)
        .bind(format!("Version {}", next_number))
        .bind(&data.stored_filename)
        .bind(&data.file_path)
        .bind(data.file_size)
        .bind(data.total_edits)
        .bind(&data.edit_summary)
        .bind(&now)
        .execute(self.pool)
        .await?;

        let version = sqlx::query_as::<_, DocumentVersion>(
            "SELECT id, document_id, version_number, version_name, stored_filename, file_path, \
             file_size, total_edits, edit_summary, created_at \
             FROM document_versions WHERE id = ?",
        )
        .bind(&id)
        .fetch_one(self.pool)
        .await?;

        Ok(version)
    }

    /// List versions of a document, newest first
    pub async fn list_for_document(&self, document_id: &str) -> Result<Vec<DocumentVersion>> {
        let versions = sqlx::query_as::<_, DocumentVersion>(
            "SELECT id, document_id, version_number, version_name, stored_filename, file_path, \
             file_size, total_edits, edit_summary, created_at \
             FROM document_versions WHERE document_id = ? ORDER BY version_number DESC",
        )
        .bind(document_id)
        .fetch_all(self.pool)
        .await?;

        Ok(versions)
    }

    /// Record the individual text edits that produced a version.
    ///
    /// The batch is inserted in one transaction; a failure mid-batch
    /// leaves no partial rows behind.
    pub async fn record_edits(&self, version_id: &str, edits: &[TextEdit]) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        for edit in edits {
            let bbox = edit
                .bbox
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(",");

            sqlx::query(
                r#"
                INSERT INTO document_edits (id, version_id, page_number, bbox, old_text,
                                            new_text, font_size, color, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(version_id)
            .bind(edit.page as i64)
            .bind(&bbox)
            .bind(&edit.old_text)
            .bind(&edit.new_text)
            .bind(edit.font_size)
            .bind(&edit.color)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// List edits of a version in insertion order. Batch inserts share
    /// a timestamp, so ordering relies on rowid rather than created_at.
    pub async fn list_edits(&self, version_id: &str) -> Result<Vec<DocumentEdit>> {
        let edits = sqlx::query_as::<_, DocumentEdit>(
            "SELECT id, version_id, page_number, bbox, old_text, new_text, font_size, color, \
             created_at FROM document_edits WHERE version_id = ? ORDER BY rowid",
        )
        .bind(version_id)
        .fetch_all(self.pool)
        .await?;

        Ok(edits)
    }
}
