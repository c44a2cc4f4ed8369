//! Extracted page cache operations

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::Result;
use crate::pdf::TextBlock;

/// Cached page record. `text_blocks` is stored as a JSON array.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DocumentPage {
    pub id: String,
    pub document_id: String,
    pub page_number: i64,
    pub width: i64,
    pub height: i64,
    pub thumbnail_path: Option<String>,
    pub text_blocks: Option<String>,
    pub created_at: String,
}

impl DocumentPage {
    /// Decode the cached text blocks, tolerating missing/empty cache
    pub fn decoded_text_blocks(&self) -> Result<Vec<TextBlock>> {
        match self.text_blocks.as_deref() {
            None | Some("") => Ok(Vec::new()),
            Some(json) => Ok(serde_json::from_str(json)?),
        }
    }
}

/// Page repository
pub struct PageRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PageRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a page record with its cached text blocks
    pub async fn create(
        &self,
        document_id: &str,
        page_number: i64,
        width: i64,
        height: i64,
        thumbnail_path: Option<&str>,
        text_blocks: &[TextBlock],
    ) -> Result<DocumentPage> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let blocks_json = serde_json::to_string(text_blocks)?;

        sqlx::query(
            r#"
            INSERT INTO document_pages (id, document_id, page_number, width, height,
                                        thumbnail_path, text_blocks, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(document_id)
        .bind(page_number)
        .bind(width)
        .bind(height)
        .bind(thumbnail_path)
        .bind(&blocks_json)
        .bind(&now)
        .execute(self.pool)
        .await?;

        let page = sqlx::query_as::<_, DocumentPage>(
            "SELECT id, document_id, page_number, width, height, thumbnail_path, text_blocks, \
             created_at FROM document_pages WHERE id = ?",
        )
        .bind(&id)
        .fetch_one(self.pool)
        .await?;

        Ok(page)
    }

    /// List pages of a document in page order
    pub async fn list_for_document(&self, document_id: &str) -> Result<Vec<DocumentPage>> {
        let pages = sqlx::query_as::<_, DocumentPage>(
            "SELECT id, document_id, page_number, width, height, thumbnail_path, text_blocks, \
             created_at FROM document_pages WHERE document_id = ? ORDER BY page_number",
        )
        .bind(document_id)
        .fetch_all(self.pool)
        .await?;

        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::documents::{sample_document, DocumentRepository};
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_create_and_list_pages() {
        let pool = test_pool().await;
        let doc = DocumentRepository::new(&pool)
            .create(&sample_document("paged.pdf", "s1"))
            .await
            .unwrap();

        let repo = PageRepository::new(&pool);
        let blocks = vec![TextBlock {
            text: "Hello".to_string(),
            bbox: [10.0, 20.0, 110.0, 35.0],
            font_size: 12.0,
        }];

        // Insert out of order to verify ordering
        repo.create(&doc.id, 1, 1224, 1584, Some("thumbs/p1.png"), &[])
            .await
            .unwrap();
        repo.create(&doc.id, 0, 1224, 1584, Some("thumbs/p0.png"), &blocks)
            .await
            .unwrap();

        let pages = repo.list_for_document(&doc.id).await.unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page_number, 0);
        assert_eq!(pages[1].page_number, 1);

        let decoded = pages[0].decoded_text_blocks().unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].text, "Hello");
        assert!(pages[1].decoded_text_blocks().unwrap().is_empty());
    }
}
