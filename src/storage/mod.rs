//! Local filesystem storage
//!
//! Originals land in the upload directory, edited versions in the
//! output directory, page thumbnails in the thumbnail directory. All
//! three are also served statically, so stored names double as URL
//! path segments.

use std::io;
use std::path::PathBuf;

use chrono::Local;

use crate::config::StorageConfig;

/// Handle to the three content directories
#[derive(Debug, Clone)]
pub struct FileStore {
    config: StorageConfig,
}

impl FileStore {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn max_file_size(&self) -> u64 {
        self.config.max_file_size
    }

    /// Persist an uploaded original. Returns the stored filename and
    /// its full path.
    pub async fn save_upload(
        &self,
        session_id: &str,
        original_filename: &str,
        bytes: &[u8],
    ) -> io::Result<(String, PathBuf)> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let session_prefix = &session_id[..session_id.len().min(8)];
        let stored = format!(
            "{timestamp}_{session_prefix}_{}",
            sanitize_filename(original_filename)
        );

        let path = self.config.upload_dir.join(&stored);
        tokio::fs::write(&path, bytes).await?;
        Ok((stored, path))
    }

    /// Persist an edited version. Returns the output filename and its
    /// full path.
    pub async fn save_output(
        &self,
        original_filename: &str,
        bytes: &[u8],
    ) -> io::Result<(String, PathBuf)> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let name = format!(
            "edited_{timestamp}_{}",
            sanitize_filename(original_filename)
        );

        let path = self.config.output_dir.join(&name);
        tokio::fs::write(&path, bytes).await?;
        Ok((name, path))
    }

    /// Persist a page thumbnail. Returns the path recorded in the
    /// database, relative to the static mount.
    pub async fn save_thumbnail(
        &self,
        session_id: &str,
        page_num: usize,
        png: &[u8],
    ) -> io::Result<String> {
        let name = format!("{session_id}_page_{page_num}.png");
        let path = self.config.thumbnail_dir.join(&name);
        tokio::fs::write(&path, png).await?;
        Ok(format!("/thumbnails/{name}"))
    }

    pub fn upload_path(&self, stored_filename: &str) -> PathBuf {
        self.config.upload_dir.join(stored_filename)
    }

    pub async fn read_upload(&self, stored_filename: &str) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.upload_path(stored_filename)).await
    }

    pub async fn upload_exists(&self, stored_filename: &str) -> bool {
        tokio::fs::try_exists(self.upload_path(stored_filename))
            .await
            .unwrap_or(false)
    }
}

/// Strip path components and anything shells or URLs would trip over.
/// Keeps alphanumerics, dots, dashes, and underscores.
pub fn sanitize_filename(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches(['.', '_']).is_empty() {
        "document.pdf".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store(tmp: &tempfile::TempDir) -> FileStore {
        let config = StorageConfig {
            upload_dir: tmp.path().join("uploads"),
            output_dir: tmp.path().join("outputs"),
            thumbnail_dir: tmp.path().join("thumbnails"),
            max_file_size: 1024 * 1024,
        };
        config.ensure_dirs().unwrap();
        FileStore::new(config)
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("report.pdf"), "report.pdf");
        assert_eq!(sanitize_filename("my report (2).pdf"), "my_report__2_.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\docs\\file.pdf"), "file.pdf");
        assert_eq!(sanitize_filename("..."), "document.pdf");
    }

    #[tokio::test]
    async fn test_save_upload_prefixes_session() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = test_store(&tmp);

        let (stored, path) = store
            .save_upload("abcdef12-3456-7890", "contract.pdf", b"%PDF-1.5 fake")
            .await
            .unwrap();

        assert!(stored.contains("abcdef12"));
        assert!(stored.ends_with("_contract.pdf"));
        assert!(path.is_file());
        assert_eq!(store.read_upload(&stored).await.unwrap(), b"%PDF-1.5 fake");
        assert!(store.upload_exists(&stored).await);
        assert!(!store.upload_exists("nope.pdf").await);
    }

    #[tokio::test]
    async fn test_save_output_marks_edited() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = test_store(&tmp);

        let (name, path) = store.save_output("contract.pdf", b"bytes").await.unwrap();
        assert!(name.starts_with("edited_"));
        assert!(name.ends_with("_contract.pdf"));
        assert!(path.is_file());
    }

    #[tokio::test]
    async fn test_save_thumbnail_returns_served_path() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = test_store(&tmp);

        let served = store
            .save_thumbnail("sess-1", 0, b"\x89PNG")
            .await
            .unwrap();

        assert_eq!(served, "/thumbnails/sess-1_page_0.png");
        assert!(tmp.path().join("thumbnails/sess-1_page_0.png").is_file());
    }
}
