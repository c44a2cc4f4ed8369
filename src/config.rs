//! Configuration management for the Redline server

use std::env;
use std::path::PathBuf;

use serde::Deserialize;

/// Default upload limit: 50 MB
const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Filesystem layout for binary content.
///
/// Uploads hold the original PDFs, outputs hold edited versions,
/// thumbnails hold per-page preview images.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
    pub thumbnail_dir: PathBuf,
    pub max_file_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            database: DatabaseConfig {
                url: "sqlite:./redline.db".to_string(),
            },
            storage: StorageConfig {
                upload_dir: PathBuf::from("uploads"),
                output_dir: PathBuf::from("outputs"),
                thumbnail_dir: PathBuf::from("thumbnails"),
                max_file_size: DEFAULT_MAX_FILE_SIZE,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .unwrap_or(8000),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./redline.db".to_string()),
            },
            storage: StorageConfig {
                upload_dir: env::var("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("uploads")),
                output_dir: env::var("OUTPUT_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("outputs")),
                thumbnail_dir: env::var("THUMBNAIL_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("thumbnails")),
                max_file_size: env::var("MAX_FILE_SIZE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_MAX_FILE_SIZE),
            },
        })
    }
}

impl StorageConfig {
    /// Create the storage directories if they do not exist yet.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [&self.upload_dir, &self.output_dir, &self.thumbnail_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.storage.max_file_size, 50 * 1024 * 1024);
        assert_eq!(config.storage.upload_dir, PathBuf::from("uploads"));
    }

    #[test]
    fn test_ensure_dirs() {
        let tmp = tempfile::TempDir::new().unwrap();
        let storage = StorageConfig {
            upload_dir: tmp.path().join("up"),
            output_dir: tmp.path().join("out"),
            thumbnail_dir: tmp.path().join("thumbs"),
            max_file_size: 1024,
        };
        storage.ensure_dirs().unwrap();
        assert!(storage.upload_dir.is_dir());
        assert!(storage.output_dir.is_dir());
        assert!(storage.thumbnail_dir.is_dir());
    }
}
