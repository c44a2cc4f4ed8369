//! Application state management

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::storage::FileStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pub config: Config,
    pub db: SqlitePool,
    pub store: FileStore,
}

impl AppState {
    pub fn new(config: Config, db: SqlitePool) -> Self {
        let store = FileStore::new(config.storage.clone());
        Self {
            inner: Arc::new(AppStateInner { config, db, store }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the database pool
    pub fn db(&self) -> &SqlitePool {
        &self.inner.db
    }

    /// Get the file store
    pub fn store(&self) -> &FileStore {
        &self.inner.store
    }
}
