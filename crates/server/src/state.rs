//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::{HistoryPolicy, RecordStore};
use crate::services::auth::{AccountService, Authenticator};
use crate::services::{DraftManager, SnapshotQuery};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// record store, the token authenticator and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    store: Arc<dyn RecordStore>,
    authenticator: Arc<dyn Authenticator>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn RecordStore>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                authenticator,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the record store.
    #[must_use]
    pub fn store(&self) -> &dyn RecordStore {
        self.inner.store.as_ref()
    }

    /// Get a reference to the token authenticator.
    #[must_use]
    pub fn authenticator(&self) -> &dyn Authenticator {
        self.inner.authenticator.as_ref()
    }

    /// History policy used for year browsing.
    #[must_use]
    pub fn history_policy(&self) -> HistoryPolicy {
        self.inner.config.history_policy
    }

    #[must_use]
    pub fn drafts(&self) -> DraftManager<'_> {
        DraftManager::new(self.store())
    }

    #[must_use]
    pub fn snapshots(&self) -> SnapshotQuery<'_> {
        SnapshotQuery::new(self.store(), self.history_policy())
    }

    #[must_use]
    pub fn accounts(&self) -> AccountService<'_> {
        AccountService::new(self.store(), self.authenticator())
    }
}
