//! # Application Context
//!
//! The collaborators every use case needs, passed explicitly.
//!
//! ```text
//! ┌───────────────────────────── AppContext ────────────────────────────────┐
//! │  remote:    Arc<dyn RemoteClient>      HttpRemoteClient / mock          │
//! │  store:     Arc<dyn ItemStore>         ItemRepository                   │
//! │  freshness: Arc<dyn FreshnessTracker>  SettingsRepository               │
//! │  clock:     Arc<dyn Clock>             SystemClock / ManualClock        │
//! │  config:    TaplineConfig                                               │
//! │  runtime:   Handle                     background context for all I/O   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tapline_db::Database;
use tokio::runtime::Handle;
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::config::TaplineConfig;
use crate::error::{SyncError, SyncResult};
use crate::remote::{HttpRemoteClient, RemoteClient};
use crate::store::{FreshnessTracker, ItemStore};

/// Shared collaborators. Cloning shares them.
#[derive(Clone)]
pub struct AppContext {
    pub remote: Arc<dyn RemoteClient>,
    pub store: Arc<dyn ItemStore>,
    pub freshness: Arc<dyn FreshnessTracker>,
    pub clock: Arc<dyn Clock>,
    pub config: TaplineConfig,
    /// Every producer and folding task is spawned here, whatever thread
    /// issued the command.
    pub runtime: Handle,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Wires the production collaborators: HTTP client, SQLite store, system
    /// clock, and the calling runtime as the background context.
    pub fn production(config: TaplineConfig, db: &Database) -> SyncResult<Self> {
        let remote = HttpRemoteClient::new(&config.api)?;
        info!(items_url = %remote.items_url(), "App context ready");

        Ok(AppContext {
            remote: Arc::new(remote),
            store: Arc::new(db.items()),
            freshness: Arc::new(db.settings()),
            clock: Arc::new(SystemClock),
            config,
            runtime: current_runtime()?,
        })
    }

    /// Starts a builder backed by `db`; every other collaborator can be
    /// replaced before `build`.
    pub fn builder(db: &Database) -> AppContextBuilder {
        AppContextBuilder {
            remote: None,
            store: Arc::new(db.items()),
            freshness: Arc::new(db.settings()),
            clock: Arc::new(SystemClock),
            config: TaplineConfig::default(),
            runtime: None,
        }
    }
}

fn current_runtime() -> SyncResult<Handle> {
    Handle::try_current().map_err(|e| SyncError::RuntimeUnavailable(e.to_string()))
}

/// Builder for [`AppContext`].
pub struct AppContextBuilder {
    remote: Option<Arc<dyn RemoteClient>>,
    store: Arc<dyn ItemStore>,
    freshness: Arc<dyn FreshnessTracker>,
    clock: Arc<dyn Clock>,
    config: TaplineConfig,
    runtime: Option<Handle>,
}

impl AppContextBuilder {
    pub fn remote(mut self, remote: Arc<dyn RemoteClient>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn store(mut self, store: Arc<dyn ItemStore>) -> Self {
        self.store = store;
        self
    }

    pub fn freshness(mut self, freshness: Arc<dyn FreshnessTracker>) -> Self {
        self.freshness = freshness;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(mut self, config: TaplineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Builds the context. Without an explicit remote, an HTTP client is made
    /// from the config; without an explicit runtime, the calling one is used.
    ///
    /// ## Errors
    /// `SyncError::RuntimeUnavailable` when no runtime is given and the caller
    /// is not inside one.
    pub fn build(self) -> SyncResult<AppContext> {
        let remote = match self.remote {
            Some(remote) => remote,
            None => Arc::new(HttpRemoteClient::new(&self.config.api)?),
        };

        Ok(AppContext {
            remote,
            store: self.store,
            freshness: self.freshness,
            clock: self.clock,
            config: self.config,
            runtime: match self.runtime {
                Some(runtime) => runtime,
                None => current_runtime()?,
            },
        })
    }
}
