//! # tapline-sync: Use Cases and View State for Tapline
//!
//! This crate connects the remote API, the local store and the UI. Use cases
//! produce `DataState` sequences; view models fold them into a single-slot
//! `StateFlow` the UI context observes.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Tapline Sync Layer                              │
//! │                                                                         │
//! │  UI context (UiContext)                                                │
//! │       ▲  observe(): current value, then newer values                   │
//! │       │                                                                 │
//! │  ┌────┴──────────────────────────┐  ┌──────────────────────────────┐   │
//! │  │ ItemListModel                 │  │ AuthModel                    │   │
//! │  │ StateFlow<DataState<Summary>> │  │ StateFlow<AuthViewState>     │   │
//! │  └────┬──────────────────────────┘  └────┬─────────────────────────┘   │
//! │       │ generation-tagged tasks          │                              │
//! │  ┌────▼──────────────────────────┐  ┌────▼─────────────────────────┐   │
//! │  │ ItemSyncUseCase               │  │ AuthUseCase                  │   │
//! │  │ refresh_if_stale / watch      │  │ authenticate                 │   │
//! │  └────┬─────────────┬────────────┘  └────┬─────────────────────────┘   │
//! │       │             │                    │                              │
//! │  ┌────▼──────┐ ┌────▼───────────────┐ ┌──▼──────────────────────────┐  │
//! │  │ ItemStore │ │ FreshnessTracker   │ │ RemoteClient (reqwest)      │  │
//! │  │ (items)   │ │ (DbTimestampKey)   │ │ GET listing / POST login    │  │
//! │  └───────────┘ └────────────────────┘ └─────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`adapter`] - `StateFlow`, `Subscription` and `UiContext`
//! - [`auth`] - Login use case
//! - [`clock`] - Wall clock seam
//! - [`config`] - TOML configuration with environment overrides
//! - [`context`] - `AppContext` holding the collaborators
//! - [`error`] - Sync error types
//! - [`item_sync`] - Cache refresh and observation
//! - [`model`] - Screen models
//! - [`remote`] - HTTP client and wire types
//! - [`store`] - Store traits over `tapline-db`
//!
//! ## Usage
//!
//! ```rust,ignore
//! let config = TaplineConfig::load(None)?;
//! let db = Database::new(DbConfig::new(config.database_path().unwrap())).await?;
//! let ctx = AppContext::production(config, &db)?;
//!
//! let items = ItemListModel::new(ctx);
//! let _subscription = items.state().observe(&UiContext::current()?, |state| {
//!     render(state);
//! });
//! items.open();
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod adapter;
pub mod auth;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod item_sync;
pub mod model;
pub mod remote;
pub mod store;

#[cfg(test)]
mod mock;

// =============================================================================
// Re-exports
// =============================================================================

pub use adapter::{StateFlow, Subscription, UiContext};
pub use auth::{AuthStream, AuthUseCase};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ApiSettings, CacheSettings, DatabaseSettings, TaplineConfig};
pub use context::{AppContext, AppContextBuilder};
pub use error::{SyncError, SyncResult};
pub use item_sync::{ItemStream, ItemSyncUseCase};
pub use model::{AuthModel, ItemListModel};
pub use remote::{HttpRemoteClient, ItemResult, NetResponse, RemoteClient, UserAuthDto};
pub use store::{FreshnessTracker, ItemListStream, ItemStore};
