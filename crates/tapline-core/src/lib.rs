//! # tapline-core: Pure Types for Tapline
//!
//! This crate holds the data model shared by every Tapline front-end. It
//! contains plain types and deterministic rules, with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tapline Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          Front-ends (Compose / SwiftUI / tapline CLI)           │   │
//! │  │     Item list ──► Favorite toggle ──► Login form                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ StateFlow snapshots                    │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              tapline-sync (use cases, adapter)                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tapline-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   item    │  │   state   │  │ freshness │  │   auth    │  │   │
//! │  │   │   Item    │  │ DataState │  │  Mark     │  │ UserInfo  │  │   │
//! │  │   │  Summary  │  │  Payload  │  │  stale?   │  │ ViewState │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  tapline-db (Local Store)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`item`] - `Item` and the derived `ItemCollectionSummary`
//! - [`state`] - `DataState<T>` envelope with the loading overlay
//! - [`freshness`] - Freshness mark and the staleness rule
//! - [`auth`] - Credentials, user identity newtypes and the auth view state
//!
//! ## Example Usage
//!
//! ```rust
//! use tapline_core::{DataState, FreshnessMark, Item, ItemCollectionSummary, STALE_AFTER_MS};
//!
//! let items = vec![Item::new(1, "weissbier", false), Item::new(2, "Punk Ipa", false)];
//! let summary = ItemCollectionSummary::from_items(items);
//! assert_eq!(summary.longest_name_item.unwrap().name, "weissbier");
//!
//! // Loading never erases last-known-good data
//! let shown = DataState::data(1u32);
//! let merged = DataState::overlay(&shown, DataState::loading());
//! assert!(merged.loading);
//! assert_eq!(merged.as_data(), Some(&1));
//!
//! // Never fetched means stale
//! assert!(FreshnessMark::default().is_stale(STALE_AFTER_MS));
//! assert!(!FreshnessMark::default().is_stale(STALE_AFTER_MS - 1));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod freshness;
pub mod item;
pub mod state;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use auth::{AuthResult, AuthSummary, AuthViewState, Credential, Email, Token, UserInfo, Username};
pub use freshness::{FreshnessMark, STALE_AFTER_MS};
pub use item::{Item, ItemCollectionSummary};
pub use state::{DataState, Payload};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Message carried by the error state when the item list cannot be fetched.
pub const DOWNLOAD_FAILED_MESSAGE: &str = "Unable to download item list";

/// Message carried by the error state when fetched items cannot be written.
pub const SAVE_FAILED_MESSAGE: &str = "Unable to save item list";

/// Message carried by the error state when the cached items cannot be read.
pub const READ_FAILED_MESSAGE: &str = "Unable to read item list";
