//! # Store Seams
//!
//! The use cases talk to the local store through these traits. The SQLite
//! repositories from `tapline-db` implement them here.
//!
//! ```text
//!   ItemSyncUseCase ──► dyn ItemStore ─────────► ItemRepository (items table)
//!                   └─► dyn FreshnessTracker ──► SettingsRepository (settings)
//! ```

use async_trait::async_trait;
use futures_util::stream::{BoxStream, StreamExt};

use tapline_core::{FreshnessMark, Item};
use tapline_db::{ItemRepository, SettingsRepository, LAST_FETCH_KEY};

use crate::error::SyncResult;

/// Observable list of items: current rows first, then one list per change.
pub type ItemListStream = BoxStream<'static, SyncResult<Vec<Item>>>;

/// Item persistence.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// All items in store order, re-emitted after every write.
    fn select_all(&self) -> ItemListStream;

    /// Zero or one item, re-emitted after every write.
    fn select_by_id(&self, id: i64) -> ItemListStream;

    /// Inserts by name; names already present keep their row untouched.
    async fn insert_many(&self, items: &[Item]) -> SyncResult<()>;

    async fn update_favorite(&self, id: i64, favorite: bool) -> SyncResult<()>;

    async fn delete_all(&self) -> SyncResult<()>;
}

/// Key/value persistence for the freshness mark.
#[async_trait]
pub trait FreshnessTracker: Send + Sync {
    async fn get_long(&self, key: &str, default: i64) -> SyncResult<i64>;

    async fn put_long(&self, key: &str, value: i64) -> SyncResult<()>;

    /// Reads the mark; never fetched reads as `0`.
    async fn freshness_mark(&self) -> SyncResult<FreshnessMark> {
        Ok(FreshnessMark::new(self.get_long(LAST_FETCH_KEY, 0).await?))
    }

    async fn record_fetch(&self, now_epoch_millis: i64) -> SyncResult<()> {
        self.put_long(LAST_FETCH_KEY, now_epoch_millis).await
    }

    async fn reset_mark(&self) -> SyncResult<()> {
        self.put_long(LAST_FETCH_KEY, 0).await
    }
}

// =============================================================================
// SQLite Implementations
// =============================================================================

#[async_trait]
impl ItemStore for ItemRepository {
    fn select_all(&self) -> ItemListStream {
        self.watch_all().map(|rows| rows.map_err(Into::into)).boxed()
    }

    fn select_by_id(&self, id: i64) -> ItemListStream {
        self.watch_by_id(id).map(|rows| rows.map_err(Into::into)).boxed()
    }

    async fn insert_many(&self, items: &[Item]) -> SyncResult<()> {
        ItemRepository::insert_many(self, items).await?;
        Ok(())
    }

    async fn update_favorite(&self, id: i64, favorite: bool) -> SyncResult<()> {
        ItemRepository::update_favorite(self, id, favorite).await?;
        Ok(())
    }

    async fn delete_all(&self) -> SyncResult<()> {
        ItemRepository::delete_all(self).await?;
        Ok(())
    }
}

#[async_trait]
impl FreshnessTracker for SettingsRepository {
    async fn get_long(&self, key: &str, default: i64) -> SyncResult<i64> {
        Ok(SettingsRepository::get_long(self, key, default).await?)
    }

    async fn put_long(&self, key: &str, value: i64) -> SyncResult<()> {
        Ok(SettingsRepository::put_long(self, key, value).await?)
    }
}
