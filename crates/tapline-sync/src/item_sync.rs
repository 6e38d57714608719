//! # Item Sync Use Case
//!
//! Keeps the cached item list fresh and turns it into the state sequence the
//! item list screen renders.
//!
//! ## Two Producers, One Consumer
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          merged(forced)                                 │
//! │                                                                         │
//! │  refresh_if_stale(forced)                 watch_cache()                 │
//! │  ────────────────────────                 ─────────────                 │
//! │  emit loading                             store.select_all()            │
//! │  stale or forced?                           │                           │
//! │    no  ──► end                              ├─ [] ──► (suppressed)      │
//! │    yes ──► fetch_items()                    ├─ [..] ─► data(summary)    │
//! │             ├─ [..] ─► insert_many ─────────┘                           │
//! │             │          then record mark                                 │
//! │             ├─ []   ─► record mark, emit empty                          │
//! │             └─ Err  ─► emit error("Unable to download item list")      │
//! │       │                                     │                           │
//! │       └──────────────┬──────────────────────┘                           │
//! │                      ▼                                                  │
//! │        consumer folds with DataState::overlay                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The refresh never emits the fetched data itself. The write wakes the cache
//! watch, which emits the new summary.

use futures_util::future;
use futures_util::stream::{self, BoxStream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, warn};

use tapline_core::{
    DataState, FreshnessMark, Item, ItemCollectionSummary, Payload, DOWNLOAD_FAILED_MESSAGE,
    READ_FAILED_MESSAGE, SAVE_FAILED_MESSAGE,
};

use crate::context::AppContext;
use crate::error::SyncResult;

/// Sequence of item list states.
pub type ItemStream = BoxStream<'static, DataState<ItemCollectionSummary>>;

/// Orchestrates the remote client, the item store and the freshness mark.
#[derive(Debug, Clone)]
pub struct ItemSyncUseCase {
    ctx: AppContext,
}

impl ItemSyncUseCase {
    pub fn new(ctx: AppContext) -> Self {
        ItemSyncUseCase { ctx }
    }

    /// Emits `loading`, then fetches if the cache is stale or `forced`.
    ///
    /// The sequence is produced by a task on the context's runtime and ends
    /// when the refresh is done. Callable from any thread.
    pub fn refresh_if_stale(&self, forced: bool) -> ItemStream {
        let (tx, rx) = mpsc::channel(4);
        let this = self.clone();

        self.ctx.runtime.spawn(async move {
            if tx.send(DataState::loading()).await.is_err() {
                return;
            }
            if let Some(state) = this.refresh(forced).await {
                if tx.send(state).await.is_err() {
                    debug!("Refresh consumer went away");
                }
            }
        });

        ReceiverStream::new(rx).boxed()
    }

    /// The body of a refresh; returns the one settled state to emit, if any.
    async fn refresh(&self, forced: bool) -> Option<DataState<ItemCollectionSummary>> {
        let now = self.ctx.clock.now_epoch_millis();

        let mark = match self.ctx.freshness.freshness_mark().await {
            Ok(mark) => mark,
            Err(err) => {
                warn!(error = %err, "Freshness mark unreadable, treating cache as stale");
                FreshnessMark::default()
            }
        };

        if !forced && !mark.is_stale(now) {
            info!(
                last_fetch = mark.last_fetch_epoch_millis,
                "Items not fetched from network, recently updated"
            );
            return None;
        }

        match self.fetch_from_network(now).await {
            DataState {
                payload: Payload::Data(summary),
                ..
            } => {
                if let Err(err) = self.ctx.store.insert_many(&summary.all_items).await {
                    error!(error = %err, "Failed to save fetched items");
                    return Some(DataState::error(SAVE_FAILED_MESSAGE));
                }
                // Only a stored result makes the cache fresh
                if let Err(err) = self.ctx.freshness.record_fetch(now).await {
                    error!(error = %err, "Failed to record freshness mark");
                    return Some(DataState::error(SAVE_FAILED_MESSAGE));
                }
                None
            }
            settled => Some(settled),
        }
    }

    /// Fetches the listing and maps it to unsaved items.
    ///
    /// Records `now` as the freshness mark for an empty result. A non-empty
    /// result is neither written nor marked; the caller does both once the
    /// items are stored.
    pub async fn fetch_from_network(&self, now: i64) -> DataState<ItemCollectionSummary> {
        let results = match self.ctx.remote.fetch_items().await {
            Ok(results) => results,
            Err(err) => {
                error!(error = %err, "Error downloading item list");
                return DataState::error(DOWNLOAD_FAILED_MESSAGE);
            }
        };

        debug!(count = results.len(), "Fetched items from network");

        if results.is_empty() {
            if let Err(err) = self.ctx.freshness.record_fetch(now).await {
                error!(error = %err, "Failed to record freshness mark");
                return DataState::error(SAVE_FAILED_MESSAGE);
            }
            return DataState::empty();
        }

        let items = results
            .into_iter()
            .map(|result| Item::unsaved(result.name.unwrap_or_default()))
            .collect();

        DataState::data(ItemCollectionSummary {
            longest_name_item: None,
            all_items: items,
        })
    }

    /// Observes the store: one `data` per store emission with a non-empty
    /// list, including a write that left the rows unchanged.
    ///
    /// Empty lists are suppressed. A read failure emits the read error state.
    pub fn watch_cache(&self) -> ItemStream {
        self.ctx
            .store
            .select_all()
            .filter_map(|rows| {
                future::ready(match rows {
                    Ok(items) if items.is_empty() => None,
                    Ok(items) => Some(DataState::data(ItemCollectionSummary::from_items(items))),
                    Err(err) => {
                        error!(error = %err, "Failed to read cached items");
                        Some(DataState::error(READ_FAILED_MESSAGE))
                    }
                })
            })
            .boxed()
    }

    /// Refresh and cache watch interleaved, with no ordering between them.
    pub fn merged(&self, forced: bool) -> ItemStream {
        stream::select(self.refresh_if_stale(forced), self.watch_cache()).boxed()
    }

    /// Writes the negation of the caller's `favorite` for `item.id`.
    pub async fn update_favorite(&self, item: &Item) -> SyncResult<()> {
        self.set_favorite(item.id, !item.favorite).await
    }

    /// Writes an explicit favorite value.
    pub async fn set_favorite(&self, id: i64, favorite: bool) -> SyncResult<()> {
        info!(id, favorite, "Item favorite changed");
        self.ctx.store.update_favorite(id, favorite).await
    }

    /// Deletes every cached item and resets the freshness mark.
    pub async fn clear_cache(&self) -> SyncResult<()> {
        self.ctx.store.delete_all().await?;
        self.ctx.freshness.reset_mark().await?;
        info!("Item cache cleared");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
