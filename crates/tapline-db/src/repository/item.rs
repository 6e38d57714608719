//! # Item Repository
//!
//! Database operations for cached items.
//!
//! ## Merge by Name
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   insert_many([weissbier, Punk Ipa])                    │
//! │                                                                         │
//! │  items (before)                     items (after)                       │
//! │  ┌────┬───────────┬──────────┐      ┌────┬───────────┬──────────┐      │
//! │  │ id │ name      │ favorite │      │ id │ name      │ favorite │      │
//! │  ├────┼───────────┼──────────┤      ├────┼───────────┼──────────┤      │
//! │  │ 1  │ weissbier │    1     │ ───► │ 1  │ weissbier │    1     │ kept │
//! │  └────┴───────────┴──────────┘      │ 2  │ Punk Ipa  │    0     │ new  │
//! │                                     └────┴───────────┴──────────┘      │
//! │                                                                         │
//! │  ON CONFLICT(name) DO NOTHING: existing rows keep id and favorite.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Observable Selects
//! `watch_all` / `watch_by_id` emit the current rows immediately and again
//! after every write made through any [`Database`](crate::Database) clone.

use std::sync::Arc;

use futures_util::stream::{self, BoxStream, StreamExt};
use sqlx::SqlitePool;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use tapline_core::Item;

/// Repository for item database operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
    changes: Arc<watch::Sender<u64>>,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool, changes: Arc<watch::Sender<u64>>) -> Self {
        ItemRepository { pool, changes }
    }

    /// Lists every item in store order (ascending id).
    pub async fn select_all(&self) -> DbResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>("SELECT id, name, favorite FROM items ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        debug!(count = items.len(), "Selected all items");
        Ok(items)
    }

    /// Lists the item with the given id: one row, or none if it is missing.
    pub async fn select_by_id(&self, id: i64) -> DbResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>("SELECT id, name, favorite FROM items WHERE id = ?1")
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Gets a single item by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Item>> {
        Ok(self.select_by_id(id).await?.into_iter().next())
    }

    /// Observable form of [`select_all`](Self::select_all).
    pub fn watch_all(&self) -> BoxStream<'static, DbResult<Vec<Item>>> {
        let repo = self.clone();
        self.watch(move || {
            let repo = repo.clone();
            async move { repo.select_all().await }
        })
    }

    /// Observable form of [`select_by_id`](Self::select_by_id).
    pub fn watch_by_id(&self, id: i64) -> BoxStream<'static, DbResult<Vec<Item>>> {
        let repo = self.clone();
        self.watch(move || {
            let repo = repo.clone();
            async move { repo.select_by_id(id).await }
        })
    }

    /// Re-runs `query` now and after every change notification.
    ///
    /// The stream ends when the change counter goes away.
    fn watch<F, Fut>(&self, query: F) -> BoxStream<'static, DbResult<Vec<Item>>>
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = DbResult<Vec<Item>>> + Send + 'static,
    {
        let changes = self.changes.subscribe();

        stream::unfold((query, changes, true), |(query, mut changes, first)| async move {
            if !first && changes.changed().await.is_err() {
                return None;
            }
            // Mark seen before reading so writes during the query wake us again
            changes.borrow_and_update();
            let rows = query().await;
            Some((rows, (query, changes, false)))
        })
        .boxed()
    }

    /// Inserts items by name in one transaction.
    ///
    /// Names already present are ignored, which keeps their id and favorite
    /// flag. Ids given on the input items are not used.
    ///
    /// ## Returns
    /// Number of rows actually inserted.
    pub async fn insert_many(&self, items: &[Item]) -> DbResult<u64> {
        if items.is_empty() {
            return Ok(0);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let mut inserted = 0;
        for item in items {
            let result = sqlx::query(
                "INSERT INTO items (name, favorite) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING",
            )
            .bind(&item.name)
            .bind(item.favorite)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(offered = items.len(), inserted, "Inserted items");
        // Every committed write re-emits, even one that only hit existing names
        self.notify();
        Ok(inserted)
    }

    /// Sets the favorite flag of one item.
    ///
    /// ## Errors
    /// `DbError::NotFound` if no item has this id.
    pub async fn update_favorite(&self, id: i64, favorite: bool) -> DbResult<()> {
        debug!(id, favorite, "Updating favorite");

        let result = sqlx::query("UPDATE items SET favorite = ?2 WHERE id = ?1")
            .bind(id)
            .bind(favorite)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            warn!(id, "Favorite update matched no item");
            return Err(DbError::not_found("Item", id));
        }

        self.notify();
        Ok(())
    }

    /// Deletes every cached item.
    pub async fn delete_all(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM items").execute(&self.pool).await?;

        debug!(deleted = result.rows_affected(), "Deleted all items");
        self.notify();
        Ok(result.rows_affected())
    }

    /// Counts cached items (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    fn notify(&self) {
        self.changes.send_modify(|version| *version = version.wrapping_add(1));
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures_util::StreamExt;

    use crate::{Database, DbConfig};
    use tapline_core::Item;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn fresh(names: &[&str]) -> Vec<Item> {
        names.iter().map(|name| Item::unsaved(*name)).collect()
    }

    #[tokio::test]
    async fn test_insert_assigns_ids_in_order() {
        let db = db().await;
        let repo = db.items();

        let inserted = repo.insert_many(&fresh(&["weissbier", "Punk Ipa"])).await.unwrap();
        assert_eq!(inserted, 2);

        let items = repo.select_all().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "weissbier");
        assert_eq!(items[1].name, "Punk Ipa");
        assert!(items.iter().all(|item| item.is_saved() && !item.favorite));
    }

    #[tokio::test]
    async fn test_insert_existing_name_keeps_id_and_favorite() {
        let db = db().await;
        let repo = db.items();

        repo.insert_many(&fresh(&["weissbier"])).await.unwrap();
        let original = repo.select_all().await.unwrap().remove(0);
        repo.update_favorite(original.id, true).await.unwrap();

        let inserted = repo.insert_many(&fresh(&["weissbier", "Punk Ipa"])).await.unwrap();
        assert_eq!(inserted, 1);

        let kept = repo.get_by_id(original.id).await.unwrap().unwrap();
        assert_eq!(kept, Item::new(original.id, "weissbier", true));
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_favorite_round_trip() {
        let db = db().await;
        let repo = db.items();
        repo.insert_many(&fresh(&["Punk Ipa"])).await.unwrap();
        let item = repo.select_all().await.unwrap().remove(0);

        repo.update_favorite(item.id, !item.favorite).await.unwrap();

        let reread = repo.select_by_id(item.id).await.unwrap();
        assert_eq!(reread, vec![Item::new(item.id, "Punk Ipa", true)]);
    }

    #[tokio::test]
    async fn test_update_favorite_missing_id() {
        let db = db().await;
        let err = db.items().update_favorite(42, true).await.unwrap_err();
        assert!(matches!(err, crate::DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_select_by_missing_id_is_empty() {
        let db = db().await;
        assert!(db.items().select_by_id(99).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_all() {
        let db = db().await;
        let repo = db.items();
        repo.insert_many(&fresh(&["a", "b", "c"])).await.unwrap();

        assert_eq!(repo.delete_all().await.unwrap(), 3);
        assert!(repo.select_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_watch_all_emits_current_then_after_writes() {
        let db = db().await;
        let mut rows = db.items().watch_all();

        let first = rows.next().await.unwrap().unwrap();
        assert!(first.is_empty());

        // Write through a different repository handle
        db.items().insert_many(&fresh(&["weissbier"])).await.unwrap();

        let second = tokio::time::timeout(Duration::from_secs(2), rows.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].name, "weissbier");
    }

    #[tokio::test]
    async fn test_watch_by_id_sees_favorite_change() {
        let db = db().await;
        let repo = db.items();
        repo.insert_many(&fresh(&["weissbier"])).await.unwrap();
        let id = repo.select_all().await.unwrap()[0].id;

        let mut rows = repo.watch_by_id(id);
        assert!(!rows.next().await.unwrap().unwrap()[0].favorite);

        repo.update_favorite(id, true).await.unwrap();
        let next = tokio::time::timeout(Duration::from_secs(2), rows.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(next[0].favorite);
    }

    #[tokio::test]
    async fn test_watch_all_reemits_when_insert_only_hits_existing_names() {
        let db = db().await;
        let repo = db.items();
        repo.insert_many(&fresh(&["weissbier"])).await.unwrap();

        let mut rows = repo.watch_all();
        assert_eq!(rows.next().await.unwrap().unwrap().len(), 1);

        let inserted = repo.insert_many(&fresh(&["weissbier"])).await.unwrap();
        assert_eq!(inserted, 0);

        let again = tokio::time::timeout(Duration::from_secs(2), rows.next())
            .await
            .expect("a write with no new rows must still re-emit")
            .unwrap()
            .unwrap();
        assert_eq!(again.len(), 1);
    }
}
