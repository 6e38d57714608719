//! Test doubles for the use-case and model tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use tapline_core::{Credential, Item};
use tapline_db::{Database, DbConfig};

use crate::clock::ManualClock;
use crate::context::AppContext;
use crate::error::{SyncError, SyncResult};
use crate::remote::{ItemResult, NetResponse, RemoteClient, UserAuthDto};
use crate::store::{ItemListStream, ItemStore};

/// Scripted [`RemoteClient`]. Counts calls and can be told to fail.
#[derive(Default)]
pub struct MockRemoteClient {
    items: Mutex<Option<Vec<ItemResult>>>,
    fail_items: Mutex<bool>,
    items_delay: Mutex<Duration>,
    item_calls: AtomicUsize,
    auth: Mutex<VecDeque<(Duration, NetResponse)>>,
    auth_calls: AtomicUsize,
}

impl MockRemoteClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The listing returns these items until changed.
    pub fn prepare_result(&self, items: Vec<ItemResult>) {
        *self.items.lock().unwrap() = Some(items);
        *self.fail_items.lock().unwrap() = false;
    }

    /// The listing fails until a result is prepared again.
    pub fn throw_on_call(&self) {
        *self.fail_items.lock().unwrap() = true;
    }

    /// Every later listing call answers after `delay`.
    pub fn delay_items(&self, delay: Duration) {
        *self.items_delay.lock().unwrap() = delay;
    }

    pub fn item_calls(&self) -> usize {
        self.item_calls.load(Ordering::SeqCst)
    }

    /// Queues the response of the next login, delivered after `delay`.
    pub fn prepare_auth(&self, delay: Duration, response: NetResponse) {
        self.auth.lock().unwrap().push_back((delay, response));
    }

    pub fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteClient for MockRemoteClient {
    async fn fetch_items(&self) -> SyncResult<Vec<ItemResult>> {
        self.item_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.items_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if *self.fail_items.lock().unwrap() {
            return Err(SyncError::Network("Test error".to_string()));
        }
        Ok(self.items.lock().unwrap().clone().unwrap_or_default())
    }

    async fn submit_credential(&self, _credential: &Credential) -> NetResponse {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.auth.lock().unwrap().pop_front();
        match next {
            Some((delay, response)) => {
                tokio::time::sleep(delay).await;
                response
            }
            None => NetResponse::Error {
                message: "No prepared response".to_string(),
            },
        }
    }
}

/// Item store whose writes always fail; reads delegate.
pub struct FailingWrites<S> {
    pub inner: S,
}

#[async_trait]
impl<S: ItemStore> ItemStore for FailingWrites<S> {
    fn select_all(&self) -> ItemListStream {
        self.inner.select_all()
    }

    fn select_by_id(&self, id: i64) -> ItemListStream {
        self.inner.select_by_id(id)
    }

    async fn insert_many(&self, _items: &[Item]) -> SyncResult<()> {
        Err(SyncError::Database(tapline_db::DbError::QueryFailed(
            "disk I/O error".to_string(),
        )))
    }

    async fn update_favorite(&self, _id: i64, _favorite: bool) -> SyncResult<()> {
        Err(SyncError::Database(tapline_db::DbError::PoolExhausted))
    }

    async fn delete_all(&self) -> SyncResult<()> {
        Err(SyncError::Database(tapline_db::DbError::PoolExhausted))
    }
}

pub fn sample_results() -> Vec<ItemResult> {
    vec![ItemResult::named("weissbier"), ItemResult::named("Punk Ipa")]
}

pub fn success_auth() -> NetResponse {
    NetResponse::Success {
        user: UserAuthDto {
            email: "kermit@example.com".to_string(),
            id: 7,
            username: "kermit".to_string(),
        },
        auth_token: "Bearer abc123".to_string(),
    }
}

/// In-memory database, mock remote and a manual clock at `now`.
pub struct Harness {
    pub db: Database,
    pub remote: Arc<MockRemoteClient>,
    pub clock: ManualClock,
    pub ctx: AppContext,
}

impl Harness {
    pub async fn new(now: i64) -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let remote = MockRemoteClient::new();
        let clock = ManualClock::new(now);
        let ctx = AppContext::builder(&db)
            .remote(remote.clone())
            .clock(Arc::new(clock.clone()))
            .build()
            .unwrap();

        Harness {
            db,
            remote,
            clock,
            ctx,
        }
    }
}
