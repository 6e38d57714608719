//! # View Models
//!
//! One model per screen. Each owns a [`StateFlow`] the UI observes and a
//! task scope that `close()` cancels.
//!
//! ## Generations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  refresh(true)  ──► gen 1 ──► loading ........ error      (dropped)    │
//! │  refresh(true)  ──► gen 2 ──► loading ... data ... end ──► loading off │
//! │                                                                         │
//! │  login(a)       ──► gen 1 ──► Loading ............ Error  (dropped)    │
//! │  login(b)       ──► gen 2 ──► Loading ... AuthSuccess                  │
//! │  reset()        ──► gen 3 ──► Uninitialized                            │
//! │                                                                         │
//! │  An emission is applied only while its generation is the newest.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use tapline_core::{AuthViewState, DataState, Item, ItemCollectionSummary, SAVE_FAILED_MESSAGE};

use crate::adapter::StateFlow;
use crate::auth::AuthUseCase;
use crate::context::AppContext;
use crate::error::SyncResult;
use crate::item_sync::{ItemStream, ItemSyncUseCase};

fn next_generation(counter: &AtomicU64) -> u64 {
    counter.fetch_add(1, Ordering::SeqCst) + 1
}

// =============================================================================
// Item List
// =============================================================================

/// State holder for the item list screen.
pub struct ItemListModel {
    sync: ItemSyncUseCase,
    runtime: Handle,
    state: StateFlow<DataState<ItemCollectionSummary>>,
    generation: Arc<AtomicU64>,
    scope: CancellationToken,
    force_on_open: bool,
    watching: AtomicBool,
}

impl ItemListModel {
    pub fn new(ctx: AppContext) -> Self {
        let force_on_open = ctx.config.cache.force_refresh_on_open;
        ItemListModel {
            runtime: ctx.runtime.clone(),
            sync: ItemSyncUseCase::new(ctx),
            state: StateFlow::new(DataState::loading()),
            generation: Arc::new(AtomicU64::new(0)),
            scope: CancellationToken::new(),
            force_on_open,
            watching: AtomicBool::new(false),
        }
    }

    /// Read-only handle to the screen state.
    pub fn state(&self) -> StateFlow<DataState<ItemCollectionSummary>> {
        self.state.clone()
    }

    /// Starts observing the cache (once) and runs the opening refresh.
    ///
    /// Like every command here, callable from any thread; the work runs on
    /// the context's runtime.
    pub fn open(&self) -> u64 {
        if !self.watching.swap(true, Ordering::SeqCst) {
            self.spawn_watch(self.sync.watch_cache());
        }
        self.refresh(self.force_on_open)
    }

    fn spawn_watch(&self, mut cache: ItemStream) {
        let state = self.state.clone();
        let scope = self.scope.clone();

        self.runtime.spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = scope.cancelled() => break,
                    next = cache.next() => match next {
                        // A refresh in flight keeps its overlay
                        Some(next) => state.update(|shown| next.with_loading(shown.loading)),
                        None => break,
                    },
                }
            }
            debug!("Item cache observation stopped");
        });
    }

    /// Starts a refresh and returns its generation. Any earlier refresh
    /// still running is superseded.
    pub fn refresh(&self, forced: bool) -> u64 {
        let generation = next_generation(&self.generation);
        let mut states = self.sync.refresh_if_stale(forced);
        let state = self.state.clone();
        let current = Arc::clone(&self.generation);
        let scope = self.scope.clone();

        debug!(generation, forced, "Item refresh started");
        self.runtime.spawn(async move {
            let is_current = || current.load(Ordering::SeqCst) == generation;

            loop {
                tokio::select! {
                    biased;
                    _ = scope.cancelled() => return,
                    next = states.next() => match next {
                        Some(next) => {
                            state.update_if(|shown| {
                                if !is_current() {
                                    return false;
                                }
                                *shown = DataState::overlay(shown, next);
                                true
                            });
                        }
                        None => break,
                    },
                }
            }

            state.update_if(|shown| {
                if !is_current() || !shown.loading {
                    return false;
                }
                shown.loading = false;
                true
            });
            debug!(generation, "Item refresh finished");
        });

        generation
    }

    /// Flips `item.favorite` in the store. The cache watch publishes the
    /// change.
    pub async fn update_favorite(&self, item: &Item) -> SyncResult<()> {
        let result = self.sync.update_favorite(item).await;
        self.publish_failure(&result);
        result
    }

    pub async fn set_favorite(&self, id: i64, favorite: bool) -> SyncResult<()> {
        let result = self.sync.set_favorite(id, favorite).await;
        self.publish_failure(&result);
        result
    }

    fn publish_failure(&self, result: &SyncResult<()>) {
        if let Err(err) = result {
            error!(error = %err, "Failed to store favorite");
            self.state
                .update(|shown| DataState::error(SAVE_FAILED_MESSAGE).with_loading(shown.loading));
        }
    }

    /// Dismisses a shown error.
    pub fn consume_error(&self) {
        self.state.update(DataState::consume_error);
    }

    /// Empties the cache, drops every refresh in flight and shows nothing.
    pub async fn clear(&self) -> SyncResult<()> {
        self.sync.clear_cache().await?;
        next_generation(&self.generation);
        self.state.set(DataState::idle());
        Ok(())
    }

    /// Cancels every task this model started.
    pub fn close(&self) {
        if !self.scope.is_cancelled() {
            info!("Item list model closed");
        }
        self.scope.cancel();
    }
}

impl Drop for ItemListModel {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}

// =============================================================================
// Auth
// =============================================================================

/// State holder for the login screen.
pub struct AuthModel {
    auth: AuthUseCase,
    runtime: Handle,
    state: StateFlow<AuthViewState>,
    generation: Arc<AtomicU64>,
    scope: CancellationToken,
}

impl AuthModel {
    pub fn new(ctx: &AppContext) -> Self {
        AuthModel {
            auth: AuthUseCase::new(ctx),
            runtime: ctx.runtime.clone(),
            state: StateFlow::new(AuthViewState::default()),
            generation: Arc::new(AtomicU64::new(0)),
            scope: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> StateFlow<AuthViewState> {
        self.state.clone()
    }

    /// Shows `Loading` at once and submits the credential. A later `login`
    /// or `reset` discards this attempt's outcome.
    ///
    /// Ignored while signed in; `reset` first. Returns the attempt's
    /// generation, or `None` when ignored.
    pub fn login(&self, username: impl Into<String>, password: impl Into<String>) -> Option<u64> {
        if self.state.value().user_info().is_some() {
            debug!("Login ignored while signed in");
            return None;
        }

        let generation = next_generation(&self.generation);
        self.state.set(AuthViewState::login());

        let mut states = self.auth.authenticate(username, password);
        let state = self.state.clone();
        let current = Arc::clone(&self.generation);
        let scope = self.scope.clone();

        self.runtime.spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = scope.cancelled() => break,
                    next = states.next() => match next {
                        Some(emission) => {
                            let applied = state.update_if(|shown| {
                                if current.load(Ordering::SeqCst) != generation {
                                    return false;
                                }
                                *shown = AuthViewState::reduce(&emission);
                                true
                            });
                            if !applied {
                                debug!(generation, "Superseded login response dropped");
                            }
                        }
                        None => break,
                    },
                }
            }
        });

        Some(generation)
    }

    /// Back to the initial state; drops any login in flight.
    pub fn reset(&self) {
        next_generation(&self.generation);
        self.state.set(AuthViewState::reset());
    }

    pub fn close(&self) {
        self.scope.cancel();
    }
}

impl Drop for AuthModel {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
