//! # View-State Adapter
//!
//! Carries immutable state snapshots from the background context to the UI
//! context.
//!
//! ## Delivery
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       StateFlow<T> (single slot)                        │
//! │                                                                         │
//! │  background task ──set(v1)──set(v2)──set(v3)──►  [ v3 ]  latest wins    │
//! │                                                    │                    │
//! │                          observe(&ui, observer)    │ current value first│
//! │                                                    ▼                    │
//! │  UI context (UiContext)           observer(v3), then each newer value   │
//! │                                                                         │
//! │  Subscription::close() / drop ──► cancel token + abort delivery task    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A subscriber attached late sees only the latest value; intermediate values
//! it missed are not replayed.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::runtime::{Handle, Runtime};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};

// =============================================================================
// StateFlow
// =============================================================================

/// Latest-wins holder of a UI state. Clones share the slot.
///
/// Only this crate writes to it; front-ends read, observe or stream it.
#[derive(Debug)]
pub struct StateFlow<T> {
    slot: Arc<watch::Sender<T>>,
}

impl<T> Clone for StateFlow<T> {
    fn clone(&self) -> Self {
        StateFlow {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> StateFlow<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(initial: T) -> Self {
        let (slot, _) = watch::channel(initial);
        StateFlow {
            slot: Arc::new(slot),
        }
    }

    /// Snapshot of the current value.
    pub fn value(&self) -> T {
        self.slot.borrow().clone()
    }

    pub(crate) fn set(&self, value: T) {
        self.slot.send_replace(value);
    }

    pub(crate) fn update(&self, f: impl FnOnce(&T) -> T) {
        self.slot.send_modify(|value| *value = f(value));
    }

    /// Applies `f` in place; subscribers are woken only if it returns true.
    pub(crate) fn update_if(&self, f: impl FnOnce(&mut T) -> bool) -> bool {
        self.slot.send_if_modified(f)
    }

    /// A raw receiver, already marked as having seen the current value.
    pub fn receiver(&self) -> watch::Receiver<T> {
        self.slot.subscribe()
    }

    /// The current value followed by every newer value.
    pub fn stream(&self) -> WatchStream<T> {
        WatchStream::new(self.slot.subscribe())
    }

    /// Delivers the current value, then each newer value, to `observer` on
    /// the UI context.
    pub fn observe<F>(&self, ui: &UiContext, mut observer: F) -> Subscription
    where
        F: FnMut(T) + Send + 'static,
    {
        let mut rx = self.slot.subscribe();
        let token = CancellationToken::new();
        let gate = Arc::new(Mutex::new(true));

        let task_token = token.clone();
        let task_gate = Arc::clone(&gate);
        let task = ui.spawn(async move {
            let mut value = rx.borrow_and_update().clone();
            loop {
                {
                    let open = lock(&task_gate);
                    if !*open {
                        break;
                    }
                    observer(value);
                }

                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        value = rx.borrow_and_update().clone();
                    }
                }
            }
            debug!("Observer delivery finished");
        });

        Subscription {
            token,
            gate,
            task: Some(task),
        }
    }
}

fn lock(gate: &Mutex<bool>) -> MutexGuard<'_, bool> {
    match gate.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

// =============================================================================
// Subscription
// =============================================================================

/// An active observation. Closing or dropping it stops delivery.
#[must_use = "dropping a Subscription stops delivery immediately"]
pub struct Subscription {
    token: CancellationToken,
    gate: Arc<Mutex<bool>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Stops delivery. Once this returns the observer is not called again;
    /// a delivery already in progress on another thread is waited for.
    ///
    /// Must not be called from inside the observer itself.
    pub fn close(&mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        *lock(&self.gate) = false;
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}

// =============================================================================
// UiContext
// =============================================================================

/// Handle to the execution context observers run on.
#[derive(Debug, Clone)]
pub struct UiContext {
    handle: Handle,
    _thread: Option<Arc<UiThread>>,
}

impl UiContext {
    /// The runtime the caller is running on.
    pub fn current() -> SyncResult<Self> {
        let handle =
            Handle::try_current().map_err(|e| SyncError::RuntimeUnavailable(e.to_string()))?;
        Ok(UiContext {
            handle,
            _thread: None,
        })
    }

    /// Starts a named thread running a single-threaded runtime. The thread
    /// stops once the last clone of the context is dropped.
    pub fn dedicated(name: impl Into<String>) -> SyncResult<Self> {
        let name = name.into();
        let (handle_tx, handle_rx) = std::sync::mpsc::channel::<Result<Handle, String>>();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let runtime: Runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        let _ = handle_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                let _ = handle_tx.send(Ok(runtime.handle().clone()));
                runtime.block_on(async {
                    let _ = stop_rx.await;
                });
            })
            .map_err(|e| SyncError::RuntimeUnavailable(e.to_string()))?;

        let handle = handle_rx
            .recv()
            .map_err(|e| SyncError::RuntimeUnavailable(e.to_string()))?
            .map_err(SyncError::RuntimeUnavailable)?;

        debug!(thread = %name, "UI context started");
        Ok(UiContext {
            handle,
            _thread: Some(Arc::new(UiThread {
                name,
                stop: Mutex::new(Some(stop_tx)),
            })),
        })
    }

    /// Runs a future on the UI context.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: std::future::Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(future)
    }
}

/// Owner of a dedicated UI thread.
#[derive(Debug)]
struct UiThread {
    name: String,
    stop: Mutex<Option<oneshot::Sender<()>>>,
}

impl Drop for UiThread {
    fn drop(&mut self) {
        let stop = match self.stop.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(stop) = stop {
            if stop.send(()).is_err() {
                warn!(thread = %self.name, "UI thread already stopped");
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures_util::StreamExt;
    use tokio::sync::mpsc;

    use super::*;

    async fn next_within<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for delivery")
            .expect("observer channel closed")
    }

    #[tokio::test]
    async fn test_value_and_update() {
        let flow = StateFlow::new(1u32);
        flow.set(2);
        flow.update(|v| v + 10);
        assert_eq!(flow.value(), 12);

        assert!(!flow.update_if(|_| false));
        assert!(flow.update_if(|v| {
            *v = 0;
            true
        }));
        assert_eq!(flow.clone().value(), 0);
    }

    #[tokio::test]
    async fn test_observer_gets_current_then_newer() {
        let flow = StateFlow::new("first".to_string());
        let ui = UiContext::current().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let _subscription = flow.observe(&ui, move |value| {
            let _ = tx.send(value);
        });

        assert_eq!(next_within(&mut rx).await, "first");
        flow.set("second".to_string());
        assert_eq!(next_within(&mut rx).await, "second");
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_only_latest() {
        let flow = StateFlow::new(0u32);
        for i in 1..=5 {
            flow.set(i);
        }

        let mut stream = flow.stream();
        assert_eq!(stream.next().await, Some(5));

        let ui = UiContext::current().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _subscription = flow.observe(&ui, move |value| {
            let _ = tx.send(value);
        });
        assert_eq!(next_within(&mut rx).await, 5);
    }

    #[tokio::test]
    async fn test_no_delivery_after_close() {
        let flow = StateFlow::new(0u32);
        let ui = UiContext::current().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut subscription = flow.observe(&ui, move |value| {
            let _ = tx.send(value);
        });
        assert_eq!(next_within(&mut rx).await, 0);

        subscription.close();
        assert!(subscription.is_closed());
        flow.set(1);
        flow.set(2);

        // The sender lives in the aborted task, so the channel closes
        let rest = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap();
        assert_eq!(rest, None);
    }

    #[test]
    fn test_dedicated_context_runs_on_named_thread() {
        let ui = UiContext::dedicated("tapline-ui").unwrap();
        let flow = StateFlow::new(7u8);
        let (tx, rx) = std::sync::mpsc::channel();

        let _subscription = flow.observe(&ui, move |value| {
            let name = std::thread::current().name().map(str::to_string);
            let _ = tx.send((value, name));
        });

        let (value, thread) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(value, 7);
        assert_eq!(thread.as_deref(), Some("tapline-ui"));
    }

    #[test]
    fn test_current_outside_runtime_fails() {
        assert!(matches!(
            UiContext::current(),
            Err(SyncError::RuntimeUnavailable(_))
        ));
    }
}
