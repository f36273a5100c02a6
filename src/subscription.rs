//! Bridge from provider mutation notifications into repository refreshes.
//!
//! Change callbacks can arrive on arbitrary threads and must never block the
//! notifier, so they go through a bounded channel: the notifier does a
//! `try_send` and returns immediately, and a consumer task debounces bursts
//! into a single refresh. A full queue is fine — a refresh is already
//! pending and one refresh observes all prior mutations.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::store::CalendarDataStore;

/// Capacity of the notification queue.
const CHANGE_QUEUE_CAPACITY: usize = 64;

/// Handle given to the provider binding. Cheap to clone, safe to call from
/// any thread, never blocks.
#[derive(Clone)]
pub struct ChangeNotifier {
    tx: mpsc::Sender<()>,
}

impl ChangeNotifier {
    pub fn notify(&self) {
        // Full or closed queue both mean no work is lost: either a refresh
        // is already queued, or the subscription was unregistered.
        let _ = self.tx.try_send(());
    }
}

struct Inner {
    tx: mpsc::Sender<()>,
    rx: Option<mpsc::Receiver<()>>,
    task: Option<JoinHandle<()>>,
}

/// Subscription that turns provider change notifications into
/// `CalendarDataStore::refresh()` calls.
///
/// `register` is idempotent — a single consumer task is retained. The host
/// must call `unregister` on process teardown so the subscription does not
/// outlive the engine.
pub struct ChangeSubscription {
    store: Arc<CalendarDataStore>,
    debounce: Duration,
    inner: parking_lot::Mutex<Inner>,
}

impl ChangeSubscription {
    pub fn new(store: Arc<CalendarDataStore>, debounce_ms: u64) -> Self {
        let (tx, rx) = mpsc::channel(CHANGE_QUEUE_CAPACITY);
        Self {
            store,
            debounce: Duration::from_millis(debounce_ms),
            inner: parking_lot::Mutex::new(Inner {
                tx,
                rx: Some(rx),
                task: None,
            }),
        }
    }

    /// Obtain a notifier handle for the provider binding. Handles obtained
    /// before an `unregister` go inert; fetch a fresh one after
    /// re-registering.
    pub fn notifier(&self) -> ChangeNotifier {
        ChangeNotifier {
            tx: self.inner.lock().tx.clone(),
        }
    }

    /// Start consuming change notifications. Registering twice is a no-op.
    pub fn register(&self) {
        let mut inner = self.inner.lock();
        if inner.task.is_some() {
            log::debug!("Change subscription already registered");
            return;
        }
        let Some(mut rx) = inner.rx.take() else {
            log::debug!("Change subscription already registered");
            return;
        };

        let store = Arc::clone(&self.store);
        let debounce = self.debounce;
        inner.task = Some(tokio::spawn(async move {
            loop {
                if rx.recv().await.is_none() {
                    break; // Channel closed, subscription dropped
                }

                // Debounce: drain notifications arriving within the window
                sleep(debounce).await;
                while rx.try_recv().is_ok() {}

                log::debug!("Provider changed, refreshing repository");
                store.refresh().await;
            }
        }));
        log::info!("Change subscription registered");
    }

    /// Stop consuming change notifications and release the subscription.
    pub fn unregister(&self) {
        let mut inner = self.inner.lock();
        let Some(task) = inner.task.take() else {
            return;
        };
        task.abort();

        // Fresh channel so a later register starts clean; stale notifier
        // handles detach harmlessly.
        let (tx, rx) = mpsc::channel(CHANGE_QUEUE_CAPACITY);
        inner.tx = tx;
        inner.rx = Some(rx);
        log::info!("Change subscription unregistered");
    }

    pub fn is_registered(&self) -> bool {
        self.inner.lock().task.is_some()
    }
}

impl Drop for ChangeSubscription {
    fn drop(&mut self) {
        if let Some(task) = self.inner.lock().task.take() {
            task.abort();
        }
    }
}
