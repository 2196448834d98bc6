//! Background maintenance loops
//!
//! The sweeper evicts expired entries so memory is reclaimed even for
//! keys nothing reads again; the snapshotter periodically persists the
//! full contents and truncates the log. Both loops run until told to
//! shut down, and shutdown waits for them to exit.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::Store;

/// Handles to a store's background loops.
///
/// Returned by [`Store::start_background_tasks`]. Dropping the value
/// stops the loops too, but [`BackgroundTasks::shutdown`] additionally
/// waits until both have exited.
pub struct BackgroundTasks {
    shutdown_tx: watch::Sender<bool>,
    sweeper: JoinHandle<()>,
    snapshotter: JoinHandle<()>,
}

impl BackgroundTasks {
    /// Signal both loops to stop and wait for them
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.sweeper.await;
        let _ = self.snapshotter.await;
        info!("background tasks stopped");
    }
}

impl Store {
    /// Spawn the expiry sweeper and the periodic snapshotter, using the
    /// intervals from the [`StoreConfig`](super::StoreConfig) the store
    /// was opened with
    pub fn start_background_tasks(self: &Arc<Self>) -> BackgroundTasks {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let sweeper = tokio::spawn(sweep_loop(
            Arc::clone(self),
            self.config.sweep_interval,
            shutdown_rx.clone(),
        ));
        let snapshotter = tokio::spawn(snapshot_loop(
            Arc::clone(self),
            self.config.snapshot_interval,
            shutdown_rx,
        ));

        BackgroundTasks {
            shutdown_tx,
            sweeper,
            snapshotter,
        }
    }
}

async fn sweep_loop(store: Arc<Store>, interval: Duration, mut shutdown_rx: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await; // the first tick fires immediately, skip it

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = store.sweep_expired();
                if removed > 0 {
                    debug!(removed, "expired entries swept");
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
}

async fn snapshot_loop(
    store: Arc<Store>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = store.save_snapshot() {
                    // The log was not cleared; the next interval retries.
                    warn!(error = %e, "periodic snapshot failed");
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
}
