//! The background task that folds the change feed into the store.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use cesta_core::{ChangeEvent, ListStore};

use crate::config::BackoffConfig;
use crate::remote::RemoteStore;

/// Drive the change feed into the store until the task is aborted.
///
/// Events apply one at a time under the store lock. When the feed closes,
/// the connection watch flips to false and the task retries with doubling
/// delays; recovery means a fresh feed plus a fresh snapshot, so anything
/// missed while disconnected is restored before events resume.
pub(crate) fn spawn_reconciler<R: RemoteStore>(
    store: Arc<Mutex<ListStore>>,
    remote: Arc<R>,
    feed: UnboundedReceiver<ChangeEvent>,
    connected: watch::Sender<bool>,
    backoff: BackoffConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut feed = feed;
        loop {
            consume_feed(&store, &mut feed).await;

            if connected.send(false).is_err() {
                // Every watcher is gone; the owning handle was dropped.
                return;
            }
            warn!("change feed closed, reconnecting");

            feed = resubscribe(&store, remote.as_ref(), &backoff).await;

            let _ = connected.send(true);
        }
    })
}

async fn consume_feed(store: &Arc<Mutex<ListStore>>, feed: &mut UnboundedReceiver<ChangeEvent>) {
    while let Some(event) = feed.recv().await {
        apply_event(store, event);
    }
}

fn apply_event(store: &Arc<Mutex<ListStore>>, event: ChangeEvent) {
    let id = event.item_id();
    let mut store = store.lock().unwrap_or_else(|e| e.into_inner());
    match store.reconcile(event) {
        Ok(outcome) => debug!(%id, ?outcome, "reconciled remote event"),
        Err(e) => warn!(%id, error = %e, "failed to persist reconciled event"),
    }
}

async fn resubscribe<R: RemoteStore>(
    store: &Arc<Mutex<ListStore>>,
    remote: &R,
    backoff: &BackoffConfig,
) -> UnboundedReceiver<ChangeEvent> {
    let mut delay = backoff.initial();
    loop {
        sleep(delay).await;

        // Subscribe before fetching so nothing lands between the snapshot
        // and the first delivered event.
        let feed = remote.subscribe();
        match remote.fetch_all().await {
            Ok(snapshot) => {
                let rows = snapshot.len();
                let mut store = store.lock().unwrap_or_else(|e| e.into_inner());
                if let Err(e) = store.replace_all(snapshot) {
                    warn!(error = %e, "failed to persist reconnect snapshot");
                }
                info!(rows, "change feed restored");
                return feed;
            }
            Err(e) => {
                warn!(error = %e, delay_ms = delay.as_millis() as u64, "reconnect failed, retrying");
                delay = (delay * 2).min(backoff.max());
            }
        }
    }
}
