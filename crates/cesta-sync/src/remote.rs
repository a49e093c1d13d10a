//! The remote backing store contract.

use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use cesta_core::{ChangeEvent, ItemId, ItemMutation, ShoppingItem};

/// Errors from the remote backing store.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("Row not found: {0}")]
    NotFound(ItemId),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// A table of shopping item rows with a realtime change feed.
///
/// Every committed mutation is echoed to all live feeds, including the
/// feed of the writer itself. Futures carry a `Send` bound so the
/// reconnect path can run inside a spawned task.
pub trait RemoteStore: Send + Sync + 'static {
    /// Full snapshot, ordered by creation time ascending.
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<ShoppingItem>, RemoteError>> + Send;

    /// Insert one row.
    fn insert(&self, item: &ShoppingItem) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Apply field mutations to the row with `id`.
    fn update(
        &self,
        id: ItemId,
        mutations: &[ItemMutation],
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Delete the row with `id`.
    fn delete(&self, id: ItemId) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Open a new change-event feed.
    fn subscribe(&self) -> UnboundedReceiver<ChangeEvent>;
}

/// Sharing a store between clients is just cloning the `Arc`.
impl<R: RemoteStore> RemoteStore for Arc<R> {
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<ShoppingItem>, RemoteError>> + Send {
        R::fetch_all(self)
    }

    fn insert(&self, item: &ShoppingItem) -> impl Future<Output = Result<(), RemoteError>> + Send {
        R::insert(self, item)
    }

    fn update(
        &self,
        id: ItemId,
        mutations: &[ItemMutation],
    ) -> impl Future<Output = Result<(), RemoteError>> + Send {
        R::update(self, id, mutations)
    }

    fn delete(&self, id: ItemId) -> impl Future<Output = Result<(), RemoteError>> + Send {
        R::delete(self, id)
    }

    fn subscribe(&self) -> UnboundedReceiver<ChangeEvent> {
        R::subscribe(self)
    }
}

/// Fan-out registry for change-event feeds.
#[derive(Default)]
pub(crate) struct Subscribers {
    senders: Mutex<Vec<UnboundedSender<ChangeEvent>>>,
}

impl Subscribers {
    /// Register a fresh feed.
    pub(crate) fn subscribe(&self) -> UnboundedReceiver<ChangeEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(tx);
        rx
    }

    /// Send to every live feed, dropping feeds whose receiver is gone.
    pub(crate) fn emit(&self, event: &ChangeEvent) {
        let mut senders = self.senders.lock().unwrap_or_else(|e| e.into_inner());
        senders.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Drop every registered sender, closing all feeds.
    pub(crate) fn close_all(&self) {
        self.senders
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}
