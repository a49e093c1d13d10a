//! The remote-synced shopping list.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use cesta_core::{
    CategoryFilter, ItemId, ItemMutation, ListStore, LocalCache, Partition, ShoppingItem,
    StoreError,
};

use crate::channel::spawn_reconciler;
use crate::config::BackoffConfig;
use crate::error::SyncError;
use crate::remote::RemoteStore;

/// A shopping list kept in step with a remote backing store.
///
/// Writes are optimistic: each operation applies to the local store and
/// its cache first, then awaits the remote write. On a failed write the
/// local change is reverted before the error is returned, so a returned
/// `Ok` means applied and confirmed, and a returned `Err` means the list
/// looks as if the call never happened.
///
/// A background task folds the remote change feed into the same store;
/// the echo of each confirmed write arrives there too and lands as a
/// no-op replace.
pub struct SyncedList<R: RemoteStore> {
    remote: Arc<R>,
    store: Arc<Mutex<ListStore>>,
    connected: watch::Receiver<bool>,
    reconciler: JoinHandle<()>,
}

impl<R: RemoteStore> SyncedList<R> {
    /// Connect with default backoff tuning.
    pub async fn connect(remote: R, cache: Box<dyn LocalCache>) -> Result<Self, SyncError> {
        Self::connect_with_backoff(remote, cache, BackoffConfig::default()).await
    }

    /// Load the cache, fetch the initial snapshot, and start reconciling.
    ///
    /// The snapshot replaces whatever the cache held; fetching it is the
    /// one remote call that has no fallback, so its failure is fatal and
    /// no list is returned.
    pub async fn connect_with_backoff(
        remote: R,
        cache: Box<dyn LocalCache>,
        backoff: BackoffConfig,
    ) -> Result<Self, SyncError> {
        let mut local = ListStore::open(cache)?;

        // Subscribe before fetching so nothing lands between the snapshot
        // and the first delivered event.
        let feed = remote.subscribe();
        let snapshot = remote.fetch_all().await.map_err(SyncError::Snapshot)?;
        info!(rows = snapshot.len(), "loaded initial snapshot");
        local.replace_all(snapshot)?;

        let remote = Arc::new(remote);
        let store = Arc::new(Mutex::new(local));
        let (connected_tx, connected_rx) = watch::channel(true);
        let reconciler = spawn_reconciler(
            Arc::clone(&store),
            Arc::clone(&remote),
            feed,
            connected_tx,
            backoff,
        );

        Ok(Self {
            remote,
            store,
            connected: connected_rx,
            reconciler,
        })
    }

    /// Add an item locally and push it to the remote store.
    pub async fn add(
        &self,
        name: &str,
        quantity: u32,
        category: &str,
        emoji: Option<&str>,
    ) -> Result<ShoppingItem, SyncError> {
        let item = self.lock().add(name, quantity, category, emoji)?;

        match self.remote.insert(&item).await {
            Ok(()) => Ok(item),
            Err(e) => {
                warn!(id = %item.id, error = %e, "remote insert failed, reverting add");
                if let Err(revert) = self.lock().remove(item.id) {
                    warn!(id = %item.id, error = %revert, "failed to revert add");
                }
                Err(SyncError::Remote(e))
            }
        }
    }

    /// Replace name, category, and emoji, pushing the changed fields.
    pub async fn edit(
        &self,
        id: ItemId,
        name: &str,
        category: &str,
        emoji: Option<&str>,
    ) -> Result<(), SyncError> {
        let (prior, mutations) = {
            let mut store = self.lock();
            let prior = store.get(id).cloned().ok_or(StoreError::NotFound(id))?;
            store.edit(id, name, category, emoji)?;
            // Read back for the trimmed and normalized values.
            let edited = store.get(id).cloned().ok_or(StoreError::NotFound(id))?;
            let mutations = vec![
                ItemMutation::SetName(edited.name),
                ItemMutation::SetCategory(edited.category),
                ItemMutation::SetEmoji(edited.emoji),
            ];
            (prior, mutations)
        };

        match self.remote.update(id, &mutations).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(%id, error = %e, "remote update failed, reverting edit");
                if let Err(revert) =
                    self.lock()
                        .edit(id, &prior.name, &prior.category, prior.emoji.as_deref())
                {
                    warn!(%id, error = %revert, "failed to revert edit");
                }
                Err(SyncError::Remote(e))
            }
        }
    }

    /// Flip completion, pushing only the changed boolean.
    pub async fn toggle_completed(&self, id: ItemId) -> Result<bool, SyncError> {
        let completed = self.lock().toggle_completed(id)?;

        match self
            .remote
            .update(id, &[ItemMutation::SetCompleted(completed)])
            .await
        {
            Ok(()) => Ok(completed),
            Err(e) => {
                warn!(%id, error = %e, "remote update failed, reverting toggle");
                if let Err(revert) = self.lock().toggle_completed(id) {
                    warn!(%id, error = %revert, "failed to revert toggle");
                }
                Err(SyncError::Remote(e))
            }
        }
    }

    /// Remove an item locally and delete the remote row.
    pub async fn remove(&self, id: ItemId) -> Result<(), SyncError> {
        let (index, removed) = {
            let mut store = self.lock();
            let index = store.index_of(id).ok_or(StoreError::NotFound(id))?;
            let removed = store.remove(id)?;
            (index, removed)
        };

        match self.remote.delete(id).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(%id, error = %e, "remote delete failed, reverting remove");
                if let Err(revert) = self.lock().restore_at(index, removed) {
                    warn!(%id, error = %revert, "failed to revert remove");
                }
                Err(SyncError::Remote(e))
            }
        }
    }

    /// Add a category. Categories live only in the local store, so there
    /// is no remote write to wait for.
    pub fn add_category(&self, name: &str) -> Result<(), SyncError> {
        self.lock().add_category(name)?;
        Ok(())
    }

    /// Rename a category and push the recategorized rows one by one.
    ///
    /// On a failed row write the remaining pushes are abandoned: rows
    /// already written get a best-effort compensating update back to the
    /// old name, the local rename is undone, and the error is returned.
    /// Rows whose compensation also failed converge through their echoes.
    pub async fn rename_category(&self, old: &str, new: &str) -> Result<(), SyncError> {
        let new = new.trim();
        let changed = self.lock().rename_category(old, new)?;

        let mutation = [ItemMutation::SetCategory(new.to_string())];
        for (pushed, id) in changed.iter().enumerate() {
            if let Err(e) = self.remote.update(*id, &mutation).await {
                warn!(%id, error = %e, "remote recategorize failed, reverting rename");
                self.compensate_rename(old, new, &changed, pushed).await;
                return Err(SyncError::Remote(e));
            }
        }
        Ok(())
    }

    async fn compensate_rename(&self, old: &str, new: &str, changed: &[ItemId], pushed: usize) {
        let mutation = [ItemMutation::SetCategory(old.to_string())];
        for id in &changed[..pushed] {
            if let Err(e) = self.remote.update(*id, &mutation).await {
                warn!(%id, error = %e, "compensating update failed");
            }
        }
        if let Err(e) = self.lock().revert_rename(old, new, changed) {
            warn!(error = %e, "failed to revert local rename");
        }
    }

    /// Current items, insertion-ordered.
    pub fn items(&self) -> Vec<ShoppingItem> {
        self.lock().items().to_vec()
    }

    pub fn get(&self, id: ItemId) -> Option<ShoppingItem> {
        self.lock().get(id).cloned()
    }

    /// Current category sequence.
    pub fn categories(&self) -> Vec<String> {
        self.lock().categories().to_vec()
    }

    /// Pending/completed split of the items visible under `filter`.
    pub fn partition(&self, filter: &CategoryFilter) -> Partition {
        self.lock().partition(filter)
    }

    /// Whether the change feed is currently live.
    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    /// Watch connection-state changes.
    pub fn connection_watch(&self) -> watch::Receiver<bool> {
        self.connected.clone()
    }

    /// Stop reconciling. Writes already in flight are not awaited.
    pub fn shutdown(self) {
        self.reconciler.abort();
    }

    fn lock(&self) -> MutexGuard<'_, ListStore> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<R: RemoteStore> Drop for SyncedList<R> {
    fn drop(&mut self) {
        self.reconciler.abort();
    }
}
