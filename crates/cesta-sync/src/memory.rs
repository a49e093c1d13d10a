//! In-process remote store.

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::mpsc::UnboundedReceiver;

use cesta_core::{ChangeEvent, ItemId, ItemMutation, ShoppingItem};

use crate::remote::{RemoteError, RemoteStore, Subscribers};

/// Remote store backed by a plain vector.
///
/// Rows live behind a mutex and every committed write is echoed to all
/// feeds, same as the hosted backend would. Fault and event injection
/// hooks exist so callers can exercise the reconciliation and rollback
/// paths without a network.
#[derive(Default)]
pub struct MemoryRemote {
    rows: Mutex<Vec<ShoppingItem>>,
    subscribers: Subscribers,
    write_plan: Mutex<VecDeque<bool>>,
    failing_fetches: Mutex<u32>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed rows without emitting events.
    pub fn with_rows(rows: Vec<ShoppingItem>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Self::default()
        }
    }

    /// Current rows in insertion order.
    pub fn rows(&self) -> Vec<ShoppingItem> {
        self.rows.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Make the next `n` write calls fail with a backend error.
    pub fn fail_next_writes(&self, n: usize) {
        let mut plan = self.write_plan.lock().unwrap_or_else(|e| e.into_inner());
        *plan = std::iter::repeat(true).take(n).collect();
    }

    /// Make the `n`th write call from now fail (1-based); the calls before
    /// it succeed.
    pub fn fail_nth_write(&self, n: usize) {
        let mut plan = self.write_plan.lock().unwrap_or_else(|e| e.into_inner());
        *plan = std::iter::repeat(false)
            .take(n.saturating_sub(1))
            .chain(std::iter::once(true))
            .collect();
    }

    /// Make the next `n` snapshot fetches fail.
    pub fn fail_next_fetches(&self, n: u32) {
        *self
            .failing_fetches
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = n;
    }

    /// Push an event to all feeds without touching the rows. Lets callers
    /// deliver duplicated or reordered sequences.
    pub fn inject(&self, event: ChangeEvent) {
        self.subscribers.emit(&event);
    }

    /// Close every open feed, as a dropped realtime connection would.
    pub fn close_feeds(&self) {
        self.subscribers.close_all();
    }

    fn take_write_failure(&self) -> Result<(), RemoteError> {
        let mut plan = self.write_plan.lock().unwrap_or_else(|e| e.into_inner());
        match plan.pop_front() {
            Some(true) => Err(RemoteError::Backend("injected write failure".to_string())),
            _ => Ok(()),
        }
    }
}

impl RemoteStore for MemoryRemote {
    async fn fetch_all(&self) -> Result<Vec<ShoppingItem>, RemoteError> {
        {
            let mut failing = self
                .failing_fetches
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            if *failing > 0 {
                *failing -= 1;
                return Err(RemoteError::Backend("injected fetch failure".to_string()));
            }
        }
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner()).clone();
        rows.sort_by_key(|row| row.created_at);
        Ok(rows)
    }

    async fn insert(&self, item: &ShoppingItem) -> Result<(), RemoteError> {
        self.take_write_failure()?;
        {
            let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
            if rows.iter().any(|row| row.id == item.id) {
                return Err(RemoteError::Backend(format!(
                    "duplicate row id: {}",
                    item.id
                )));
            }
            rows.push(item.clone());
        }
        self.subscribers.emit(&ChangeEvent::Inserted(item.clone()));
        Ok(())
    }

    async fn update(&self, id: ItemId, mutations: &[ItemMutation]) -> Result<(), RemoteError> {
        self.take_write_failure()?;
        let updated = {
            let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
            let row = rows
                .iter_mut()
                .find(|row| row.id == id)
                .ok_or(RemoteError::NotFound(id))?;
            for mutation in mutations {
                row.apply(mutation);
            }
            row.clone()
        };
        self.subscribers.emit(&ChangeEvent::Updated(updated));
        Ok(())
    }

    async fn delete(&self, id: ItemId) -> Result<(), RemoteError> {
        self.take_write_failure()?;
        {
            let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
            let position = rows
                .iter()
                .position(|row| row.id == id)
                .ok_or(RemoteError::NotFound(id))?;
            rows.remove(position);
        }
        self.subscribers.emit(&ChangeEvent::Deleted(id));
        Ok(())
    }

    fn subscribe(&self) -> UnboundedReceiver<ChangeEvent> {
        self.subscribers.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_item(name: &str) -> ShoppingItem {
        ShoppingItem::new(name, 1, "Pantry", None).unwrap()
    }

    #[tokio::test]
    async fn writes_echo_to_the_writers_own_feed() {
        let remote = MemoryRemote::new();
        let mut feed = remote.subscribe();

        let item = make_item("Rice");
        remote.insert(&item).await.unwrap();
        assert_eq!(feed.try_recv().unwrap(), ChangeEvent::Inserted(item.clone()));

        remote
            .update(item.id, &[ItemMutation::SetCompleted(true)])
            .await
            .unwrap();
        match feed.try_recv().unwrap() {
            ChangeEvent::Updated(row) => assert!(row.completed),
            other => panic!("unexpected event: {:?}", other),
        }

        remote.delete(item.id).await.unwrap();
        assert_eq!(feed.try_recv().unwrap(), ChangeEvent::Deleted(item.id));
    }

    #[tokio::test]
    async fn fetch_all_orders_by_creation_time() {
        let a = make_item("A");
        let mut b = make_item("B");
        b.created_at = a.created_at + chrono::Duration::milliseconds(5);
        let remote = MemoryRemote::with_rows(vec![b.clone(), a.clone()]);

        let rows = remote.fetch_all().await.unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);
    }

    #[tokio::test]
    async fn update_and_delete_of_missing_row_fail() {
        let remote = MemoryRemote::new();
        let id = uuid::Uuid::new_v4();
        assert!(matches!(
            remote.update(id, &[ItemMutation::SetQuantity(2)]).await,
            Err(RemoteError::NotFound(_))
        ));
        assert!(matches!(
            remote.delete(id).await,
            Err(RemoteError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn injected_failures_are_consumed_in_order() {
        let remote = MemoryRemote::new();
        remote.fail_nth_write(2);

        let a = make_item("A");
        let b = make_item("B");
        remote.insert(&a).await.unwrap();
        assert!(remote.insert(&b).await.is_err());
        remote.insert(&b).await.unwrap();
        assert_eq!(remote.rows().len(), 2);
    }

    #[tokio::test]
    async fn failed_writes_do_not_emit() {
        let remote = MemoryRemote::new();
        let mut feed = remote.subscribe();
        remote.fail_next_writes(1);

        assert!(remote.insert(&make_item("A")).await.is_err());
        assert!(feed.try_recv().is_err());
        assert!(remote.rows().is_empty());
    }
}
