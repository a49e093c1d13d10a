//! SQLite remote integration tests
//!
//! The same sync flows over a real database file: state must survive a
//! full teardown and reopen.

#![cfg(feature = "sqlite")]

mod common;

use std::sync::Arc;

use cesta_core::MemoryCache;
use cesta_sync::{RemoteStore, SqliteRemote, SyncedList};

use common::fixtures::{settle, small_backoff};

fn cache() -> Box<MemoryCache> {
    Box::new(MemoryCache::new())
}

#[tokio::test]
async fn full_flow_survives_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("remote.db");

    let item_id = {
        let remote = SqliteRemote::open(&path).unwrap();
        let list = SyncedList::connect_with_backoff(remote, cache(), small_backoff())
            .await
            .unwrap();

        let item = list.add("Milk", 2, "Dairy", Some("🥛")).await.unwrap();
        list.edit(item.id, "Oat milk", "Beverages", None)
            .await
            .unwrap();
        list.toggle_completed(item.id).await.unwrap();
        list.shutdown();
        item.id
    };

    let remote = SqliteRemote::open(&path).unwrap();
    let rows = remote.fetch_all().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, item_id);
    assert_eq!(rows[0].name, "Oat milk");
    assert_eq!(rows[0].category, "Beverages");
    assert_eq!(rows[0].emoji, None);
    assert!(rows[0].completed);
}

#[tokio::test]
async fn connect_picks_up_rows_written_earlier() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("remote.db");

    {
        let remote = SqliteRemote::open(&path).unwrap();
        let list = SyncedList::connect_with_backoff(remote, cache(), small_backoff())
            .await
            .unwrap();
        list.add("Apple", 1, "Fruits", None).await.unwrap();
        list.add("Bread", 1, "Pantry", None).await.unwrap();
        list.shutdown();
    }

    let remote = SqliteRemote::open(&path).unwrap();
    let list = SyncedList::connect_with_backoff(remote, cache(), small_backoff())
        .await
        .unwrap();
    let names: Vec<String> = list.items().iter().map(|i| i.name.clone()).collect();
    assert_eq!(names, ["Apple", "Bread"]);
}

#[tokio::test]
async fn two_clients_share_one_database() {
    let remote = Arc::new(SqliteRemote::open_in_memory().unwrap());
    let alice = SyncedList::connect_with_backoff(Arc::clone(&remote), cache(), small_backoff())
        .await
        .unwrap();
    let bob = SyncedList::connect_with_backoff(Arc::clone(&remote), cache(), small_backoff())
        .await
        .unwrap();

    let item = alice.add("Milk", 1, "Dairy", None).await.unwrap();
    settle().await;
    assert_eq!(bob.items().len(), 1);

    bob.toggle_completed(item.id).await.unwrap();
    settle().await;
    assert!(alice.get(item.id).unwrap().completed);
}
