//! Shared helpers for sync integration tests.

use std::time::Duration;

use cesta_core::ShoppingItem;
use cesta_sync::BackoffConfig;

#[allow(dead_code)]
pub fn make_item(name: &str, category: &str) -> ShoppingItem {
    ShoppingItem::new(name, 1, category, None).unwrap()
}

/// Give the reconciliation task a chance to drain the feed.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(25)).await;
}

/// Backoff tuned so reconnect tests finish quickly.
pub fn small_backoff() -> BackoffConfig {
    BackoffConfig {
        initial_ms: 10,
        max_ms: 40,
    }
}
