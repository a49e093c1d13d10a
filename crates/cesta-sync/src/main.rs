//! Cesta Sync Binary
//!
//! Connects a local store to a SQLite-backed remote and prints the list.
//! Useful for inspecting a database and smoke-testing the sync path:
//!
//! ```text
//! cesta-sync [path/to/remote.db]
//! ```

use std::path::PathBuf;

use cesta_core::{CategoryFilter, LocalCache, MemoryCache, ShoppingItem, SqliteCache};
use cesta_sync::{SqliteRemote, SyncConfig, SyncedList};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let config = SyncConfig::load_default()?;

    let database_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| config.resolve_database_path())
        .ok_or("no database path given and no platform data dir available")?;
    if let Some(parent) = database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let cache: Box<dyn LocalCache> = match config.resolve_cache_path() {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Box::new(SqliteCache::open(&path)?)
        }
        None => Box::new(MemoryCache::new()),
    };

    let remote = SqliteRemote::open(&database_path)?;
    let list = SyncedList::connect_with_backoff(remote, cache, config.backoff.clone()).await?;

    println!("categories: {}", list.categories().join(", "));

    let split = list.partition(&CategoryFilter::All);
    println!("\npending ({}):", split.pending.len());
    for item in &split.pending {
        print_item(item);
    }
    println!("\ncompleted ({}):", split.completed.len());
    for item in &split.completed {
        print_item(item);
    }

    list.shutdown();
    Ok(())
}

fn print_item(item: &ShoppingItem) {
    let emoji = item.emoji.as_deref().unwrap_or(" ");
    println!("  {} {} x{} [{}]", emoji, item.name, item.quantity, item.category);
}
