mod channel;
pub mod config;
pub mod error;
pub mod memory;
pub mod remote;
pub mod store;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use config::{BackoffConfig, ConfigError, SyncConfig};
pub use error::SyncError;
pub use memory::MemoryRemote;
pub use remote::{RemoteError, RemoteStore};
pub use store::SyncedList;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRemote;
