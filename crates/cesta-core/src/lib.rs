pub mod cache;
pub mod category;
pub mod error;
pub mod event;
pub mod filter;
pub mod item;
pub mod list;
pub mod store;

#[cfg(feature = "sqlite")]
pub mod sqlite_cache;

pub use cache::*;
pub use category::*;
pub use error::*;
pub use event::*;
pub use filter::*;
pub use item::*;
pub use list::*;
pub use store::*;

#[cfg(feature = "sqlite")]
pub use sqlite_cache::SqliteCache;
