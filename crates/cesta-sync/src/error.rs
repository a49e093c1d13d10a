//! Error types for synced list operations.

use cesta_core::StoreError;

use crate::remote::RemoteError;

/// Errors from synced list operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Remote write failed; the optimistic local change was reverted
    #[error("Remote error: {0}")]
    Remote(RemoteError),

    /// Initial snapshot fetch failed; no list was loaded
    #[error("Snapshot fetch failed: {0}")]
    Snapshot(RemoteError),
}
