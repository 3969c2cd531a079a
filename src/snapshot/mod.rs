//! Snapshot Module
//!
//! Persists the frequency table so a restart does not lose the counts or pay for
//! another backfill.
//!
//! ## Submodules
//! - **`store`**: The `SnapshotStore` trait and the on-disk `FileStore` (JSON, same shape as `GET /words`).
//! - **`manager`**: Restore-or-backfill at startup and the periodic save loop.

pub mod manager;
pub mod store;

#[cfg(test)]
mod tests;
