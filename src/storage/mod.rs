//! Preflabel storage
//!
//! Canonical labels are persisted through the `PreflabelStore` trait. The
//! primary implementation is `SqlitePreflabelStore`; `MemoryPreflabelStore`
//! serves tests and short-lived sessions.

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryPreflabelStore;
pub use sqlite::SqlitePreflabelStore;
pub use traits::{OpenStore, PreflabelRecord, PreflabelStore, StorageError, StorageResult};
