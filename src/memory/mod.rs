//! Fact memory
//!
//! Facts extracted from notifications live in a `MemoryStore`, a
//! deduplicating append log with tag and substring lookup.

pub mod entry;
pub mod store;

pub use entry::{MemoryEntry, DEFAULT_IMPORTANCE};
pub use store::{MemoryStore, SharedMemory};
