//! # Storage - Unit-of-Work Ports and Reference Adapter
//!
//! Persisted rows are owned by storage and exposed through scoped units of
//! work: read-only scopes for queries, writable scopes that batch mutations
//! into one atomic commit. The blockchain-state row and its block are
//! committed through a single scope, which is what makes block publication
//! imply the storage commit happened-before.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod cached;
pub mod memory;
pub mod ports;

pub use cached::CachedStorage;
pub use memory::MemoryStorage;
pub use ports::{
    now, IndexingErrorRecord, ReadScope, SharedStorage, Storage, WriteScope, TALLY_SYNC_LIMIT,
};
