//! # Block Assembler & Storage
//!
//! Builds the next block from a mempool snapshot, links it to the chain
//! state, and persists block plus state pointer as one atomic unit. On
//! commit it emits `BlockCreated`; on an empty store it bootstraps the
//! genesis block and emits `BlockchainInitialized`.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod assembler;
pub mod cache;
pub mod ports;

pub use assembler::{warm_chain_state_cache, AssemblerConfig, BlockAssemblerService};
pub use cache::ChainStateCache;
pub use ports::PendingRemover;
