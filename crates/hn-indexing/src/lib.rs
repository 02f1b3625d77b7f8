//! # Transaction Indexer
//!
//! Dispatches validated transactions from finalized blocks to typed
//! strategies that mutate query-serving projections: balances, profiles,
//! feeds, messages, group key generations. Strategies for reaction votes
//! and membership commitments are contributed by the reaction subsystem
//! and registered through the same [`StrategyRegistry`].
//!
//! ## Ordering
//!
//! Blocks are indexed one at a time in block-index order; within a block,
//! transactions are dispatched in block order and every matching strategy
//! completes before the next transaction starts.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod indexer;
pub mod strategies;
pub mod strategy;

pub use indexer::{IndexerSubscriber, TransactionIndexer};
pub use strategies::builtin_registry;
pub use strategy::{IndexStrategy, StrategyRegistry};
