//! # HushNode Runtime
//!
//! Configuration, subsystem wiring, and bootstrap for the node binary.
//! The RPC surfaces, push notifications, and credential file loading are
//! external collaborators; this crate wires the transaction-processing
//! core they talk to.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod wiring;

pub use config::NodeConfig;
pub use wiring::{build_node, Node};
