//! # HushNode Test Suite
//!
//! End-to-end scenarios across the transaction-processing pipeline:
//! genesis bootstrap, scheduler pause/resume, balance projections,
//! anonymous reaction flows, and chain invariants.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod support;

#[cfg(test)]
mod integration;
