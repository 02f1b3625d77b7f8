//! # Shared Bus - Event Bus for Inter-Subsystem Communication
//!
//! Single-process pub-sub over typed messages. Subsystems never call each
//! other directly: the mempool, scheduler, assembler, indexer, and reaction
//! subsystem are coupled only through the events in [`events::NodeEvent`].
//!
//! ## Guarantees
//!
//! - Publication order is delivery order for every subscriber.
//! - A registered handler processes events strictly one at a time; handler
//!   *n+1* begins only after *n* returns.
//! - A failing or panicking handler is logged and isolated; other handlers
//!   keep receiving.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventTopic, NodeEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{
    spawn_subscriber, EventStream, EventSubscriber, Subscription, SubscriptionError,
};

/// Maximum events to buffer per subscriber before backpressure.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
