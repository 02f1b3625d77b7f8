//! Built-in projection strategies.

mod feeds;
mod funds;
mod group;
mod message;
mod profile;
mod reward;

pub use feeds::{ChatFeedStrategy, PersonalFeedStrategy};
pub use funds::FundsTransferStrategy;
pub use group::GroupFeedLifecycleStrategy;
pub use message::FeedMessageStrategy;
pub use profile::ProfileStrategy;
pub use reward::RewardStrategy;

use crate::strategy::StrategyRegistry;
use hn_storage::SharedStorage;
use shared_bus::InMemoryEventBus;
use std::sync::Arc;

/// Register the built-in strategies in their canonical order. The reaction
/// strategy is contributed separately by the reaction subsystem.
#[must_use]
pub fn builtin_registry(storage: &SharedStorage, bus: &Arc<InMemoryEventBus>) -> StrategyRegistry {
    let mut registry = StrategyRegistry::new();
    registry.register(Arc::new(RewardStrategy::new(Arc::clone(storage))));
    registry.register(Arc::new(FundsTransferStrategy::new(Arc::clone(storage))));
    registry.register(Arc::new(ProfileStrategy::new(Arc::clone(storage))));
    registry.register(Arc::new(PersonalFeedStrategy::new(Arc::clone(storage))));
    registry.register(Arc::new(ChatFeedStrategy::new(Arc::clone(storage))));
    registry.register(Arc::new(GroupFeedLifecycleStrategy::new(
        Arc::clone(storage),
        Arc::clone(bus),
    )));
    registry.register(Arc::new(FeedMessageStrategy::new(
        Arc::clone(storage),
        Arc::clone(bus),
    )));
    registry
}
