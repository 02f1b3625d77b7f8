//! # Node Events
//!
//! Defines all event types that flow through the shared bus. Events are the
//! only coupling between subsystems: the mempool announces arrivals, the
//! assembler announces commits, the indexer announces completion, and the
//! reaction subsystem announces tally changes.

use shared_types::{
    Address, Block, BlockId, FeedId, FeedMessageId, PayloadKind, TransactionId,
};
use std::sync::Arc;

/// All events that can be published to the event bus.
#[derive(Debug, Clone)]
pub enum NodeEvent {
    // =========================================================================
    // MEMPOOL
    // =========================================================================
    /// A transaction was accepted into the mempool.
    /// Wakes a paused production scheduler.
    TransactionReceived {
        tx_id: TransactionId,
        payload_kind: PayloadKind,
    },

    // =========================================================================
    // BLOCK ASSEMBLY & STORAGE
    // =========================================================================
    /// A block was committed together with the chain-state row.
    /// The storage commit happened-before this event.
    BlockCreated { block: Arc<Block> },

    /// The genesis block was assembled on an empty store.
    BlockchainInitialized {
        block_id: BlockId,
        block_index: u64,
    },

    /// Storage failed inside assembly; the attempt was rolled back.
    StorageAlarm { context: String },

    // =========================================================================
    // TRANSACTION INDEXING
    // =========================================================================
    /// Every transaction of the block has been dispatched to its strategies.
    BlockIndexingCompleted { block_index: u64 },

    /// A strategy failed for one transaction; recorded as indexed-with-error.
    TransactionIndexingFailed {
        block_index: u64,
        tx_id: TransactionId,
        kind: &'static str,
    },

    /// A feed message row was written.
    FeedMessageIndexed {
        feed_id: FeedId,
        message_id: FeedMessageId,
    },

    /// A user was banned from a group feed.
    UserBannedFromGroup { feed_id: FeedId, banned: Address },

    // =========================================================================
    // REACTIONS
    // =========================================================================
    /// First vote landed for a message.
    ReactionTallyCreated {
        message_id: FeedMessageId,
        version: u64,
    },

    /// A tally changed (new voter or vote change).
    ReactionTallyUpdated {
        message_id: FeedMessageId,
        version: u64,
    },
}

impl NodeEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::TransactionReceived { .. } => EventTopic::Mempool,
            Self::BlockCreated { .. }
            | Self::BlockchainInitialized { .. }
            | Self::StorageAlarm { .. } => EventTopic::BlockStorage,
            Self::BlockIndexingCompleted { .. }
            | Self::TransactionIndexingFailed { .. }
            | Self::FeedMessageIndexed { .. }
            | Self::UserBannedFromGroup { .. } => EventTopic::Indexing,
            Self::ReactionTallyCreated { .. } | Self::ReactionTallyUpdated { .. } => {
                EventTopic::Reactions
            }
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTopic {
    Mempool,
    BlockStorage,
    Indexing,
    Reactions,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &NodeEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn received() -> NodeEvent {
        NodeEvent::TransactionReceived {
            tx_id: TransactionId::generate(),
            payload_kind: shared_types::payload::KIND_REWARD,
        }
    }

    #[test]
    fn test_event_topic_mapping() {
        assert_eq!(received().topic(), EventTopic::Mempool);
        assert_eq!(
            NodeEvent::BlockIndexingCompleted { block_index: 1 }.topic(),
            EventTopic::Indexing
        );
        assert_eq!(
            NodeEvent::ReactionTallyUpdated {
                message_id: FeedMessageId::generate(),
                version: 1,
            }
            .topic(),
            EventTopic::Reactions
        );
    }

    #[test]
    fn test_filter_all() {
        assert!(EventFilter::all().matches(&received()));
    }

    #[test]
    fn test_filter_by_topic() {
        let filter = EventFilter::topics(vec![EventTopic::Mempool]);
        assert!(filter.matches(&received()));
        assert!(!filter.matches(&NodeEvent::BlockIndexingCompleted { block_index: 0 }));
    }
}
