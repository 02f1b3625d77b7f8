//! # Cached Storage Decorator
//!
//! Wraps a storage backend with process-wide caches for the hot feed
//! projections (feed rows and participant sets). Caches are populated on
//! first read, served until invalidated, and cleared after every indexed
//! block. Writes pass straight through to the inner backend.
//!
//! A cache entry is only ever a copy of committed state, so a stale hit
//! is bounded by one block and a miss silently falls through to storage.

use crate::ports::{IndexingErrorRecord, ReadScope, SharedStorage, Storage, WriteScope};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{
    Address, AddressBalance, Block, BlockId, BlockchainState, Bytes32, DomainError, Feed,
    FeedId, FeedMemberCommitment, FeedMessage, FeedMessageId, FeedParticipant,
    GroupFeedKeyGeneration, MerkleRootHistory, Profile, ReactionNullifier, ReactionTally,
    Token, TransactionId,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Default)]
struct ProjectionCaches {
    feeds: HashMap<FeedId, Option<Feed>>,
    participants: HashMap<FeedId, Vec<FeedParticipant>>,
}

/// Storage decorator with feed-projection caches.
pub struct CachedStorage {
    inner: SharedStorage,
    caches: Arc<RwLock<ProjectionCaches>>,
}

impl CachedStorage {
    #[must_use]
    pub fn new(inner: SharedStorage) -> Self {
        Self {
            inner,
            caches: Arc::new(RwLock::new(ProjectionCaches::default())),
        }
    }

    /// Drop every cached projection; called after each indexed block.
    pub fn invalidate_projections(&self) {
        let mut caches = self.caches.write();
        caches.feeds.clear();
        caches.participants.clear();
        debug!("Projection caches invalidated");
    }
}

#[async_trait]
impl Storage for CachedStorage {
    async fn read(&self) -> Result<Box<dyn ReadScope>, DomainError> {
        Ok(Box::new(CachedReadScope {
            inner: self.inner.read().await?,
            caches: Arc::clone(&self.caches),
        }))
    }

    async fn begin_write(&self) -> Result<Box<dyn WriteScope>, DomainError> {
        self.inner.begin_write().await
    }
}

struct CachedReadScope {
    inner: Box<dyn ReadScope>,
    caches: Arc<RwLock<ProjectionCaches>>,
}

#[async_trait]
impl ReadScope for CachedReadScope {
    async fn chain_state(&self) -> Result<Option<BlockchainState>, DomainError> {
        self.inner.chain_state().await
    }

    async fn block_by_index(&self, index: u64) -> Result<Option<Block>, DomainError> {
        self.inner.block_by_index(index).await
    }

    async fn block_by_id(&self, id: BlockId) -> Result<Option<Block>, DomainError> {
        self.inner.block_by_id(id).await
    }

    async fn block_count(&self) -> Result<u64, DomainError> {
        self.inner.block_count().await
    }

    async fn balance(
        &self,
        address: Address,
        token: Token,
    ) -> Result<AddressBalance, DomainError> {
        self.inner.balance(address, token).await
    }

    async fn profile(&self, address: Address) -> Result<Option<Profile>, DomainError> {
        self.inner.profile(address).await
    }

    async fn feed(&self, feed_id: FeedId) -> Result<Option<Feed>, DomainError> {
        if let Some(cached) = self.caches.read().feeds.get(&feed_id) {
            return Ok(cached.clone());
        }
        let feed = self.inner.feed(feed_id).await?;
        self.caches.write().feeds.insert(feed_id, feed.clone());
        Ok(feed)
    }

    async fn participants(&self, feed_id: FeedId) -> Result<Vec<FeedParticipant>, DomainError> {
        if let Some(cached) = self.caches.read().participants.get(&feed_id) {
            return Ok(cached.clone());
        }
        let participants = self.inner.participants(feed_id).await?;
        self.caches
            .write()
            .participants
            .insert(feed_id, participants.clone());
        Ok(participants)
    }

    async fn participant(
        &self,
        feed_id: FeedId,
        address: Address,
    ) -> Result<Option<FeedParticipant>, DomainError> {
        Ok(self
            .participants(feed_id)
            .await?
            .into_iter()
            .find(|p| p.participant_address == address))
    }

    async fn message(
        &self,
        message_id: FeedMessageId,
    ) -> Result<Option<FeedMessage>, DomainError> {
        self.inner.message(message_id).await
    }

    async fn messages_in_feed(&self, feed_id: FeedId) -> Result<Vec<FeedMessage>, DomainError> {
        self.inner.messages_in_feed(feed_id).await
    }

    async fn key_generations(
        &self,
        feed_id: FeedId,
    ) -> Result<Vec<GroupFeedKeyGeneration>, DomainError> {
        self.inner.key_generations(feed_id).await
    }

    async fn tally(
        &self,
        message_id: FeedMessageId,
    ) -> Result<Option<ReactionTally>, DomainError> {
        self.inner.tally(message_id).await
    }

    async fn max_tally_version(&self) -> Result<u64, DomainError> {
        self.inner.max_tally_version().await
    }

    async fn tallies_since(
        &self,
        feed_ids: &[FeedId],
        since_version: u64,
    ) -> Result<Vec<ReactionTally>, DomainError> {
        self.inner.tallies_since(feed_ids, since_version).await
    }

    async fn nullifier(
        &self,
        nullifier: Bytes32,
    ) -> Result<Option<ReactionNullifier>, DomainError> {
        self.inner.nullifier(nullifier).await
    }

    async fn member_commitments(
        &self,
        feed_id: FeedId,
    ) -> Result<Vec<FeedMemberCommitment>, DomainError> {
        self.inner.member_commitments(feed_id).await
    }

    async fn recent_roots(
        &self,
        feed_id: FeedId,
        limit: usize,
    ) -> Result<Vec<MerkleRootHistory>, DomainError> {
        self.inner.recent_roots(feed_id, limit).await
    }

    async fn indexing_error(
        &self,
        tx_id: TransactionId,
    ) -> Result<Option<IndexingErrorRecord>, DomainError> {
        self.inner.indexing_error(tx_id).await
    }
}
