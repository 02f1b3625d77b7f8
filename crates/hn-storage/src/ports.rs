//! # Storage Ports
//!
//! Scoped unit-of-work interfaces over persisted state. Readers take a
//! read-only scope; writers open a scope, stage mutations, and commit or
//! drop. Dropping a write scope without committing discards every staged
//! mutation, so release is guaranteed on all exit paths.
//!
//! The embedded database driver behind these ports is an external
//! collaborator; [`crate::memory::MemoryStorage`] is the reference adapter.

use async_trait::async_trait;
use shared_types::{
    AddressBalance, Address, BalanceRecord, Block, BlockId, BlockchainState, Bytes32,
    DomainError, Feed, FeedId, FeedMemberCommitment, FeedMessage, FeedMessageId,
    FeedParticipant, GroupFeedKeyGeneration, MerkleRootHistory, Profile, ReactionNullifier,
    ReactionTally, ReactionTransactionRecord, Timestamp, Token, TransactionId,
};

/// Maximum rows returned by [`ReadScope::tallies_since`].
pub const TALLY_SYNC_LIMIT: usize = 1000;

/// A transaction recorded as indexed-with-error; never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexingErrorRecord {
    pub tx_id: TransactionId,
    pub block_index: u64,
    pub kind: String,
}

/// Entry point: hands out scoped units of work.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Open a read-only scope.
    async fn read(&self) -> Result<Box<dyn ReadScope>, DomainError>;

    /// Open a writable scope. Mutations are staged and applied atomically
    /// on [`WriteScope::commit`].
    async fn begin_write(&self) -> Result<Box<dyn WriteScope>, DomainError>;
}

/// Read-only view of persisted state.
#[async_trait]
pub trait ReadScope: Send + Sync {
    // --- chain ---
    async fn chain_state(&self) -> Result<Option<BlockchainState>, DomainError>;
    async fn block_by_index(&self, index: u64) -> Result<Option<Block>, DomainError>;
    async fn block_by_id(&self, id: BlockId) -> Result<Option<Block>, DomainError>;
    async fn block_count(&self) -> Result<u64, DomainError>;

    // --- balances ---
    async fn balance(&self, address: Address, token: Token)
        -> Result<AddressBalance, DomainError>;

    // --- profiles ---
    async fn profile(&self, address: Address) -> Result<Option<Profile>, DomainError>;

    // --- feeds ---
    async fn feed(&self, feed_id: FeedId) -> Result<Option<Feed>, DomainError>;
    async fn participants(&self, feed_id: FeedId) -> Result<Vec<FeedParticipant>, DomainError>;
    async fn participant(
        &self,
        feed_id: FeedId,
        address: Address,
    ) -> Result<Option<FeedParticipant>, DomainError>;
    async fn message(&self, message_id: FeedMessageId)
        -> Result<Option<FeedMessage>, DomainError>;
    async fn messages_in_feed(&self, feed_id: FeedId) -> Result<Vec<FeedMessage>, DomainError>;
    async fn key_generations(
        &self,
        feed_id: FeedId,
    ) -> Result<Vec<GroupFeedKeyGeneration>, DomainError>;

    // --- reactions ---
    async fn tally(&self, message_id: FeedMessageId)
        -> Result<Option<ReactionTally>, DomainError>;
    async fn max_tally_version(&self) -> Result<u64, DomainError>;
    /// Tallies with `version > since_version` for the given feeds and
    /// `total_count > 0`, ascending by version, capped at
    /// [`TALLY_SYNC_LIMIT`].
    async fn tallies_since(
        &self,
        feed_ids: &[FeedId],
        since_version: u64,
    ) -> Result<Vec<ReactionTally>, DomainError>;
    async fn nullifier(
        &self,
        nullifier: Bytes32,
    ) -> Result<Option<ReactionNullifier>, DomainError>;

    // --- membership ---
    /// Commitments in insertion order; index in the result is the leaf index.
    async fn member_commitments(
        &self,
        feed_id: FeedId,
    ) -> Result<Vec<FeedMemberCommitment>, DomainError>;
    /// Most recent roots first.
    async fn recent_roots(
        &self,
        feed_id: FeedId,
        limit: usize,
    ) -> Result<Vec<MerkleRootHistory>, DomainError>;

    // --- indexing bookkeeping ---
    async fn indexing_error(
        &self,
        tx_id: TransactionId,
    ) -> Result<Option<IndexingErrorRecord>, DomainError>;
}

/// A writable unit of work. All mutations are staged in memory and applied
/// as one atomic batch on commit; dropping the scope rolls back.
#[async_trait]
pub trait WriteScope: Send {
    // --- chain ---
    fn insert_block(&mut self, block: Block);
    fn upsert_chain_state(&mut self, state: BlockchainState);

    // --- balances ---
    fn upsert_balance(&mut self, record: BalanceRecord);

    // --- profiles ---
    fn upsert_profile(&mut self, profile: Profile);

    // --- feeds ---
    fn upsert_feed(&mut self, feed: Feed);
    fn delete_feed(&mut self, feed_id: FeedId);
    fn upsert_participant(&mut self, participant: FeedParticipant);
    fn remove_participant(&mut self, feed_id: FeedId, address: Address);
    fn insert_message(&mut self, message: FeedMessage);
    fn insert_key_generation(&mut self, generation: GroupFeedKeyGeneration);

    // --- reactions ---
    fn upsert_tally(&mut self, tally: ReactionTally);
    fn upsert_nullifier(&mut self, nullifier: ReactionNullifier);
    fn insert_reaction_record(&mut self, record: ReactionTransactionRecord);

    // --- membership ---
    fn insert_member_commitment(&mut self, commitment: FeedMemberCommitment);
    fn insert_root_history(&mut self, entry: MerkleRootHistory);

    // --- indexing bookkeeping ---
    fn record_indexing_error(&mut self, record: IndexingErrorRecord);

    /// Apply every staged mutation atomically.
    async fn commit(self: Box<Self>) -> Result<(), DomainError>;
}

/// Convenience alias used by services that hold a storage handle.
pub type SharedStorage = std::sync::Arc<dyn Storage>;

/// Helper for insertion timestamps in rows created by the indexer.
#[must_use]
pub fn now() -> Timestamp {
    chrono::Utc::now()
}
