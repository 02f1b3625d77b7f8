//! # In-Memory Storage Adapter
//!
//! Reference implementation of the storage ports. Mutations staged in a
//! write scope are applied under a single write lock, so a commit is atomic
//! with respect to every reader and every other writer.

use crate::ports::{
    IndexingErrorRecord, ReadScope, Storage, WriteScope, TALLY_SYNC_LIMIT,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{
    Address, AddressBalance, BalanceRecord, Block, BlockId, BlockchainState, Bytes32,
    DomainError, Feed, FeedId, FeedMemberCommitment, FeedMessage, FeedMessageId,
    FeedParticipant, GroupFeedKeyGeneration, MerkleRootHistory, Profile, ReactionNullifier,
    ReactionTally, ReactionTransactionRecord, Token, TransactionId,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::trace;

#[derive(Default)]
struct Inner {
    chain_state: Option<BlockchainState>,
    blocks_by_index: BTreeMap<u64, Block>,
    block_index_by_id: HashMap<BlockId, u64>,
    balances: HashMap<(Address, Token), BalanceRecord>,
    profiles: HashMap<Address, Profile>,
    feeds: HashMap<FeedId, Feed>,
    participants: HashMap<FeedId, BTreeMap<Address, FeedParticipant>>,
    messages: HashMap<FeedMessageId, FeedMessage>,
    feed_messages: HashMap<FeedId, Vec<FeedMessageId>>,
    key_generations: HashMap<FeedId, Vec<GroupFeedKeyGeneration>>,
    tallies: HashMap<FeedMessageId, ReactionTally>,
    nullifiers: HashMap<Bytes32, ReactionNullifier>,
    reaction_records: Vec<ReactionTransactionRecord>,
    member_commitments: HashMap<FeedId, Vec<FeedMemberCommitment>>,
    root_history: HashMap<FeedId, Vec<MerkleRootHistory>>,
    indexing_errors: HashMap<TransactionId, IndexingErrorRecord>,
}

/// In-memory storage backend.
#[derive(Default)]
pub struct MemoryStorage {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap in the `Arc<dyn Storage>` handle services expect.
    #[must_use]
    pub fn shared() -> crate::ports::SharedStorage {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn read(&self) -> Result<Box<dyn ReadScope>, DomainError> {
        Ok(Box::new(MemoryReadScope {
            inner: Arc::clone(&self.inner),
        }))
    }

    async fn begin_write(&self) -> Result<Box<dyn WriteScope>, DomainError> {
        Ok(Box::new(MemoryWriteScope {
            inner: Arc::clone(&self.inner),
            ops: Vec::new(),
        }))
    }
}

struct MemoryReadScope {
    inner: Arc<RwLock<Inner>>,
}

#[async_trait]
impl ReadScope for MemoryReadScope {
    async fn chain_state(&self) -> Result<Option<BlockchainState>, DomainError> {
        Ok(self.inner.read().chain_state.clone())
    }

    async fn block_by_index(&self, index: u64) -> Result<Option<Block>, DomainError> {
        Ok(self.inner.read().blocks_by_index.get(&index).cloned())
    }

    async fn block_by_id(&self, id: BlockId) -> Result<Option<Block>, DomainError> {
        let inner = self.inner.read();
        Ok(inner
            .block_index_by_id
            .get(&id)
            .and_then(|index| inner.blocks_by_index.get(index))
            .cloned())
    }

    async fn block_count(&self) -> Result<u64, DomainError> {
        Ok(self.inner.read().blocks_by_index.len() as u64)
    }

    async fn balance(
        &self,
        address: Address,
        token: Token,
    ) -> Result<AddressBalance, DomainError> {
        let inner = self.inner.read();
        Ok(match inner.balances.get(&(address, token.clone())) {
            Some(rec) => AddressBalance::Existing(rec.clone()),
            None => AddressBalance::NoBalance { address, token },
        })
    }

    async fn profile(&self, address: Address) -> Result<Option<Profile>, DomainError> {
        Ok(self.inner.read().profiles.get(&address).cloned())
    }

    async fn feed(&self, feed_id: FeedId) -> Result<Option<Feed>, DomainError> {
        Ok(self.inner.read().feeds.get(&feed_id).cloned())
    }

    async fn participants(&self, feed_id: FeedId) -> Result<Vec<FeedParticipant>, DomainError> {
        Ok(self
            .inner
            .read()
            .participants
            .get(&feed_id)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn participant(
        &self,
        feed_id: FeedId,
        address: Address,
    ) -> Result<Option<FeedParticipant>, DomainError> {
        Ok(self
            .inner
            .read()
            .participants
            .get(&feed_id)
            .and_then(|m| m.get(&address))
            .cloned())
    }

    async fn message(
        &self,
        message_id: FeedMessageId,
    ) -> Result<Option<FeedMessage>, DomainError> {
        Ok(self.inner.read().messages.get(&message_id).cloned())
    }

    async fn messages_in_feed(&self, feed_id: FeedId) -> Result<Vec<FeedMessage>, DomainError> {
        let inner = self.inner.read();
        Ok(inner
            .feed_messages
            .get(&feed_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.messages.get(id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn key_generations(
        &self,
        feed_id: FeedId,
    ) -> Result<Vec<GroupFeedKeyGeneration>, DomainError> {
        Ok(self
            .inner
            .read()
            .key_generations
            .get(&feed_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn tally(
        &self,
        message_id: FeedMessageId,
    ) -> Result<Option<ReactionTally>, DomainError> {
        Ok(self.inner.read().tallies.get(&message_id).cloned())
    }

    async fn max_tally_version(&self) -> Result<u64, DomainError> {
        Ok(self
            .inner
            .read()
            .tallies
            .values()
            .map(|t| t.version)
            .max()
            .unwrap_or(0))
    }

    async fn tallies_since(
        &self,
        feed_ids: &[FeedId],
        since_version: u64,
    ) -> Result<Vec<ReactionTally>, DomainError> {
        let inner = self.inner.read();
        let mut rows: Vec<ReactionTally> = inner
            .tallies
            .values()
            .filter(|t| {
                t.version > since_version && t.total_count > 0 && feed_ids.contains(&t.feed_id)
            })
            .cloned()
            .collect();
        rows.sort_by_key(|t| t.version);
        rows.truncate(TALLY_SYNC_LIMIT);
        Ok(rows)
    }

    async fn nullifier(
        &self,
        nullifier: Bytes32,
    ) -> Result<Option<ReactionNullifier>, DomainError> {
        Ok(self.inner.read().nullifiers.get(&nullifier).cloned())
    }

    async fn member_commitments(
        &self,
        feed_id: FeedId,
    ) -> Result<Vec<FeedMemberCommitment>, DomainError> {
        Ok(self
            .inner
            .read()
            .member_commitments
            .get(&feed_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn recent_roots(
        &self,
        feed_id: FeedId,
        limit: usize,
    ) -> Result<Vec<MerkleRootHistory>, DomainError> {
        Ok(self
            .inner
            .read()
            .root_history
            .get(&feed_id)
            .map(|log| log.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn indexing_error(
        &self,
        tx_id: TransactionId,
    ) -> Result<Option<IndexingErrorRecord>, DomainError> {
        Ok(self.inner.read().indexing_errors.get(&tx_id).cloned())
    }
}

/// Staged mutation, applied on commit.
enum WriteOp {
    InsertBlock(Block),
    UpsertChainState(BlockchainState),
    UpsertBalance(BalanceRecord),
    UpsertProfile(Profile),
    UpsertFeed(Feed),
    DeleteFeed(FeedId),
    UpsertParticipant(FeedParticipant),
    RemoveParticipant(FeedId, Address),
    InsertMessage(FeedMessage),
    InsertKeyGeneration(GroupFeedKeyGeneration),
    UpsertTally(ReactionTally),
    UpsertNullifier(ReactionNullifier),
    InsertReactionRecord(ReactionTransactionRecord),
    InsertMemberCommitment(FeedMemberCommitment),
    InsertRootHistory(MerkleRootHistory),
    RecordIndexingError(IndexingErrorRecord),
}

struct MemoryWriteScope {
    inner: Arc<RwLock<Inner>>,
    ops: Vec<WriteOp>,
}

#[async_trait]
impl WriteScope for MemoryWriteScope {
    fn insert_block(&mut self, block: Block) {
        self.ops.push(WriteOp::InsertBlock(block));
    }

    fn upsert_chain_state(&mut self, state: BlockchainState) {
        self.ops.push(WriteOp::UpsertChainState(state));
    }

    fn upsert_balance(&mut self, record: BalanceRecord) {
        self.ops.push(WriteOp::UpsertBalance(record));
    }

    fn upsert_profile(&mut self, profile: Profile) {
        self.ops.push(WriteOp::UpsertProfile(profile));
    }

    fn upsert_feed(&mut self, feed: Feed) {
        self.ops.push(WriteOp::UpsertFeed(feed));
    }

    fn delete_feed(&mut self, feed_id: FeedId) {
        self.ops.push(WriteOp::DeleteFeed(feed_id));
    }

    fn upsert_participant(&mut self, participant: FeedParticipant) {
        self.ops.push(WriteOp::UpsertParticipant(participant));
    }

    fn remove_participant(&mut self, feed_id: FeedId, address: Address) {
        self.ops.push(WriteOp::RemoveParticipant(feed_id, address));
    }

    fn insert_message(&mut self, message: FeedMessage) {
        self.ops.push(WriteOp::InsertMessage(message));
    }

    fn insert_key_generation(&mut self, generation: GroupFeedKeyGeneration) {
        self.ops.push(WriteOp::InsertKeyGeneration(generation));
    }

    fn upsert_tally(&mut self, tally: ReactionTally) {
        self.ops.push(WriteOp::UpsertTally(tally));
    }

    fn upsert_nullifier(&mut self, nullifier: ReactionNullifier) {
        self.ops.push(WriteOp::UpsertNullifier(nullifier));
    }

    fn insert_reaction_record(&mut self, record: ReactionTransactionRecord) {
        self.ops.push(WriteOp::InsertReactionRecord(record));
    }

    fn insert_member_commitment(&mut self, commitment: FeedMemberCommitment) {
        self.ops.push(WriteOp::InsertMemberCommitment(commitment));
    }

    fn insert_root_history(&mut self, entry: MerkleRootHistory) {
        self.ops.push(WriteOp::InsertRootHistory(entry));
    }

    fn record_indexing_error(&mut self, record: IndexingErrorRecord) {
        self.ops.push(WriteOp::RecordIndexingError(record));
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        let MemoryWriteScope { inner, ops } = *self;
        let mut guard = inner.write();
        trace!(ops = ops.len(), "Applying write scope");
        for op in ops {
            apply(&mut guard, op);
        }
        Ok(())
    }
}

fn apply(inner: &mut Inner, op: WriteOp) {
    match op {
        WriteOp::InsertBlock(block) => {
            inner.block_index_by_id.insert(block.block_id, block.block_index);
            inner.blocks_by_index.insert(block.block_index, block);
        }
        WriteOp::UpsertChainState(state) => inner.chain_state = Some(state),
        WriteOp::UpsertBalance(rec) => {
            inner
                .balances
                .insert((rec.address, rec.token.clone()), rec);
        }
        WriteOp::UpsertProfile(profile) => {
            inner.profiles.insert(profile.address, profile);
        }
        WriteOp::UpsertFeed(feed) => {
            inner.feeds.insert(feed.feed_id, feed);
        }
        WriteOp::DeleteFeed(feed_id) => {
            inner.feeds.remove(&feed_id);
            inner.participants.remove(&feed_id);
        }
        WriteOp::UpsertParticipant(p) => {
            inner
                .participants
                .entry(p.feed_id)
                .or_default()
                .insert(p.participant_address, p);
        }
        WriteOp::RemoveParticipant(feed_id, address) => {
            if let Some(members) = inner.participants.get_mut(&feed_id) {
                members.remove(&address);
            }
        }
        WriteOp::InsertMessage(message) => {
            inner
                .feed_messages
                .entry(message.feed_id)
                .or_default()
                .push(message.message_id);
            inner.messages.insert(message.message_id, message);
        }
        WriteOp::InsertKeyGeneration(generation) => {
            inner
                .key_generations
                .entry(generation.feed_id)
                .or_default()
                .push(generation);
        }
        WriteOp::UpsertTally(tally) => {
            inner.tallies.insert(tally.message_id, tally);
        }
        WriteOp::UpsertNullifier(nullifier) => {
            inner.nullifiers.insert(nullifier.nullifier, nullifier);
        }
        WriteOp::InsertReactionRecord(record) => inner.reaction_records.push(record),
        WriteOp::InsertMemberCommitment(commitment) => {
            inner
                .member_commitments
                .entry(commitment.feed_id)
                .or_default()
                .push(commitment);
        }
        WriteOp::InsertRootHistory(entry) => {
            inner.root_history.entry(entry.feed_id).or_default().push(entry);
        }
        WriteOp::RecordIndexingError(record) => {
            inner.indexing_errors.insert(record.tx_id, record);
        }
    }
}
