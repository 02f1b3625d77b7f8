//! # Block Assembler
//!
//! Builds the next block from a mempool snapshot and commits it together
//! with the chain-state row in one writable scope.
//!
//! ## Assembly
//!
//! 1. Read the chain state (cache first, storage on a cold start).
//! 2. The new block's id is the state's pre-generated `next`; a fresh
//!    `next_next` id is generated for the block after it.
//! 3. A producer-issued reward is always the first entry.
//! 4. User transactions keep mempool FIFO order; equal timestamps break
//!    ties by transaction id.
//! 5. The hash covers `(index, previous, current, next, timestamp,
//!    ordered tx digests)`.
//! 6. Block insert and chain-state upsert commit or roll back together.
//! 7. Only after commit: mempool removal and `BlockCreated`.
//!
//! With no chain state at all, the same path assembles the genesis block
//! (index 0, empty previous, only the initial reward) and additionally
//! emits `BlockchainInitialized`.

use crate::cache::ChainStateCache;
use crate::ports::PendingRemover;
use async_trait::async_trait;
use hn_block_production::BlockAssembler;
use hn_credentials::ProducerIdentity;
use hn_storage::{ReadScope as _, SharedStorage, WriteScope as _};
use shared_bus::{EventPublisher, InMemoryEventBus, NodeEvent};
use shared_types::payload::RewardPayload;
use shared_types::{
    Amount, Block, BlockId, BlockchainState, BlockchainStateId, DomainError, Token,
    TransactionPayload, UnsignedTransaction, UserSignature, ValidatedTransaction,
    ValidatorSignature, AMOUNT_PRECISION,
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Assembler configuration.
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Reward minted to the producer in every block.
    pub block_reward: Amount,
    pub reward_token: Token,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            block_reward: Amount::from_tokens(10),
            reward_token: Token::native(),
        }
    }
}

/// Component E: block assembler and chain-state owner.
pub struct BlockAssemblerService {
    config: AssemblerConfig,
    storage: SharedStorage,
    cache: Arc<ChainStateCache>,
    producer: Arc<ProducerIdentity>,
    mempool: Arc<dyn PendingRemover>,
    bus: Arc<InMemoryEventBus>,
}

impl BlockAssemblerService {
    #[must_use]
    pub fn new(
        config: AssemblerConfig,
        storage: SharedStorage,
        cache: Arc<ChainStateCache>,
        producer: Arc<ProducerIdentity>,
        mempool: Arc<dyn PendingRemover>,
        bus: Arc<InMemoryEventBus>,
    ) -> Self {
        Self {
            config,
            storage,
            cache,
            producer,
            mempool,
            bus,
        }
    }

    /// Current chain state: cache first, storage on miss.
    async fn current_state(&self) -> Result<Option<BlockchainState>, DomainError> {
        if let Some(state) = self.cache.get() {
            return Ok(Some(state));
        }
        let read = self.storage.read().await?;
        let state = read.chain_state().await?;
        if let Some(ref s) = state {
            self.cache.set(s.clone());
        }
        Ok(state)
    }

    /// Producer-issued reward, signed and co-signed by the producer.
    fn reward_transaction(&self) -> Result<ValidatedTransaction, DomainError> {
        let unsigned = UnsignedTransaction::new(
            chrono::Utc::now(),
            TransactionPayload::Reward(RewardPayload {
                token: self.config.reward_token.clone(),
                precision: AMOUNT_PRECISION,
                amount: self.config.block_reward,
                to: self.producer.address(),
            }),
        );
        let bytes = unsigned
            .signing_bytes()
            .map_err(|e| DomainError::MalformedPayload(e.to_string()))?;
        let signature = self.producer.sign(&bytes);
        let signed = unsigned.into_signed(UserSignature {
            signatory: self.producer.address(),
            signature,
        });
        let validator_signature = self.producer.co_sign(&signed.user_signature.signature);
        let validator = self.producer.address();
        Ok(signed.into_validated(ValidatorSignature {
            validator,
            signature: validator_signature,
        }))
    }

    /// Reward first, then user transactions in FIFO order with equal
    /// timestamps tie-broken by transaction id.
    fn order_transactions(
        reward: ValidatedTransaction,
        mut pending: Vec<ValidatedTransaction>,
    ) -> Vec<ValidatedTransaction> {
        pending.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        let mut ordered = Vec::with_capacity(pending.len() + 1);
        ordered.push(reward);
        ordered.extend(pending);
        ordered
    }

    async fn commit_block(
        &self,
        block: Block,
        state: BlockchainState,
    ) -> Result<(), DomainError> {
        let mut scope = self.storage.begin_write().await?;
        scope.insert_block(block);
        scope.upsert_chain_state(state);
        scope.commit().await
    }
}

#[async_trait]
impl BlockAssembler for BlockAssemblerService {
    async fn assemble(&self, pending: Vec<ValidatedTransaction>) -> Result<(), DomainError> {
        let timestamp = chrono::Utc::now();
        let reward = self.reward_transaction()?;

        let (block, new_state, is_genesis) = match self.current_state().await? {
            Some(state) => {
                let block_id = state.next_block_id;
                let next_id = BlockId::generate();
                let transactions = Self::order_transactions(reward, pending);
                let hash = Block::compute_hash(
                    state.block_index + 1,
                    state.current_block_id,
                    block_id,
                    next_id,
                    &timestamp,
                    &transactions,
                )
                .map_err(|e| DomainError::MalformedPayload(e.to_string()))?;
                let block = Block {
                    block_id,
                    block_index: state.block_index + 1,
                    previous_block_id: state.current_block_id,
                    next_block_id: next_id,
                    timestamp,
                    transactions,
                    hash,
                };
                (block, state.advanced(next_id), false)
            }
            None => {
                // Genesis carries only the initial reward; pending
                // transactions stay queued for block 1.
                let block_id = BlockId::generate();
                let next_id = BlockId::generate();
                let transactions = vec![reward];
                let hash = Block::compute_hash(
                    0,
                    BlockId::EMPTY,
                    block_id,
                    next_id,
                    &timestamp,
                    &transactions,
                )
                .map_err(|e| DomainError::MalformedPayload(e.to_string()))?;
                let block = Block {
                    block_id,
                    block_index: 0,
                    previous_block_id: BlockId::EMPTY,
                    next_block_id: next_id,
                    timestamp,
                    transactions,
                    hash,
                };
                let state = BlockchainState {
                    state_id: BlockchainStateId::generate(),
                    block_index: 0,
                    previous_block_id: BlockId::EMPTY,
                    current_block_id: block_id,
                    next_block_id: next_id,
                };
                (block, state, true)
            }
        };

        let committed_user_ids: Vec<_> = if is_genesis {
            Vec::new()
        } else {
            block
                .transactions
                .iter()
                .skip(1)
                .map(|tx| tx.id)
                .collect()
        };
        let block_index = block.block_index;
        let block_id = block.block_id;

        if let Err(e) = self.commit_block(block.clone(), new_state.clone()).await {
            error!(block_index, error = %e, "Block commit failed, rolled back");
            self.bus
                .publish(NodeEvent::StorageAlarm {
                    context: format!("block {block_index} commit: {e}"),
                })
                .await;
            return Err(e);
        }

        self.cache.set(new_state);
        if !committed_user_ids.is_empty() {
            self.mempool.remove_committed(&committed_user_ids);
        }

        info!(
            block_index,
            transactions = block.transactions.len(),
            "Block committed"
        );
        self.bus
            .publish(NodeEvent::BlockCreated {
                block: Arc::new(block),
            })
            .await;
        if is_genesis {
            info!(%block_id, "Blockchain initialized");
            self.bus
                .publish(NodeEvent::BlockchainInitialized {
                    block_id,
                    block_index: 0,
                })
                .await;
        }
        Ok(())
    }
}

/// Warn-level helper used at startup when the cache is cold.
pub async fn warm_chain_state_cache(
    storage: &SharedStorage,
    cache: &ChainStateCache,
) -> Result<(), DomainError> {
    let read = storage.read().await?;
    match read.chain_state().await {
        Ok(Some(state)) => {
            cache.set(state);
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(e) => {
            warn!(error = %e, "Could not warm chain-state cache");
            Err(e)
        }
    }
}
