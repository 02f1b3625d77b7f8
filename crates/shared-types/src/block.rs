//! # Blocks and Chain State
//!
//! A block is an ordered sequence of validated transactions linked to its
//! neighbours by identifier. The chain state is a single-row pointer that
//! always references the previous, current, and (pre-generated) next block.
//!
//! ## Linkage Invariant
//!
//! For consecutive blocks B, C: `C.previous_block_id == B.block_id` and
//! `B.next_block_id == C.block_id`. Block 0 is genesis with
//! `previous_block_id == BlockId::EMPTY`.

use crate::{BlockId, BlockchainStateId, Bytes32, Timestamp, ValidatedTransaction};
use sha2::{Digest, Sha256};

/// A committed (or in-assembly) block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub block_id: BlockId,
    pub block_index: u64,
    pub previous_block_id: BlockId,
    /// Pre-generated identifier of the block that will follow this one.
    pub next_block_id: BlockId,
    pub timestamp: Timestamp,
    pub transactions: Vec<ValidatedTransaction>,
    pub hash: Bytes32,
}

impl Block {
    /// Compute the block hash over the ordered inputs.
    ///
    /// The hash is a pure function of `(block_index, previous, current,
    /// next, timestamp, ordered transaction digests)`.
    pub fn compute_hash(
        block_index: u64,
        previous_block_id: BlockId,
        block_id: BlockId,
        next_block_id: BlockId,
        timestamp: &Timestamp,
        transactions: &[ValidatedTransaction],
    ) -> Result<Bytes32, serde_json::Error> {
        let mut hasher = Sha256::new();
        hasher.update(block_index.to_le_bytes());
        hasher.update(previous_block_id.as_bytes());
        hasher.update(block_id.as_bytes());
        hasher.update(next_block_id.as_bytes());
        hasher.update(timestamp.to_rfc3339().as_bytes());
        for tx in transactions {
            hasher.update(tx.digest()?.as_bytes());
        }
        Ok(Bytes32(hasher.finalize().into()))
    }

    /// True for the genesis block.
    #[must_use]
    pub fn is_genesis(&self) -> bool {
        self.block_index == 0 && self.previous_block_id.is_empty()
    }
}

/// The single chain-state pointer row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockchainState {
    pub state_id: BlockchainStateId,
    pub block_index: u64,
    pub previous_block_id: BlockId,
    pub current_block_id: BlockId,
    pub next_block_id: BlockId,
}

impl BlockchainState {
    /// Advance the pointer past a freshly assembled block.
    ///
    /// `new_next` is the pre-generated identifier for the block after the
    /// one just committed.
    #[must_use]
    pub fn advanced(&self, new_next: BlockId) -> Self {
        Self {
            state_id: self.state_id,
            block_index: self.block_index + 1,
            previous_block_id: self.current_block_id,
            current_block_id: self.next_block_id,
            next_block_id: new_next,
        }
    }
}
