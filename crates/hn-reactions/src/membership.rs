//! # Membership Trees
//!
//! Per-feed append-only registry of member commitments. The leaf index of
//! a commitment is its insertion ordinal; the tree has a fixed depth with
//! zero-valued empty leaves and Poseidon-2 as the compression function.
//!
//! Roots are recorded to `merkle_root_history` on every registration, and
//! proof validation accepts any of the most recent `grace` roots so a
//! prover racing a concurrent membership change is not rejected.

use crate::encoding::{fr_from_bytes, fr_to_bytes};
use crate::poseidon::hash2;
use ark_bn254::Fr;
use ark_ff::Zero;
use hn_storage::{ReadScope as _, SharedStorage, WriteScope as _};
use shared_types::{Bytes32, DomainError, FeedId, FeedMemberCommitment, MerkleRootHistory};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Membership configuration.
#[derive(Debug, Clone)]
pub struct MembershipConfig {
    /// Fixed tree depth; 20 supports about a million members per feed.
    pub depth: usize,
    /// How many recent roots remain valid for proofs.
    pub grace_window: usize,
}

impl Default for MembershipConfig {
    fn default() -> Self {
        Self {
            depth: 20,
            grace_window: 3,
        }
    }
}

/// A membership proof against a recorded root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipProof {
    pub root: Bytes32,
    pub path_elements: Vec<Bytes32>,
    /// 0 = leaf on the left, 1 = leaf on the right, per level.
    pub path_indices: Vec<u8>,
    pub depth: usize,
    pub root_block: u64,
}

/// Component G.1: commitment registry and merkle tree.
pub struct MembershipService {
    config: MembershipConfig,
    storage: SharedStorage,
    /// Per-feed write locks; root recomputation must not interleave.
    locks: parking_lot::Mutex<HashMap<FeedId, Arc<Mutex<()>>>>,
    /// Zero-subtree hashes per level, computed once.
    zeros: Vec<Fr>,
}

impl MembershipService {
    #[must_use]
    pub fn new(config: MembershipConfig, storage: SharedStorage) -> Self {
        let mut zeros = Vec::with_capacity(config.depth + 1);
        zeros.push(Fr::zero());
        for level in 0..config.depth {
            let below = zeros[level];
            zeros.push(hash2(below, below));
        }
        Self {
            config,
            storage,
            locks: parking_lot::Mutex::new(HashMap::new()),
            zeros,
        }
    }

    fn feed_lock(&self, feed_id: FeedId) -> Arc<Mutex<()>> {
        Arc::clone(self.locks.lock().entry(feed_id).or_default())
    }

    /// Append a commitment iff absent; returns `(root, leaf_index)`.
    pub async fn register(
        &self,
        feed_id: FeedId,
        commitment: Bytes32,
        block_index: u64,
    ) -> Result<(Bytes32, usize), DomainError> {
        let lock = self.feed_lock(feed_id);
        let _guard = lock.lock().await;

        let read = self.storage.read().await?;
        let existing = read.member_commitments(feed_id).await?;
        drop(read);
        if existing
            .iter()
            .any(|c| c.user_commitment.ct_eq(&commitment))
        {
            return Err(DomainError::DuplicateCommitment(feed_id));
        }

        let leaf_index = existing.len();
        let mut leaves: Vec<Fr> = existing
            .iter()
            .map(|c| fr_from_bytes(&c.user_commitment))
            .collect();
        leaves.push(fr_from_bytes(&commitment));
        let root = fr_to_bytes(&self.compute_root(&leaves));

        let now = hn_storage::now();
        let mut scope = self.storage.begin_write().await?;
        scope.insert_member_commitment(FeedMemberCommitment {
            feed_id,
            user_commitment: commitment,
            registered_at: now,
        });
        scope.insert_root_history(MerkleRootHistory {
            feed_id,
            merkle_root: root,
            block_index,
            created_at: now,
        });
        scope.commit().await?;

        debug!(%feed_id, leaf_index, root = %root, "Member commitment registered");
        Ok((root, leaf_index))
    }

    /// Build a proof for a registered commitment.
    pub async fn prove(
        &self,
        feed_id: FeedId,
        commitment: Bytes32,
    ) -> Result<MembershipProof, DomainError> {
        let read = self.storage.read().await?;
        let commitments = read.member_commitments(feed_id).await?;
        let latest_root = read
            .recent_roots(feed_id, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::NotMember(shared_types::Address::SYSTEM, feed_id))?;
        drop(read);

        let leaf_index = commitments
            .iter()
            .position(|c| c.user_commitment.ct_eq(&commitment))
            .ok_or_else(|| DomainError::NotMember(shared_types::Address::SYSTEM, feed_id))?;

        let leaves: Vec<Fr> = commitments
            .iter()
            .map(|c| fr_from_bytes(&c.user_commitment))
            .collect();

        let mut path_elements = Vec::with_capacity(self.config.depth);
        let mut path_indices = Vec::with_capacity(self.config.depth);
        let mut level: Vec<Fr> = leaves;
        let mut index = leaf_index;
        for depth in 0..self.config.depth {
            let sibling_index = index ^ 1;
            let sibling = level
                .get(sibling_index)
                .copied()
                .unwrap_or(self.zeros[depth]);
            path_elements.push(fr_to_bytes(&sibling));
            path_indices.push((index & 1) as u8);
            level = self.next_level(&level, depth);
            index /= 2;
        }

        Ok(MembershipProof {
            root: latest_root.merkle_root,
            path_elements,
            path_indices,
            depth: self.config.depth,
            root_block: latest_root.block_index,
        })
    }

    /// Accept `root` iff it is one of the most recent `grace_window`
    /// recorded roots for the feed.
    pub async fn validate_root(&self, feed_id: FeedId, root: Bytes32) -> Result<(), DomainError> {
        let read = self.storage.read().await?;
        let recent = read.recent_roots(feed_id, self.config.grace_window).await?;
        if recent.iter().any(|entry| entry.merkle_root == root) {
            Ok(())
        } else {
            Err(DomainError::UnknownMerkleRoot(root))
        }
    }

    fn next_level(&self, level: &[Fr], depth: usize) -> Vec<Fr> {
        let width = level.len().div_ceil(2);
        (0..width)
            .map(|i| {
                let left = level.get(2 * i).copied().unwrap_or(self.zeros[depth]);
                let right = level.get(2 * i + 1).copied().unwrap_or(self.zeros[depth]);
                hash2(left, right)
            })
            .collect()
    }

    fn compute_root(&self, leaves: &[Fr]) -> Fr {
        let mut level: Vec<Fr> = leaves.to_vec();
        for depth in 0..self.config.depth {
            level = self.next_level(&level, depth);
        }
        level.first().copied().unwrap_or(self.zeros[self.config.depth])
    }

    /// Recompute a root from a proof (used in tests and by the content
    /// handler's sanity checks).
    #[must_use]
    pub fn root_from_proof(&self, commitment: Bytes32, proof: &MembershipProof) -> Bytes32 {
        let mut node = fr_from_bytes(&commitment);
        for (sibling, index) in proof.path_elements.iter().zip(proof.path_indices.iter()) {
            let sibling = fr_from_bytes(sibling);
            node = if *index == 0 {
                hash2(node, sibling)
            } else {
                hash2(sibling, node)
            };
        }
        fr_to_bytes(&node)
    }
}
