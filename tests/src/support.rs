//! Shared fixtures for the integration scenarios.

use hn_credentials::ProducerIdentity;
use hn_reactions::{CircuitVersionState, ProofSystem, VerifierRegistry};
use node_runtime::{build_node, Node, NodeConfig};
use shared_bus::{NodeEvent, Subscription};
use shared_types::{SignedTransaction, TransactionPayload, UnsignedTransaction, UserSignature};
use std::time::Duration;

/// The producer secret every test node runs with.
pub const PRODUCER_SECRET: [u8; 32] = [0x42; 32];

/// A proof system that accepts everything; lets scenarios exercise the
/// pipeline around verification without a trusted setup.
pub struct AcceptAllProofs;

impl ProofSystem for AcceptAllProofs {
    fn verify(&self, _proof: &[u8], _inputs: &[ark_bn254::Fr]) -> bool {
        true
    }
}

/// The producer's signing identity, matching the test node.
#[must_use]
pub fn producer_key() -> ProducerIdentity {
    ProducerIdentity::from_secret_bytes(PRODUCER_SECRET)
}

/// A user keypair derived from a tag byte.
#[must_use]
pub fn user(tag: u8) -> ProducerIdentity {
    ProducerIdentity::from_secret_bytes([tag; 32])
}

/// Sign a payload as `signer`.
#[must_use]
pub fn signed(signer: &ProducerIdentity, payload: TransactionPayload) -> SignedTransaction {
    let unsigned = UnsignedTransaction::new(chrono::Utc::now(), payload);
    let bytes = unsigned.signing_bytes().expect("payload serializes");
    let signature = signer.sign(&bytes);
    unsigned.into_signed(UserSignature {
        signatory: signer.address(),
        signature,
    })
}

/// Build a test node: in-memory storage, huge tick interval (tests drive
/// pulses explicitly), accept-all proof verifier at version 1.
pub async fn test_node(max_empty_blocks_before_pause: u32) -> Node {
    let mut config = NodeConfig::default();
    config.producer.secret_hex = hex_of(&PRODUCER_SECRET);
    config.blockchain_settings.block_interval_secs = 3600;
    config.blockchain_settings.max_empty_blocks_before_pause = max_empty_blocks_before_pause;

    let mut verifier = VerifierRegistry::new();
    verifier.register(1, CircuitVersionState::Current, Box::new(AcceptAllProofs));
    build_node(config, verifier).await.expect("node builds")
}

fn hex_of(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Await the next event matching `predicate`, with a test timeout.
pub async fn await_event<F>(sub: &mut Subscription, predicate: F) -> NodeEvent
where
    F: Fn(&NodeEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = sub.recv().await.expect("bus open");
            if predicate(&event) {
                return event;
            }
        }
    })
    .await
    .expect("event within timeout")
}

/// Produce one block via the scheduler pulse path and wait for indexing
/// to complete.
pub async fn produce_block(node: &Node, sub: &mut Subscription) {
    // The scheduler returns to idle on BlockCreated, delivered through
    // its own event loop; wait for that before pulsing again.
    tokio::time::timeout(Duration::from_secs(5), async {
        while !node.scheduler.is_idle() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("scheduler idle");
    node.scheduler.on_pulse().await;
    await_event(sub, |e| matches!(e, NodeEvent::BlockIndexingCompleted { .. })).await;
}
