//! Anonymous reaction flows end-to-end: membership registration from
//! group messages, first vote, vote change, grace window, and sync.

use crate::support::{await_event, produce_block, signed, test_node, user};
use ark_bn254::Fr;
use hn_storage::ReadScope as _;
use hn_reactions::{commitment, nullifier, Ciphertext, Point, VoteCiphertexts};
use shared_bus::{EventFilter, NodeEvent};
use shared_types::payload::{
    FeedParticipantEntry, NewGroupFeedMessagePayload, NewGroupFeedPayload, ReactionVotePayload,
};
use shared_types::{
    Bytes32, FeedId, FeedMessageId, ProofBytes, TransactionPayload, EMOJI_SLOTS,
};

fn vote(seed: u64) -> VoteCiphertexts {
    let mut slots = [Ciphertext::NEUTRAL; EMOJI_SLOTS];
    for (i, slot) in slots.iter_mut().enumerate() {
        let k = Fr::from(seed + i as u64 + 1);
        *slot = Ciphertext {
            c1: Point::BASE.scalar_mul(&k),
            c2: Point::BASE.scalar_mul(&(k + Fr::from(3u64))),
        };
    }
    VoteCiphertexts(slots)
}

fn vote_payload(
    message_id: FeedMessageId,
    feed_id: FeedId,
    nullifier: Bytes32,
    root: Bytes32,
    author_commitment: Bytes32,
    vote: &VoteCiphertexts,
) -> TransactionPayload {
    let stored = vote.to_stored();
    TransactionPayload::ReactionVote(Box::new(ReactionVotePayload {
        message_id,
        feed_id,
        proof: ProofBytes(vec![0xAA; 32]),
        nullifier,
        ciphertext_c1_x: stored.c1_x,
        ciphertext_c1_y: stored.c1_y,
        ciphertext_c2_x: stored.c2_x,
        ciphertext_c2_y: stored.c2_y,
        merkle_root: root,
        author_commitment,
        circuit_version: 1,
        encrypted_backup: None,
    }))
}

#[tokio::test]
async fn first_vote_then_change_keeps_count_and_replaces_ciphertexts() {
    let mut node = test_node(100).await;
    let mut sub = node.bus.subscribe(EventFilter::all());
    node.start().await.unwrap();
    await_event(&mut sub, |e| {
        matches!(e, NodeEvent::BlockIndexingCompleted { .. })
    })
    .await;

    let voter = user(7);
    let secret = Bytes32([0x55; 32]);
    let feed_id = FeedId::generate();
    let message_id = FeedMessageId::generate();

    // Group feed with the voter as creator, then a message carrying the
    // voter's commitment (which registers it in the membership tree).
    node.mempool
        .submit(signed(
            &voter,
            TransactionPayload::NewGroupFeed(NewGroupFeedPayload {
                feed_id,
                title: "reactions".into(),
                description: String::new(),
                is_public: true,
                participants: vec![FeedParticipantEntry {
                    feed_id,
                    address: voter.address(),
                    encrypted_feed_key: "enc".into(),
                }],
            }),
        ))
        .await
        .unwrap();
    produce_block(&node, &mut sub).await;

    node.mempool
        .submit(signed(
            &voter,
            TransactionPayload::NewGroupFeedMessage(NewGroupFeedMessagePayload {
                message_id,
                feed_id,
                content: "ciphertext".into(),
                reply_to: None,
                key_generation: 1,
                author_commitment: commitment(&secret),
            }),
        ))
        .await
        .unwrap();
    produce_block(&node, &mut sub).await;

    let proof = node
        .membership
        .prove(feed_id, commitment(&secret))
        .await
        .unwrap();
    let n = nullifier(&secret, &message_id, &feed_id);

    // First vote.
    let v1 = vote(100);
    node.mempool
        .submit(signed(
            &voter,
            vote_payload(message_id, feed_id, n, proof.root, commitment(&secret), &v1),
        ))
        .await
        .unwrap();
    produce_block(&node, &mut sub).await;

    let read = node.storage.read().await.unwrap();
    let tally = read.tally(message_id).await.unwrap().unwrap();
    assert_eq!(tally.total_count, 1);
    let v0 = tally.version;
    assert_eq!(
        VoteCiphertexts::from_stored(&tally.ciphertexts).unwrap(),
        VoteCiphertexts::neutral().add(&v1)
    );
    drop(read);

    // Same nullifier, new ciphertexts: a vote change.
    let v2 = vote(200);
    node.mempool
        .submit(signed(
            &voter,
            vote_payload(message_id, feed_id, n, proof.root, commitment(&secret), &v2),
        ))
        .await
        .unwrap();
    produce_block(&node, &mut sub).await;

    let read = node.storage.read().await.unwrap();
    let tally = read.tally(message_id).await.unwrap().unwrap();
    assert_eq!(tally.total_count, 1, "a vote change adds no voter");
    assert_eq!(tally.version, v0 + 1);
    assert_eq!(
        VoteCiphertexts::from_stored(&tally.ciphertexts).unwrap(),
        VoteCiphertexts::neutral().add(&v2),
        "V1 ⊖ V1 ⊕ V2 leaves exactly V2"
    );
    // Distinct nullifiers recorded for the message equals total_count.
    assert!(read.nullifier(n).await.unwrap().is_some());
    drop(read);
    node.shutdown().await;
}

#[tokio::test]
async fn merkle_grace_window_accepts_last_three_roots() {
    let node = test_node(100).await;
    let feed = FeedId([0xF1; 16]);

    let c = |tag: u8| Bytes32([tag; 32]);
    let (r1, i1) = node.membership.register(feed, c(1), 1).await.unwrap();
    let (r2, _) = node.membership.register(feed, c(2), 2).await.unwrap();
    let (r3, _) = node.membership.register(feed, c(3), 3).await.unwrap();
    assert_eq!(i1, 0);

    for root in [r1, r2, r3] {
        node.membership.validate_root(feed, root).await.unwrap();
    }

    let (r4, _) = node.membership.register(feed, c(4), 4).await.unwrap();
    assert!(node.membership.validate_root(feed, r1).await.is_err());
    for root in [r2, r3, r4] {
        node.membership.validate_root(feed, root).await.unwrap();
    }
    node.shutdown().await;
}

#[tokio::test]
async fn tallies_since_returns_versions_above_cursor_in_order() {
    let node = test_node(100).await;
    let f1 = FeedId([1; 16]);
    let f2 = FeedId([2; 16]);

    // Drive the tally service directly to pin versions 1..=3, then query
    // with a cursor between them.
    for (message, feed, null_tag) in [(1u8, f1, 1u8), (2, f2, 2), (3, f1, 3)] {
        let v = vote(u64::from(message));
        let stored = v.to_stored();
        let payload = ReactionVotePayload {
            message_id: FeedMessageId([message; 16]),
            feed_id: feed,
            proof: ProofBytes(vec![1]),
            nullifier: Bytes32([null_tag; 32]),
            ciphertext_c1_x: stored.c1_x,
            ciphertext_c1_y: stored.c1_y,
            ciphertext_c2_x: stored.c2_x,
            ciphertext_c2_y: stored.c2_y,
            merkle_root: Bytes32([9; 32]),
            author_commitment: Bytes32([8; 32]),
            circuit_version: 1,
            encrypted_backup: None,
        };
        node.tally
            .apply_vote(1, shared_types::TransactionId::generate(), &payload)
            .await
            .unwrap();
    }

    let rows = node.tally.tallies_since(&[f1, f2], 1).await.unwrap();
    let versions: Vec<u64> = rows.iter().map(|t| t.version).collect();
    assert_eq!(versions, vec![2, 3]);

    let only_f1 = node.tally.tallies_since(&[f1], 0).await.unwrap();
    assert!(only_f1.iter().all(|t| t.feed_id == f1));
    node.shutdown().await;
}

#[tokio::test]
async fn tally_ciphertext_points_stay_on_curve() {
    let node = test_node(100).await;
    let feed = FeedId([1; 16]);

    for tag in 1..=3u8 {
        let v = vote(u64::from(tag) * 10);
        let stored = v.to_stored();
        let payload = ReactionVotePayload {
            message_id: FeedMessageId([7; 16]),
            feed_id: feed,
            proof: ProofBytes(vec![1]),
            nullifier: Bytes32([tag; 32]),
            ciphertext_c1_x: stored.c1_x,
            ciphertext_c1_y: stored.c1_y,
            ciphertext_c2_x: stored.c2_x,
            ciphertext_c2_y: stored.c2_y,
            merkle_root: Bytes32([9; 32]),
            author_commitment: Bytes32([8; 32]),
            circuit_version: 1,
            encrypted_backup: None,
        };
        node.tally
            .apply_vote(1, shared_types::TransactionId::generate(), &payload)
            .await
            .unwrap();
    }

    let read = node.storage.read().await.unwrap();
    let tally = read.tally(FeedMessageId([7; 16])).await.unwrap().unwrap();
    assert_eq!(tally.total_count, 3);
    let decoded = VoteCiphertexts::from_stored(&tally.ciphertexts).unwrap();
    assert!(decoded.is_on_curve());
    drop(read);
    node.shutdown().await;
}
