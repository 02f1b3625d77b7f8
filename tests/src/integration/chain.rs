//! Genesis bootstrap, chain linkage, and balance projections.

use crate::support::{await_event, produce_block, producer_key, signed, test_node, user};
use hn_storage::ReadScope as _;
use shared_bus::{EventFilter, NodeEvent};
use shared_types::payload::{FundsTransferPayload, NewPersonalFeedPayload, RewardPayload};
use shared_types::{Amount, BlockId, FeedId, FeedType, Token, TransactionPayload};

#[tokio::test]
async fn genesis_boot_creates_one_block_and_one_state_row() {
    let mut node = test_node(100).await;
    let mut sub = node.bus.subscribe(EventFilter::all());
    node.start().await.unwrap();

    let initialized = await_event(&mut sub, |e| {
        matches!(e, NodeEvent::BlockchainInitialized { .. })
    })
    .await;
    let NodeEvent::BlockchainInitialized { block_index, .. } = initialized else {
        unreachable!()
    };
    assert_eq!(block_index, 0);

    let read = node.storage.read().await.unwrap();
    assert_eq!(read.block_count().await.unwrap(), 1);
    let genesis = read.block_by_index(0).await.unwrap().unwrap();
    assert_eq!(genesis.block_index, 0);
    assert!(genesis.previous_block_id.is_empty());

    let state = read.chain_state().await.unwrap().unwrap();
    assert_eq!(state.block_index, 0);
    assert_eq!(state.current_block_id, genesis.block_id);
    drop(read);

    // No second BlockchainInitialized arrives even after more blocks.
    produce_block(&node, &mut sub).await;
    let read = node.storage.read().await.unwrap();
    assert_eq!(read.block_count().await.unwrap(), 2);
    drop(read);
    node.shutdown().await;
}

#[tokio::test]
async fn committed_blocks_form_a_doubly_linked_chain() {
    let mut node = test_node(100).await;
    let mut sub = node.bus.subscribe(EventFilter::all());
    node.start().await.unwrap();
    await_event(&mut sub, |e| {
        matches!(e, NodeEvent::BlockIndexingCompleted { .. })
    })
    .await;

    for _ in 0..4 {
        produce_block(&node, &mut sub).await;
    }

    let read = node.storage.read().await.unwrap();
    let count = read.block_count().await.unwrap();
    assert_eq!(count, 5);
    for index in 0..count {
        let block = read.block_by_index(index).await.unwrap().unwrap();
        if index == 0 {
            assert_eq!(block.previous_block_id, BlockId::EMPTY);
        } else {
            let previous = read.block_by_index(index - 1).await.unwrap().unwrap();
            assert_eq!(block.previous_block_id, previous.block_id);
            assert_eq!(previous.next_block_id, block.block_id);
        }
        // Producer reward is the first entry of every block.
        assert!(!block.transactions.is_empty());
        assert_eq!(
            block.transactions[0].payload_kind(),
            shared_types::payload::KIND_REWARD
        );
    }
    drop(read);
    node.shutdown().await;
}

#[tokio::test]
async fn reward_creates_then_accumulates_balance() {
    let mut node = test_node(100).await;
    let mut sub = node.bus.subscribe(EventFilter::all());
    node.start().await.unwrap();
    await_event(&mut sub, |e| {
        matches!(e, NodeEvent::BlockIndexingCompleted { .. })
    })
    .await;

    let producer = producer_key();
    let recipient = user(7).address();
    let reward = |_: u8| {
        TransactionPayload::Reward(RewardPayload {
            token: Token::native(),
            precision: 9,
            amount: "10.000000000".parse().unwrap(),
            to: recipient,
        })
    };

    node.mempool.submit(signed(&producer, reward(1))).await.unwrap();
    produce_block(&node, &mut sub).await;

    let read = node.storage.read().await.unwrap();
    assert_eq!(
        read.balance(recipient, Token::native())
            .await
            .unwrap()
            .amount()
            .to_string(),
        "10.000000000"
    );
    drop(read);

    node.mempool.submit(signed(&producer, reward(2))).await.unwrap();
    produce_block(&node, &mut sub).await;

    let read = node.storage.read().await.unwrap();
    assert_eq!(
        read.balance(recipient, Token::native())
            .await
            .unwrap()
            .amount()
            .to_string(),
        "20.000000000"
    );
    drop(read);
    node.shutdown().await;
}

#[tokio::test]
async fn funds_transfer_moves_balance_between_users() {
    let mut node = test_node(100).await;
    let mut sub = node.bus.subscribe(EventFilter::all());
    node.start().await.unwrap();
    await_event(&mut sub, |e| {
        matches!(e, NodeEvent::BlockIndexingCompleted { .. })
    })
    .await;

    let producer = producer_key();
    let alice = user(7);
    let bob = user(8);

    // Fund alice and give her a feed to send from.
    node.mempool
        .submit(signed(
            &producer,
            TransactionPayload::Reward(RewardPayload {
                token: Token::native(),
                precision: 9,
                amount: "10.000000000".parse().unwrap(),
                to: alice.address(),
            }),
        ))
        .await
        .unwrap();
    let feed_id = FeedId::generate();
    node.mempool
        .submit(signed(
            &alice,
            TransactionPayload::NewPersonalFeed(NewPersonalFeedPayload {
                feed_id,
                title: "wallet".into(),
                feed_type: FeedType::Personal,
                encrypted_feed_key: "enc".into(),
            }),
        ))
        .await
        .unwrap();
    produce_block(&node, &mut sub).await;

    node.mempool
        .submit(signed(
            &alice,
            TransactionPayload::FundsTransfer(FundsTransferPayload {
                token: Token::native(),
                precision: 9,
                amount: "4.000000000".parse().unwrap(),
                from: alice.address(),
                to: bob.address(),
                feed_id,
            }),
        ))
        .await
        .unwrap();
    produce_block(&node, &mut sub).await;

    let read = node.storage.read().await.unwrap();
    assert_eq!(
        read.balance(alice.address(), Token::native())
            .await
            .unwrap()
            .amount(),
        "6.000000000".parse::<Amount>().unwrap()
    );
    assert_eq!(
        read.balance(bob.address(), Token::native())
            .await
            .unwrap()
            .amount(),
        "4.000000000".parse::<Amount>().unwrap()
    );
    drop(read);
    node.shutdown().await;
}

#[tokio::test]
async fn block_hash_is_a_pure_function_of_inputs() {
    let mut node = test_node(100).await;
    let mut sub = node.bus.subscribe(EventFilter::all());
    node.start().await.unwrap();
    await_event(&mut sub, |e| {
        matches!(e, NodeEvent::BlockIndexingCompleted { .. })
    })
    .await;
    produce_block(&node, &mut sub).await;

    let read = node.storage.read().await.unwrap();
    for index in 0..read.block_count().await.unwrap() {
        let block = read.block_by_index(index).await.unwrap().unwrap();
        let recomputed = shared_types::Block::compute_hash(
            block.block_index,
            block.previous_block_id,
            block.block_id,
            block.next_block_id,
            &block.timestamp,
            &block.transactions,
        )
        .unwrap();
        assert_eq!(recomputed, block.hash);
    }
    drop(read);
    node.shutdown().await;
}
