//! Scheduler behaviour: empty-run pause and transaction-driven resume.

use crate::support::{await_event, produce_block, producer_key, signed, test_node};
use hn_block_production::ports::BlockAssembler;
use hn_storage::ReadScope as _;
use shared_bus::{EventFilter, NodeEvent};
use shared_types::payload::RewardPayload;
use shared_types::{Token, TransactionPayload};

#[tokio::test]
async fn three_empty_blocks_then_pause_then_resume_on_submission() {
    let mut node = test_node(3).await;
    let mut sub = node.bus.subscribe(EventFilter::all());
    node.start().await.unwrap();
    await_event(&mut sub, |e| {
        matches!(e, NodeEvent::BlockIndexingCompleted { .. })
    })
    .await;

    // Three pulses with an empty mempool: three empty blocks.
    for _ in 0..3 {
        produce_block(&node, &mut sub).await;
    }
    let read = node.storage.read().await.unwrap();
    assert_eq!(read.block_count().await.unwrap(), 4); // genesis + 3
    drop(read);
    assert!(node.scheduler.is_paused_for_empty());

    // Further pulses produce nothing.
    node.scheduler.on_pulse().await;
    node.scheduler.on_pulse().await;
    tokio::task::yield_now().await;
    let read = node.storage.read().await.unwrap();
    assert_eq!(read.block_count().await.unwrap(), 4);
    drop(read);

    // A submission wakes the scheduler; the next pulse produces.
    let producer = producer_key();
    node.mempool
        .submit(signed(
            &producer,
            TransactionPayload::Reward(RewardPayload {
                token: Token::native(),
                precision: 9,
                amount: "1.000000000".parse().unwrap(),
                to: producer.address(),
            }),
        ))
        .await
        .unwrap();
    await_event(&mut sub, |e| matches!(e, NodeEvent::TransactionReceived { .. })).await;
    // The resume flag is flipped by the scheduler's own event loop in
    // production; tests drive the transition directly.
    node.scheduler.on_transaction_received();
    assert!(!node.scheduler.is_paused_for_empty());

    produce_block(&node, &mut sub).await;
    let read = node.storage.read().await.unwrap();
    assert_eq!(read.block_count().await.unwrap(), 5);
    let block = read.block_by_index(4).await.unwrap().unwrap();
    // Injected reward + submitted reward.
    assert_eq!(block.transactions.len(), 2);
    drop(read);
    node.shutdown().await;
}

#[tokio::test]
async fn pulse_during_production_is_skipped() {
    // The scheduler's own event loop is not started here, so the return
    // to idle is driven explicitly and the single-shot guard is
    // observable without races.
    let node = test_node(100).await;
    let mut sub = node.bus.subscribe(EventFilter::all());
    node.assembler.assemble(Vec::new()).await.unwrap(); // genesis
    await_event(&mut sub, |e| {
        matches!(e, NodeEvent::BlockIndexingCompleted { .. })
    })
    .await;

    // First pulse assembles; a second pulse before BlockCreated is
    // acknowledged gets skipped.
    node.scheduler.on_pulse().await;
    assert!(!node.scheduler.is_idle());
    node.scheduler.on_pulse().await;
    await_event(&mut sub, |e| {
        matches!(e, NodeEvent::BlockIndexingCompleted { .. })
    })
    .await;
    let read = node.storage.read().await.unwrap();
    assert_eq!(read.block_count().await.unwrap(), 2);
    drop(read);

    // Acknowledge and pulse again: production resumes.
    node.scheduler.on_block_created();
    node.scheduler.on_pulse().await;
    await_event(&mut sub, |e| {
        matches!(e, NodeEvent::BlockIndexingCompleted { .. })
    })
    .await;
    let read = node.storage.read().await.unwrap();
    assert_eq!(read.block_count().await.unwrap(), 3);
    drop(read);
    node.shutdown().await;
}
