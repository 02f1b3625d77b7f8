//! # Production Scheduler
//!
//! State machine: `Idle → Producing → Idle`, with a `PausedForEmpty`
//! overlay once too many consecutive empty blocks have been produced.
//!
//! ## Rules
//!
//! - On a pulse while `Producing`: log and skip.
//! - On a pulse while `PausedForEmpty`: skip until `TransactionReceived`.
//! - Otherwise snapshot the mempool and hand it to the assembler.
//! - Return to `Idle` strictly on `BlockCreated`.
//! - A failed assembly returns to `Idle` when the attempt ends, so the
//!   next pulse retries.

use crate::config::SchedulerConfig;
use crate::ports::{BlockAssembler, PendingSource};
use crate::ticker::TickSource;
use shared_bus::{EventFilter, InMemoryEventBus, NodeEvent};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Block production scheduler (single-shot: at most one assembly in flight).
pub struct ProductionScheduler {
    config: SchedulerConfig,
    pending: Arc<dyn PendingSource>,
    assembler: Arc<dyn BlockAssembler>,
    bus: Arc<InMemoryEventBus>,
    /// True when a pulse may start an assembly (the `Idle` state).
    can_schedule: AtomicBool,
    /// Suspension overlay entered after too many empty blocks.
    paused_for_empty: AtomicBool,
    consecutive_empty_blocks: AtomicU32,
    shutdown: watch::Receiver<bool>,
}

impl ProductionScheduler {
    #[must_use]
    pub fn new(
        config: SchedulerConfig,
        pending: Arc<dyn PendingSource>,
        assembler: Arc<dyn BlockAssembler>,
        bus: Arc<InMemoryEventBus>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        info!(
            interval_secs = config.tick_interval.as_secs(),
            pause_after = config.max_empty_blocks_before_pause,
            "Production scheduler initialized"
        );
        Self {
            config,
            pending,
            assembler,
            bus,
            can_schedule: AtomicBool::new(true),
            paused_for_empty: AtomicBool::new(false),
            consecutive_empty_blocks: AtomicU32::new(0),
            shutdown,
        }
    }

    /// True when the scheduler is between productions.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.can_schedule.load(Ordering::SeqCst)
    }

    /// True when empty-run suspension is active.
    #[must_use]
    pub fn is_paused_for_empty(&self) -> bool {
        self.paused_for_empty.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn consecutive_empty_blocks(&self) -> u32 {
        self.consecutive_empty_blocks.load(Ordering::SeqCst)
    }

    /// Drive the scheduler until the tick source ends or shutdown fires.
    pub async fn run(self: Arc<Self>, mut ticks: Box<dyn TickSource>) {
        let mut events = self.bus.subscribe(EventFilter::all());
        let mut shutdown = self.shutdown.clone();
        loop {
            tokio::select! {
                tick = ticks.next_tick() => {
                    if tick.is_none() {
                        debug!("Tick source exhausted, scheduler stopping");
                        break;
                    }
                    self.on_pulse().await;
                }
                event = events.recv() => {
                    match event {
                        Some(NodeEvent::TransactionReceived { .. }) => self.on_transaction_received(),
                        Some(NodeEvent::BlockCreated { .. }) => self.on_block_created(),
                        Some(_) => {}
                        None => break,
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Shutdown signal received, scheduler stopping");
                        break;
                    }
                }
            }
        }
    }

    /// Handle one pulse.
    pub async fn on_pulse(&self) {
        if self.paused_for_empty.load(Ordering::SeqCst) {
            debug!("Paused for empty mempool, skipping pulse");
            return;
        }
        if !self.can_schedule.swap(false, Ordering::SeqCst) {
            debug!("Assembly already in flight, skipping pulse");
            return;
        }
        self.produce().await;
    }

    /// Test-mode trigger: force one production attempt, bypassing the
    /// empty-run pause. The harness can then await `BlockIndexingCompleted`.
    pub async fn produce_now(&self) {
        if !self.can_schedule.swap(false, Ordering::SeqCst) {
            warn!("produce_now called while producing; ignored");
            return;
        }
        self.produce().await;
    }

    async fn produce(&self) {
        let pending = self.pending.drain_pending();
        let was_empty = pending.is_empty();
        debug!(transactions = pending.len(), "Starting block assembly");

        match self.assembler.assemble(pending).await {
            Ok(()) => {
                if was_empty {
                    let empty =
                        self.consecutive_empty_blocks.fetch_add(1, Ordering::SeqCst) + 1;
                    if empty >= self.config.max_empty_blocks_before_pause {
                        info!(
                            consecutive_empty = empty,
                            "Entering empty-run pause until a transaction arrives"
                        );
                        self.paused_for_empty.store(true, Ordering::SeqCst);
                    }
                } else {
                    self.consecutive_empty_blocks.store(0, Ordering::SeqCst);
                }
                // `can_schedule` flips back on BlockCreated, not here.
            }
            Err(e) => {
                warn!(error = %e, "Block assembly failed; will retry on next pulse");
                // No BlockCreated will arrive for this attempt.
                self.can_schedule.store(true, Ordering::SeqCst);
            }
        }
    }

    /// Handle `TransactionReceived`: reset the empty counter and lift the
    /// empty-run pause.
    pub fn on_transaction_received(&self) {
        self.consecutive_empty_blocks.store(0, Ordering::SeqCst);
        if self.paused_for_empty.swap(false, Ordering::SeqCst) {
            info!("Transaction received, resuming block production");
        }
    }

    /// Handle `BlockCreated`: the only transition back to `Idle`.
    pub fn on_block_created(&self) {
        self.can_schedule.store(true, Ordering::SeqCst);
    }
}
