//! # Tick Sources
//!
//! The scheduler consumes an injectable sequence of pulse events.
//! Production wraps a wall-clock interval; tests drive a manual source so
//! every scenario steps deterministically without real time.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;

/// A restartable sequence of tick events.
#[async_trait]
pub trait TickSource: Send {
    /// Wait for the next pulse. `None` means the source is exhausted and
    /// the consumer should stop.
    async fn next_tick(&mut self) -> Option<()>;
}

/// Wall-clock ticker used in production.
pub struct IntervalTicker {
    interval: tokio::time::Interval,
}

impl IntervalTicker {
    #[must_use]
    pub fn new(period: Duration) -> Self {
        // First pulse a full period after startup, then steady.
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        // A delayed pulse fires once, not in a burst.
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        Self { interval }
    }
}

#[async_trait]
impl TickSource for IntervalTicker {
    async fn next_tick(&mut self) -> Option<()> {
        self.interval.tick().await;
        Some(())
    }
}

/// Test ticker driven by explicit pulses.
pub struct ManualTicker {
    receiver: mpsc::UnboundedReceiver<()>,
}

/// Handle used by tests to emit pulses.
#[derive(Clone)]
pub struct ManualTickerHandle {
    sender: mpsc::UnboundedSender<()>,
}

impl ManualTicker {
    #[must_use]
    pub fn new() -> (Self, ManualTickerHandle) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { receiver }, ManualTickerHandle { sender })
    }
}

impl ManualTickerHandle {
    /// Emit one pulse. Returns false when the consumer is gone.
    pub fn pulse(&self) -> bool {
        self.sender.send(()).is_ok()
    }
}

#[async_trait]
impl TickSource for ManualTicker {
    async fn next_tick(&mut self) -> Option<()> {
        self.receiver.recv().await
    }
}
