//! # Event Subscriber
//!
//! Defines the subscription side of the event bus: pull-style subscription
//! handles, a `Stream` adapter, and the registered-handler loop that gives
//! each handler its own ordered delivery task.

use crate::events::{EventFilter, NodeEvent};
use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::Stream;
use tracing::{debug, error, warn};

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The event bus was closed.
    #[error("Event bus closed")]
    Closed,
}

/// A subscription handle for receiving events.
pub struct Subscription {
    receiver: broadcast::Receiver<NodeEvent>,
    filter: EventFilter,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<NodeEvent>, filter: EventFilter) -> Self {
        Self { receiver, filter }
    }

    /// Receive the next event that matches the filter.
    ///
    /// Returns `None` when the bus is dropped.
    pub async fn recv(&mut self) -> Option<NodeEvent> {
        loop {
            let event = match self.receiver.recv().await {
                Ok(e) => e,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(lagged = count, "Subscriber lagged, some events dropped");
                    continue;
                }
            };

            if self.filter.matches(&event) {
                return Some(event);
            }
        }
    }

    /// Try to receive the next event without blocking.
    pub fn try_recv(&mut self) -> Result<Option<NodeEvent>, SubscriptionError> {
        loop {
            let event = match self.receiver.try_recv() {
                Ok(e) => e,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            };

            if self.filter.matches(&event) {
                return Ok(Some(event));
            }
        }
    }

    /// Get the filter for this subscription.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

/// A stream wrapper for subscriptions.
pub struct EventStream {
    subscription: Subscription,
}

impl EventStream {
    #[must_use]
    pub fn new(subscription: Subscription) -> Self {
        Self { subscription }
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        self.subscription.filter()
    }
}

impl Stream for EventStream {
    type Item = NodeEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.subscription.try_recv() {
            Ok(Some(event)) => Poll::Ready(Some(event)),
            Ok(None) => {
                cx.waker().wake_by_ref();
                Poll::Pending
            }
            Err(SubscriptionError::Closed) => Poll::Ready(None),
        }
    }
}

// =============================================================================
// REGISTERED HANDLERS
// =============================================================================

/// A push-style event handler registered at startup.
///
/// Each registered handler gets a dedicated delivery task: invocation *n+1*
/// begins only after invocation *n* returns, and a slow or failing handler
/// never blocks delivery to other handlers.
#[async_trait]
pub trait EventSubscriber: Send + Sync {
    /// Name used in log fields.
    fn name(&self) -> &'static str;

    /// The events this handler wants.
    fn filter(&self) -> EventFilter;

    /// Handle one event. Errors are logged and do not stop the loop.
    async fn handle(&self, event: NodeEvent) -> Result<(), shared_types::DomainError>;
}

/// Spawn the delivery loop for one registered handler.
///
/// The loop runs until the bus is dropped. A panic inside `handle` is
/// caught, logged, and does not tear the loop down.
pub fn spawn_subscriber(
    bus: &crate::InMemoryEventBus,
    subscriber: Arc<dyn EventSubscriber>,
) -> JoinHandle<()> {
    let mut subscription = bus.subscribe(subscriber.filter());
    tokio::spawn(async move {
        debug!(subscriber = subscriber.name(), "Handler loop started");
        while let Some(event) = subscription.recv().await {
            let outcome = AssertUnwindSafe(subscriber.handle(event))
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(
                        subscriber = subscriber.name(),
                        error = %e,
                        "Event handler returned error"
                    );
                }
                Err(_) => {
                    error!(
                        subscriber = subscriber.name(),
                        "Event handler panicked; continuing with next event"
                    );
                }
            }
        }
        debug!(subscriber = subscriber.name(), "Handler loop stopped");
    })
}
