//! Process-wide progress broadcast bus.
//!
//! Every job publishes into one [`ProgressBus`]; every observer holds its own
//! [`Subscription`] and sees each event published after it subscribed, in
//! publish order. Events published while nobody is subscribed are discarded.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::stream::{self, Stream};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::events::ProgressEvent;
use crate::ports::ProgressEmitter;

/// Default number of events buffered per observer before it is considered stalled.
pub const DEFAULT_BUS_CAPACITY: usize = 256;

/// Default time without events after which observers receive a keep-alive.
pub const DEFAULT_IDLE_WINDOW: Duration = Duration::from_secs(30);

/// Item yielded by a [`Subscription`].
#[derive(Debug, Clone, PartialEq)]
pub enum BusMessage {
    /// A published progress event.
    Event(ProgressEvent),
    /// No event arrived within the idle window.
    KeepAlive,
}

/// Broadcast channel of [`ProgressEvent`]s shared by producers and observers.
///
/// Cloning is cheap; clones publish into and subscribe from the same channel.
#[derive(Debug, Clone)]
pub struct ProgressBus {
    sender: broadcast::Sender<ProgressEvent>,
    shutdown: CancellationToken,
    idle_window: Duration,
    next_subscriber: Arc<AtomicU64>,
}

impl ProgressBus {
    /// Create a bus buffering at most `capacity` events per observer.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize, idle_window: Duration) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            shutdown: CancellationToken::new(),
            idle_window,
            next_subscriber: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Create a bus with the default capacity (256) and idle window (30s).
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY, DEFAULT_IDLE_WINDOW)
    }

    /// Publish an event to every current subscriber.
    ///
    /// Never blocks. Returns the number of subscribers the event reached;
    /// with none attached the event is dropped.
    pub fn publish(&self, event: ProgressEvent) -> usize {
        if self.sender.receiver_count() == 0 {
            return 0;
        }
        debug!(
            job_id = ?event.job_id,
            status = event.status.as_str(),
            progress = ?event.progress,
            "Publishing progress event"
        );
        self.sender.send(event).unwrap_or(0)
    }

    /// Attach a new observer.
    pub fn subscribe(&self) -> Subscription {
        let id = self.next_subscriber.fetch_add(1, Ordering::Relaxed);
        let receiver = self.sender.subscribe();
        debug!(
            subscriber = id,
            subscribers = self.sender.receiver_count(),
            "Observer subscribed"
        );
        Subscription {
            id,
            receiver,
            shutdown: self.shutdown.clone(),
            idle_window: self.idle_window,
            closed: false,
        }
    }

    /// Number of attached observers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub const fn idle_window(&self) -> Duration {
        self.idle_window
    }

    /// End every subscription, current and future.
    pub fn shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            info!(
                target: "tubefetch.bus",
                subscribers = self.sender.receiver_count(),
                "Shutting down progress bus"
            );
            self.shutdown.cancel();
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl Default for ProgressBus {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ProgressEmitter for ProgressBus {
    fn emit(&self, event: ProgressEvent) {
        self.publish(event);
    }
}

/// One observer's view of the bus.
///
/// Dropping the subscription detaches the observer.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    receiver: broadcast::Receiver<ProgressEvent>,
    shutdown: CancellationToken,
    idle_window: Duration,
    closed: bool,
}

impl Subscription {
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the next event, or a keep-alive once the idle window passes.
    ///
    /// Returns `None` when the bus shuts down or this observer fell so far
    /// behind that events were overwritten; the observer is expected to
    /// reconnect rather than continue with a gap.
    pub async fn next(&mut self) -> Option<BusMessage> {
        if self.closed || self.shutdown.is_cancelled() {
            return None;
        }

        let message = tokio::select! {
            () = self.shutdown.cancelled() => None,
            received = tokio::time::timeout(self.idle_window, self.receiver.recv()) => {
                match received {
                    Err(_elapsed) => Some(BusMessage::KeepAlive),
                    Ok(Ok(event)) => Some(BusMessage::Event(event)),
                    Ok(Err(RecvError::Closed)) => None,
                    Ok(Err(RecvError::Lagged(skipped))) => {
                        warn!(
                            subscriber = self.id,
                            skipped,
                            "Observer lagged behind the progress bus, disconnecting"
                        );
                        None
                    }
                }
            }
        };

        if message.is_none() {
            self.closed = true;
        }
        message
    }

    /// Turn the subscription into a stream ending when [`Self::next`] does.
    pub fn into_stream(self) -> impl Stream<Item = BusMessage> + Send + 'static {
        stream::unfold(self, |mut subscription| async move {
            let message = subscription.next().await?;
            Some((message, subscription))
        })
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        debug!(subscriber = self.id, "Observer unsubscribed");
    }
}
