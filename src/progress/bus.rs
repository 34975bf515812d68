//! In-process fan-out of progress events.

use crate::config::MAX_PROGRESS_CAPACITY;
use crate::progress::event::JobProgress;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

/// Receiver of progress events. `publish` must never block the caller.
pub trait ProgressSink: Send + Sync {
    fn publish(&self, event: JobProgress);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn publish(&self, _event: JobProgress) {}
}

/// Broadcast bus shared by every job of a service. Subscribers that fall behind
/// by more than the channel capacity observe a lag and skip ahead.
#[derive(Clone)]
pub struct ProgressBus {
    sender: broadcast::Sender<JobProgress>,
}

impl ProgressBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.clamp(1, MAX_PROGRESS_CAPACITY));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobProgress> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl ProgressSink for ProgressBus {
    fn publish(&self, event: JobProgress) {
        // No subscribers is not an error.
        let _ = self.sender.send(event);
    }
}

/// Publishes every event to each inner sink in order.
#[derive(Clone, Default)]
pub struct FanOut {
    sinks: Vec<Arc<dyn ProgressSink>>,
}

impl FanOut {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl ProgressSink for FanOut {
    fn publish(&self, event: JobProgress) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.publish(event.clone());
            }
            last.publish(event);
        }
    }
}

impl ProgressSink for mpsc::Sender<JobProgress> {
    fn publish(&self, event: JobProgress) {
        if let Err(err) = self.try_send(event) {
            debug!(error = %err, "progress_event_dropped");
        }
    }
}
