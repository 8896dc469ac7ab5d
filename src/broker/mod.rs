//! Message broker abstraction.
//!
//! The hub and the command worker only see two operations: publishing a
//! payload to a named queue and subscribing to a named queue. Payloads are
//! opaque strings. [`MemoryBroker`] is the in-process implementation.

mod memory;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::Result;

pub use memory::MemoryBroker;

/// Publishing side of a broker.
///
/// Implementations must be safe to call concurrently from many tasks.
#[async_trait]
pub trait Producer: Send + Sync {
    /// Publish a payload to `queue`.
    async fn publish(&self, queue: &str, payload: String) -> Result<()>;
}

/// Consuming side of a broker.
#[async_trait]
pub trait Consumer: Send + Sync {
    /// Start consuming `queue`.
    async fn subscribe(&self, queue: &str) -> Result<Subscription>;
}

/// A stream of payloads delivered from one queue.
#[derive(Debug)]
pub struct Subscription {
    queue: String,
    receiver: mpsc::Receiver<String>,
}

impl Subscription {
    /// Wrap the receiving end of a queue.
    pub fn new(queue: impl Into<String>, receiver: mpsc::Receiver<String>) -> Self {
        Self {
            queue: queue.into(),
            receiver,
        }
    }

    /// Name of the subscribed queue.
    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Wait for the next payload. Returns `None` once the queue is closed.
    pub async fn next(&mut self) -> Option<String> {
        self.receiver.recv().await
    }

    /// Take the next payload if one is already queued.
    pub fn try_next(&mut self) -> Option<String> {
        self.receiver.try_recv().ok()
    }
}
