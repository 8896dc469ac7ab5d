//! In-process broker backed by bounded tokio channels.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{Consumer, Producer, Subscription};
use crate::{FinchatError, Result};

struct Queue {
    sender: mpsc::Sender<String>,
    /// Taken by the first subscriber.
    receiver: Option<mpsc::Receiver<String>>,
}

/// Named FIFO queues living inside the process.
///
/// Queues are declared on first use by either side, so payloads published
/// before anyone subscribes are buffered up to the queue capacity. Each
/// queue has at most one consumer.
pub struct MemoryBroker {
    capacity: usize,
    queues: Mutex<HashMap<String, Queue>>,
}

impl MemoryBroker {
    /// Create a broker whose queues hold up to `capacity` payloads.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            queues: Mutex::new(HashMap::new()),
        }
    }

    fn with_queue<T>(&self, name: &str, f: impl FnOnce(&mut Queue) -> T) -> Result<T> {
        let mut queues = self
            .queues
            .lock()
            .map_err(|_| FinchatError::Broker("queue registry poisoned".to_string()))?;
        let queue = queues.entry(name.to_string()).or_insert_with(|| {
            let (sender, receiver) = mpsc::channel(self.capacity);
            Queue {
                sender,
                receiver: Some(receiver),
            }
        });
        Ok(f(queue))
    }
}

#[async_trait]
impl Producer for MemoryBroker {
    async fn publish(&self, queue: &str, payload: String) -> Result<()> {
        let sender = self.with_queue(queue, |q| q.sender.clone())?;
        sender.try_send(payload).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                FinchatError::Broker(format!("queue {queue} is full"))
            }
            mpsc::error::TrySendError::Closed(_) => {
                FinchatError::Broker(format!("queue {queue} has no consumer"))
            }
        })
    }
}

#[async_trait]
impl Consumer for MemoryBroker {
    async fn subscribe(&self, queue: &str) -> Result<Subscription> {
        let receiver = self
            .with_queue(queue, |q| q.receiver.take())?
            .ok_or_else(|| FinchatError::Broker(format!("queue {queue} already has a consumer")))?;
        tracing::debug!("Subscribed to queue {}", queue);
        Ok(Subscription::new(queue, receiver))
    }
}
