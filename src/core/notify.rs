use std::sync::Mutex;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::debug;

/// Registry of subscribers that each receive every emitted value in order.
///
/// Late subscribers only see values emitted after they subscribed.
pub struct Broadcaster<T: Clone + Send> {
    subscribers: Mutex<Vec<UnboundedSender<T>>>,
}

impl<T: Clone + Send> Broadcaster<T> {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe(&self) -> UnboundedReceiver<T> {
        let (tx, rx) = unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(tx);
        rx
    }

    /// Sends `value` to every live subscriber and drops the closed ones.
    pub fn emit(&self, value: T) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subscribers.retain(|tx| tx.send(value.clone()).is_ok());
        debug!(subscribers = subscribers.len(), "Broadcast emitted");
    }

    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }
}

impl<T: Clone + Send> Default for Broadcaster<T> {
    fn default() -> Self {
        Self::new()
    }
}
