// ── In-process transport ──
//
// Drives the synchronizer without a server: updates are pushed by the
// caller and outbound messages are recorded for inspection.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, watch};
use tracing::debug;

use super::{OutboundMessage, Transport, TransportError};
use crate::model::DataFeedUpdate;

/// Cheaply cloneable in-memory [`Transport`].
#[derive(Clone)]
pub struct MemoryTransport {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    connected: watch::Sender<bool>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<Arc<DataFeedUpdate>>>>,
    sent: Mutex<Vec<OutboundMessage>>,
    fail_next: Mutex<Option<TransportError>>,
}

impl MemoryTransport {
    /// A disconnected transport with no subscribers.
    pub fn new() -> Self {
        let (connected, _) = watch::channel(false);
        Self {
            inner: Arc::new(MemoryInner {
                connected,
                subscribers: Mutex::new(Vec::new()),
                sent: Mutex::new(Vec::new()),
                fail_next: Mutex::new(None),
            }),
        }
    }

    /// Change connectivity. Observers are only woken on a real transition.
    pub fn set_connected(&self, connected: bool) {
        self.inner.connected.send_if_modified(|current| {
            if *current == connected {
                return false;
            }
            *current = connected;
            true
        });
    }

    pub fn is_connected(&self) -> bool {
        *self.inner.connected.borrow()
    }

    /// Deliver an update to every live subscriber. Returns how many
    /// received it; closed subscriptions are pruned.
    pub fn publish(&self, update: Arc<DataFeedUpdate>) -> usize {
        let mut subscribers = lock(&self.inner.subscribers);
        subscribers.retain(|tx| tx.send(Arc::clone(&update)).is_ok());
        debug!(
            subscribers = subscribers.len(),
            trackers = update.tracker_count(),
            "feed update published"
        );
        subscribers.len()
    }

    /// Outbound messages accepted so far, in send order.
    pub fn sent(&self) -> Vec<OutboundMessage> {
        lock(&self.inner.sent).clone()
    }

    /// Live feed subscriptions.
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = lock(&self.inner.subscribers);
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }

    /// Make the next `send` fail with `error`.
    pub fn fail_next_send(&self, error: TransportError) {
        *lock(&self.inner.fail_next) = Some(error);
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MemoryTransport {
    fn send(&self, message: OutboundMessage) -> Result<(), TransportError> {
        if let Some(error) = lock(&self.inner.fail_next).take() {
            return Err(error);
        }
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        lock(&self.inner.sent).push(message);
        Ok(())
    }

    fn subscribe_feed(&self) -> mpsc::UnboundedReceiver<Arc<DataFeedUpdate>> {
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.inner.subscribers).push(tx);
        rx
    }

    fn connectivity(&self) -> watch::Receiver<bool> {
        self.inner.connected.subscribe()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StartDataFeed;

    fn start() -> OutboundMessage {
        OutboundMessage::StartDataFeed(StartDataFeed::default())
    }

    #[test]
    fn send_requires_connection() {
        let transport = MemoryTransport::new();
        assert_eq!(transport.send(start()), Err(TransportError::NotConnected));

        transport.set_connected(true);
        assert_eq!(transport.send(start()), Ok(()));
        assert_eq!(transport.sent(), vec![start()]);
    }

    #[test]
    fn injected_failure_applies_once() {
        let transport = MemoryTransport::new();
        transport.set_connected(true);
        transport.fail_next_send(TransportError::SendFailed("socket closed".into()));

        assert!(transport.send(start()).is_err());
        assert!(transport.send(start()).is_ok());
        assert_eq!(transport.sent().len(), 1);
    }

    #[test]
    fn publish_prunes_dropped_subscribers() {
        let transport = MemoryTransport::new();
        let mut kept = transport.subscribe_feed();
        let dropped = transport.subscribe_feed();
        drop(dropped);

        let delivered = transport.publish(Arc::new(DataFeedUpdate::default()));

        assert_eq!(delivered, 1);
        assert!(kept.try_recv().is_ok());
        assert_eq!(transport.subscriber_count(), 1);
    }

    #[test]
    fn connectivity_only_notifies_on_transition() {
        let transport = MemoryTransport::new();
        let mut rx = transport.connectivity();

        transport.set_connected(false);
        assert!(!rx.has_changed().unwrap_or(true));

        transport.set_connected(true);
        assert!(rx.has_changed().unwrap_or(false));
        assert!(*rx.borrow_and_update());
    }
}
