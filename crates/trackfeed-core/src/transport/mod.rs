// ── Transport boundary ──
//
// The connection layer is owned by the host. The synchronizer only needs
// to send requests, receive feed updates and observe connectivity.

mod memory;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, watch};

use crate::model::{DataFeedUpdate, StartDataFeed};

pub use memory::MemoryTransport;

/// Requests the synchronizer sends to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum OutboundMessage {
    StartDataFeed(StartDataFeed),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("transport is not connected")]
    NotConnected,

    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Bidirectional message channel to the server.
///
/// Implementations deliver feed updates to each subscriber in receipt
/// order and without loss. Dropping the receiver ends the subscription.
pub trait Transport: Send + Sync {
    fn send(&self, message: OutboundMessage) -> Result<(), TransportError>;

    fn subscribe_feed(&self) -> mpsc::UnboundedReceiver<Arc<DataFeedUpdate>>;

    /// Current connectivity plus change notifications.
    ///
    /// The channel must only notify on a real flip. A notification that
    /// carries an unchanged value is read as a disconnect and reconnect
    /// that were coalesced.
    fn connectivity(&self) -> watch::Receiver<bool>;
}
