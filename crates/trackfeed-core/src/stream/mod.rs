// ── Store subscriptions ──
//
// A `StateStream` follows the views the store publishes. Consumers either
// await it directly (`changed`, `wait_for`) or turn it into a `Stream`,
// optionally narrowed to the trackers a filter selects.

mod filter;

use std::sync::Arc;

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::StreamExt as _;
use tokio_stream::wrappers::WatchStream;

use crate::store::{FlatDeviceTracker, StoreView};

pub use filter::TrackerFilter;

/// Follows the store's published views.
///
/// `current` is the last view this subscriber has seen. It only moves
/// forward through `changed` or `wait_for`; `latest` peeks without marking.
pub struct StateStream {
    seen: Arc<StoreView>,
    views: watch::Receiver<Arc<StoreView>>,
}

impl StateStream {
    pub(crate) fn new(mut views: watch::Receiver<Arc<StoreView>>) -> Self {
        let seen = Arc::clone(&views.borrow_and_update());
        Self { seen, views }
    }

    pub fn current(&self) -> &Arc<StoreView> {
        &self.seen
    }

    pub fn latest(&self) -> Arc<StoreView> {
        Arc::clone(&self.views.borrow())
    }

    /// Trackers in the newest view that `filter` selects.
    pub fn trackers(&self, filter: &TrackerFilter) -> Vec<FlatDeviceTracker> {
        filter.apply(&self.views.borrow().trackers)
    }

    /// The first view published after the one last seen. Views published
    /// in between are skipped. `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<Arc<StoreView>> {
        self.views.changed().await.ok()?;
        let view = Arc::clone(&self.views.borrow_and_update());
        Some(self.mark_seen(view))
    }

    /// Wait until a view satisfies `ready`, starting with the newest one.
    ///
    /// Returns `None` if the store is dropped first.
    pub async fn wait_for(
        &mut self,
        mut ready: impl FnMut(&StoreView) -> bool,
    ) -> Option<Arc<StoreView>> {
        let view = Arc::clone(&*self.views.wait_for(|view| ready(view.as_ref())).await.ok()?);
        Some(self.mark_seen(view))
    }

    /// The newest view, then each later one, as a `Stream`.
    pub fn into_stream(self) -> impl Stream<Item = Arc<StoreView>> + Send + Unpin {
        WatchStream::new(self.views)
    }

    /// Like [`into_stream`](Self::into_stream), yielding only the trackers
    /// `filter` selects from each view.
    pub fn into_tracker_stream(
        self,
        filter: TrackerFilter,
    ) -> impl Stream<Item = Vec<FlatDeviceTracker>> + Send + Unpin {
        self.into_stream().map(move |view| filter.apply(&view.trackers))
    }

    fn mark_seen(&mut self, view: Arc<StoreView>) -> Arc<StoreView> {
        self.seen = Arc::clone(&view);
        view
    }
}
