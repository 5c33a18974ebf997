// ── Central reactive data store ──
//
// Holds the feed state and its tracker projection. Every mutation goes
// through `dispatch`, which reduces, re-projects and publishes the result
// to subscribers through a single `watch` channel.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use super::projection::{FlatDeviceTracker, project};
use super::state::{AppState, RawAction, StateAction, reduce};
use crate::error::CoreError;
use crate::stream::StateStream;

/// One published store value: the state and the projection derived from it.
///
/// State and trackers are always published together, so readers never see
/// a projection of an older state.
#[derive(Debug, Clone, Serialize)]
pub struct StoreView {
    pub state: Arc<AppState>,
    pub trackers: Arc<[FlatDeviceTracker]>,
    /// Number of actions applied so far.
    pub version: u64,
    /// When the last action was applied. `None` before the first one.
    pub updated_at: Option<DateTime<Utc>>,
}

impl StoreView {
    fn initial() -> Self {
        let state = AppState::default();
        let trackers = project(&state).into();
        Self {
            state: Arc::new(state),
            trackers,
            version: 0,
            updated_at: None,
        }
    }
}

/// Single-writer, many-reader store for the feed state.
///
/// `dispatch` is the only mutation path. It runs inside
/// `watch::Sender::send_modify`, so concurrent dispatches from several
/// threads are applied one at a time.
pub struct DataStore {
    view: watch::Sender<Arc<StoreView>>,
}

impl DataStore {
    pub fn new() -> Self {
        let (view, _) = watch::channel(Arc::new(StoreView::initial()));
        Self { view }
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Apply an action and publish the new state and projection.
    ///
    /// Returns the version this action produced.
    pub fn dispatch(&self, action: StateAction) -> u64 {
        let kind = action.kind();
        let mut applied = (0, 0);
        // `send_modify` updates unconditionally, even with zero receivers.
        self.view.send_modify(|view| {
            let state = reduce(&view.state, action);
            let trackers = if same_feed(&view.state, &state) {
                Arc::clone(&view.trackers)
            } else {
                project(&state).into()
            };

            let version = view.version + 1;
            applied = (version, trackers.len());
            *view = Arc::new(StoreView {
                state: Arc::new(state),
                trackers,
                version,
                updated_at: Some(Utc::now()),
            });
        });

        let (version, trackers) = applied;
        debug!(action = kind, version, trackers, "state action applied");
        version
    }

    /// Decode an untyped action and apply it.
    ///
    /// Unknown kinds fail with [`CoreError::UnhandledAction`] before the
    /// store is touched.
    pub fn dispatch_raw(&self, raw: RawAction) -> Result<(), CoreError> {
        let action = StateAction::try_from(raw)?;
        self.dispatch(action);
        Ok(())
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// Current published value (cheap `Arc` clone).
    pub fn view(&self) -> Arc<StoreView> {
        self.view.borrow().clone()
    }

    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.view.borrow().state)
    }

    pub fn trackers(&self) -> Arc<[FlatDeviceTracker]> {
        Arc::clone(&self.view.borrow().trackers)
    }

    pub fn version(&self) -> u64 {
        self.view.borrow().version
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.view.borrow().updated_at
    }

    /// How long ago the last action was applied, or `None` if never.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_update().map(|t| Utc::now() - t)
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe(&self) -> StateStream {
        StateStream::new(self.view.subscribe())
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

/// The projection only depends on the snapshot, so an identical snapshot
/// `Arc` lets the previous projection be reused.
fn same_feed(a: &AppState, b: &AppState) -> bool {
    match (&a.datafeed, &b.datafeed) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}
