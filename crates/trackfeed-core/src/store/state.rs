// ── Store state and transition function ──

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::{DataFeedUpdate, TrackerData};

/// Wire kind of [`StateAction::DataFeed`].
pub const DATAFEED_ACTION: &str = "datafeed";

/// The store's single state value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppState {
    /// Latest feed snapshot. Starts out as an empty snapshot.
    pub datafeed: Option<Arc<DataFeedUpdate>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            datafeed: Some(Arc::new(DataFeedUpdate::default())),
        }
    }
}

impl AppState {
    /// Synthetic trackers of the current snapshot. Empty when absent.
    pub fn synthetic_trackers(&self) -> &[Arc<TrackerData>] {
        self.datafeed
            .as_deref()
            .map(|feed| feed.synthetic_trackers.as_slice())
            .unwrap_or_default()
    }
}

/// Mutations accepted by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum StateAction {
    /// Replace the feed snapshot wholesale.
    DataFeed(Arc<DataFeedUpdate>),
}

impl StateAction {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DataFeed(_) => DATAFEED_ACTION,
        }
    }
}

/// An action as it arrives from an untyped source: `{ "type", "value" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAction {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl TryFrom<RawAction> for StateAction {
    type Error = CoreError;

    fn try_from(raw: RawAction) -> Result<Self, Self::Error> {
        if raw.kind != DATAFEED_ACTION {
            return Err(CoreError::UnhandledAction { kind: raw.kind });
        }

        serde_json::from_value::<DataFeedUpdate>(raw.value)
            .map(|feed| Self::DataFeed(Arc::new(feed)))
            .map_err(|e| CoreError::InvalidAction {
                kind: raw.kind,
                message: e.to_string(),
            })
    }
}

/// Pure transition function.
///
/// The match is exhaustive: adding a `StateAction` variant does not
/// compile until it is handled here.
pub fn reduce(state: &AppState, action: StateAction) -> AppState {
    match action {
        StateAction::DataFeed(feed) => {
            let mut next = state.clone();
            next.datafeed = Some(feed);
            next
        }
    }
}
