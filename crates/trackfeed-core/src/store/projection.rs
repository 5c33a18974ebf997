// ── Tracker projection ──
//
// Flattens the feed snapshot into (tracker, owning device) pairs for
// display consumers. Pure and linear in the tracker count.

use std::sync::Arc;

use serde::Serialize;

use super::state::AppState;
use crate::model::{DeviceData, TrackerData};

/// A tracker paired with the device that owns it.
///
/// The device is optional so consumers can also hold trackers reported
/// without a parent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatDeviceTracker {
    pub device: Option<Arc<DeviceData>>,
    pub tracker: Arc<TrackerData>,
}

/// Flatten `state` in device order, then tracker order within a device.
///
/// An absent snapshot projects to an empty list.
pub fn project(state: &AppState) -> Vec<FlatDeviceTracker> {
    let Some(feed) = state.datafeed.as_deref() else {
        return Vec::new();
    };

    let mut flat = Vec::with_capacity(feed.tracker_count());
    for device in &feed.devices {
        flat.extend(device.trackers.iter().map(|tracker| FlatDeviceTracker {
            device: Some(Arc::clone(device)),
            tracker: Arc::clone(tracker),
        }));
    }
    flat
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{DataFeedUpdate, TrackerId};

    fn tracker(device: u8, num: u8) -> TrackerData {
        TrackerData::new(TrackerId::new(device, num))
    }

    fn state_with(feed: DataFeedUpdate) -> AppState {
        AppState {
            datafeed: Some(Arc::new(feed)),
        }
    }

    #[test]
    fn flattens_in_device_then_tracker_order() {
        let d1 = DeviceData::new(1).with_trackers([tracker(1, 0), tracker(1, 1)]);
        let d2 = DeviceData::new(2).with_trackers([tracker(2, 0)]);
        let state = state_with(DataFeedUpdate::new([d1, d2]));

        let pairs: Vec<(String, Option<u8>)> = project(&state)
            .iter()
            .map(|p| (p.tracker.tracker_id.to_string(), p.device.as_ref().map(|d| d.id.0)))
            .collect();

        assert_eq!(
            pairs,
            vec![
                ("1/0".to_owned(), Some(1)),
                ("1/1".to_owned(), Some(1)),
                ("2/0".to_owned(), Some(2)),
            ]
        );
    }

    #[test]
    fn pairs_share_the_snapshot_entries() {
        let state = state_with(DataFeedUpdate::new([
            DeviceData::new(1).with_trackers([tracker(1, 0)])
        ]));
        let feed = state.datafeed.clone().unwrap_or_default();

        let flat = project(&state);

        assert!(Arc::ptr_eq(&flat[0].tracker, &feed.devices[0].trackers[0]));
        assert!(flat[0]
            .device
            .as_ref()
            .is_some_and(|d| Arc::ptr_eq(d, &feed.devices[0])));
    }

    #[test]
    fn empty_and_absent_snapshots_project_to_nothing() {
        assert!(project(&AppState::default()).is_empty());
        assert!(project(&AppState { datafeed: None }).is_empty());
        assert!(project(&state_with(DataFeedUpdate::new([DeviceData::new(1)]))).is_empty());
    }

    #[test]
    fn projection_is_repeatable() {
        let state = state_with(DataFeedUpdate::new([
            DeviceData::new(1).with_trackers([tracker(1, 0), tracker(1, 1)]),
            DeviceData::new(2).with_trackers([tracker(2, 0)]),
        ]));

        assert_eq!(project(&state), project(&state));
    }

    #[test]
    fn synthetic_trackers_are_not_projected() {
        let mut feed = DataFeedUpdate::new([DeviceData::new(1).with_trackers([tracker(1, 0)])]);
        feed.synthetic_trackers = vec![Arc::new(TrackerData::new(TrackerId::synthetic(4)))];
        let state = state_with(feed);

        assert_eq!(project(&state).len(), 1);
        assert_eq!(state.synthetic_trackers().len(), 1);
    }
}
