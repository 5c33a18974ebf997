// ── Data feed messages and subscription masks ──
//
// A `DataFeedUpdate` is a complete point-in-time description of every
// device and tracker the server knows about. The client subscribes with
// one or more `DataFeedConfig`s whose masks decide which fields the
// server fills in.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::device::DeviceData;
use super::tracker::TrackerData;

/// Default minimum interval between two updates, in milliseconds.
pub const DEFAULT_FEED_INTERVAL_MS: u16 = 100;

// ── DataFeedUpdate ──────────────────────────────────────────────────

/// A full feed snapshot. Replaced wholesale on every update.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataFeedUpdate {
    #[serde(default)]
    pub devices: Vec<Arc<DeviceData>>,
    /// Trackers computed by the server, not owned by any device.
    #[serde(default)]
    pub synthetic_trackers: Vec<Arc<TrackerData>>,
}

impl DataFeedUpdate {
    pub fn new(devices: impl IntoIterator<Item = DeviceData>) -> Self {
        Self {
            devices: devices.into_iter().map(Arc::new).collect(),
            synthetic_trackers: Vec::new(),
        }
    }

    pub fn tracker_count(&self) -> usize {
        self.devices.iter().map(|d| d.trackers.len()).sum()
    }
}

// ── Masks ───────────────────────────────────────────────────────────

/// Which tracker fields the server should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerDataMask {
    pub info: bool,
    pub status: bool,
    pub position: bool,
    pub rotation: bool,
    pub temp: bool,
}

impl TrackerDataMask {
    /// Request every tracker field.
    pub fn all() -> Self {
        Self {
            info: true,
            status: true,
            position: true,
            rotation: true,
            temp: true,
        }
    }

    /// Strip the fields this mask does not request. The id is always kept.
    pub fn apply(&self, tracker: &TrackerData) -> TrackerData {
        TrackerData {
            tracker_id: tracker.tracker_id,
            info: if self.info { tracker.info.clone() } else { None },
            status: tracker.status.filter(|_| self.status),
            position: tracker.position.filter(|_| self.position),
            rotation: tracker.rotation.filter(|_| self.rotation),
            temp: tracker.temp.filter(|_| self.temp),
        }
    }
}

/// Which device data the server should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceDataMask {
    /// Mask for the device's own trackers. `None` sends no trackers.
    pub tracker_data: Option<TrackerDataMask>,
    pub device_data: bool,
}

impl DeviceDataMask {
    /// Shape a device. Returns `None` when device data is not requested.
    pub fn apply(&self, device: &DeviceData) -> Option<DeviceData> {
        if !self.device_data {
            return None;
        }

        let trackers = self
            .tracker_data
            .map(|mask| {
                device
                    .trackers
                    .iter()
                    .map(|t| Arc::new(mask.apply(t)))
                    .collect()
            })
            .unwrap_or_default();

        Some(DeviceData {
            id: device.id,
            custom_name: device.custom_name.clone(),
            hardware_status: device.hardware_status.clone(),
            hardware_info: device.hardware_info.clone(),
            trackers,
        })
    }
}

// ── Subscription ────────────────────────────────────────────────────

/// One data feed subscription: rate limit plus field masks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataFeedConfig {
    /// Minimum time between two updates, in milliseconds.
    pub minimum_time_since_last: u16,
    pub data_mask: Option<DeviceDataMask>,
    pub synthetic_trackers_mask: Option<TrackerDataMask>,
}

impl Default for DataFeedConfig {
    fn default() -> Self {
        Self {
            minimum_time_since_last: DEFAULT_FEED_INTERVAL_MS,
            data_mask: Some(DeviceDataMask {
                tracker_data: Some(TrackerDataMask::all()),
                device_data: true,
            }),
            synthetic_trackers_mask: Some(TrackerDataMask::all()),
        }
    }
}

impl DataFeedConfig {
    /// Shape a full update the way the server would for this subscription.
    ///
    /// Devices are dropped entirely without a `data_mask`; synthetic
    /// trackers are limited to computed ones and dropped without a
    /// `synthetic_trackers_mask`.
    pub fn shape(&self, update: &DataFeedUpdate) -> DataFeedUpdate {
        let devices = self
            .data_mask
            .map(|mask| {
                update
                    .devices
                    .iter()
                    .filter_map(|d| mask.apply(d))
                    .map(Arc::new)
                    .collect()
            })
            .unwrap_or_default();

        let synthetic_trackers = self
            .synthetic_trackers_mask
            .map(|mask| {
                update
                    .synthetic_trackers
                    .iter()
                    .filter(|t| t.is_computed())
                    .map(|t| Arc::new(mask.apply(t)))
                    .collect()
            })
            .unwrap_or_default();

        DataFeedUpdate {
            devices,
            synthetic_trackers,
        }
    }
}

/// Outbound request asking the server to start streaming updates.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StartDataFeed {
    pub data_feeds: Vec<DataFeedConfig>,
}
