// ── Feed identity types ──
//
// Devices are numbered by the server; trackers are numbered within their
// device. Synthetic (computed) trackers carry no device id at all.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── DeviceId ────────────────────────────────────────────────────────

/// Server-assigned device number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub u8);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DeviceId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<u8> for DeviceId {
    fn from(id: u8) -> Self {
        Self(id)
    }
}

// ── TrackerId ───────────────────────────────────────────────────────

/// Tracker identity: its number plus the owning device, when it has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackerId {
    #[serde(default)]
    pub device_id: Option<DeviceId>,
    pub tracker_num: u8,
}

impl TrackerId {
    pub fn new(device_id: impl Into<DeviceId>, tracker_num: u8) -> Self {
        Self {
            device_id: Some(device_id.into()),
            tracker_num,
        }
    }

    /// Identity for a tracker reported without a parent device.
    pub fn synthetic(tracker_num: u8) -> Self {
        Self {
            device_id: None,
            tracker_num,
        }
    }
}

impl fmt::Display for TrackerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.device_id {
            Some(device) => write!(f, "{device}/{}", self.tracker_num),
            None => write!(f, "-/{}", self.tracker_num),
        }
    }
}
