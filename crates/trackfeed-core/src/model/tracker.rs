// ── Tracker domain types ──

use serde::{Deserialize, Serialize};
use strum::Display;

use super::ids::TrackerId;

/// Tracker operational status as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackerStatus {
    None,
    Busy,
    Error,
    Disconnected,
    Occluded,
    Ok,
}

impl TrackerStatus {
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Body position a tracker is assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum BodyPart {
    Head,
    Neck,
    Chest,
    Waist,
    Hip,
    LeftUpperLeg,
    RightUpperLeg,
    LeftLowerLeg,
    RightLowerLeg,
    LeftFoot,
    RightFoot,
    LeftLowerArm,
    RightLowerArm,
    LeftUpperArm,
    RightUpperArm,
    LeftHand,
    RightHand,
    LeftShoulder,
    RightShoulder,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3f {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quat {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Static description of a tracker.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerInfo {
    pub body_part: Option<BodyPart>,
    pub editable: bool,
    /// Computed by the server rather than backed by hardware.
    pub computed: bool,
    pub mounting_orientation: Option<Quat>,
    /// Update rate in Hz.
    pub poll_rate: Option<u16>,
    pub display_name: Option<String>,
}

/// One tracker entry of a feed update.
///
/// Every field except the id is optional: the server only fills what the
/// subscription's [`TrackerDataMask`](super::TrackerDataMask) asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerData {
    pub tracker_id: TrackerId,
    #[serde(default)]
    pub info: Option<TrackerInfo>,
    #[serde(default)]
    pub status: Option<TrackerStatus>,
    #[serde(default)]
    pub position: Option<Vec3f>,
    #[serde(default)]
    pub rotation: Option<Quat>,
    /// Sensor temperature in degrees Celsius.
    #[serde(default)]
    pub temp: Option<f32>,
}

impl TrackerData {
    /// A tracker carrying nothing but its id.
    pub fn new(tracker_id: TrackerId) -> Self {
        Self {
            tracker_id,
            info: None,
            status: None,
            position: None,
            rotation: None,
            temp: None,
        }
    }

    pub fn with_status(mut self, status: TrackerStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_info(mut self, info: TrackerInfo) -> Self {
        self.info = Some(info);
        self
    }

    pub fn body_part(&self) -> Option<BodyPart> {
        self.info.as_ref().and_then(|i| i.body_part)
    }

    pub fn is_computed(&self) -> bool {
        self.info.as_ref().is_some_and(|i| i.computed)
    }
}
