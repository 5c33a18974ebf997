// ── Device domain types ──

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::ids::DeviceId;
use super::tracker::TrackerData;

/// Live hardware readings for a device.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareStatus {
    pub error_status: Option<u8>,
    /// Packets per second received from the device.
    pub tps: Option<u16>,
    pub ping: Option<u16>,
    pub rssi: Option<i16>,
    pub mcu_temp: Option<f32>,
    pub battery_voltage: Option<f32>,
    pub battery_pct_estimate: Option<u8>,
}

/// Static hardware description of a device.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareInfo {
    pub firmware_version: Option<String>,
    pub hardware_revision: Option<String>,
    pub manufacturer: Option<String>,
    pub display_name: Option<String>,
    pub hardware_address: Option<String>,
    pub mcu_id: Option<String>,
}

/// A remote device and the trackers it owns, in server order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceData {
    pub id: DeviceId,
    #[serde(default)]
    pub custom_name: Option<String>,
    #[serde(default)]
    pub hardware_status: Option<HardwareStatus>,
    #[serde(default)]
    pub hardware_info: Option<HardwareInfo>,
    #[serde(default)]
    pub trackers: Vec<Arc<TrackerData>>,
}

impl DeviceData {
    pub fn new(id: impl Into<DeviceId>) -> Self {
        Self {
            id: id.into(),
            custom_name: None,
            hardware_status: None,
            hardware_info: None,
            trackers: Vec::new(),
        }
    }

    pub fn with_trackers(mut self, trackers: impl IntoIterator<Item = TrackerData>) -> Self {
        self.trackers = trackers.into_iter().map(Arc::new).collect();
        self
    }

    /// Name to show for this device: user-set name, then hardware name,
    /// then a generic label.
    pub fn display_name(&self) -> String {
        self.custom_name
            .clone()
            .or_else(|| {
                self.hardware_info
                    .as_ref()
                    .and_then(|info| info.display_name.clone())
            })
            .unwrap_or_else(|| format!("Device {}", self.id))
    }
}
