// ── Feed domain model ──
//
// Canonical representation of the data feed: devices, the trackers they
// own, the subscription masks that shape them, and the host settings the
// synchronizer observes.

pub mod device;
pub mod feed;
pub mod ids;
pub mod settings;
pub mod tracker;

// ── Re-exports ──────────────────────────────────────────────────────

pub use device::{DeviceData, HardwareInfo, HardwareStatus};
pub use feed::{
    DEFAULT_FEED_INTERVAL_MS, DataFeedConfig, DataFeedUpdate, DeviceDataMask, StartDataFeed,
    TrackerDataMask,
};
pub use ids::{DeviceId, TrackerId};
pub use settings::AppConfig;
pub use tracker::{BodyPart, Quat, TrackerData, TrackerInfo, TrackerStatus, Vec3f};
