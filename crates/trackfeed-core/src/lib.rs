// trackfeed-core: Reactive synchronizer between a data feed transport and
// its consumers.

pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod model;
pub mod navigation;
pub mod policy;
pub mod store;
pub mod stream;
pub mod transport;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::SyncConfig;
pub use context::{AppContext, app_context};
pub use controller::{Collaborators, FeedSync};
pub use error::CoreError;
pub use navigation::{Navigator, ONBOARDING_ENTRY, RecordingNavigator};
pub use store::{AppState, DataStore, FlatDeviceTracker, RawAction, StateAction, StoreView};
pub use stream::{StateStream, TrackerFilter};
pub use transport::{MemoryTransport, OutboundMessage, Transport, TransportError};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    AppConfig, BodyPart, DataFeedConfig, DataFeedUpdate, DeviceData, DeviceDataMask, DeviceId,
    StartDataFeed, TrackerData, TrackerDataMask, TrackerId, TrackerInfo, TrackerStatus,
};
