// ── Filter predicates for tracker projections ──
//
// Used by display consumers to narrow the flattened tracker list without
// touching the store.

use crate::model::{BodyPart, DeviceId, TrackerStatus};
use crate::store::FlatDeviceTracker;

/// Filter predicate for flattened trackers.
pub enum TrackerFilter {
    All,
    ByDevice(DeviceId),
    ByStatus(TrackerStatus),
    ByBodyPart(BodyPart),
    Computed,
    Custom(Box<dyn Fn(&FlatDeviceTracker) -> bool + Send + Sync>),
}

impl TrackerFilter {
    pub fn matches(&self, entry: &FlatDeviceTracker) -> bool {
        match self {
            Self::All => true,
            Self::ByDevice(id) => entry.device.as_ref().is_some_and(|d| d.id == *id),
            Self::ByStatus(status) => entry.tracker.status == Some(*status),
            Self::ByBodyPart(part) => entry.tracker.body_part() == Some(*part),
            Self::Computed => entry.tracker.is_computed(),
            Self::Custom(f) => f(entry),
        }
    }

    /// Matching entries, in projection order.
    pub fn apply(&self, entries: &[FlatDeviceTracker]) -> Vec<FlatDeviceTracker> {
        entries.iter().filter(|e| self.matches(e)).cloned().collect()
    }
}
