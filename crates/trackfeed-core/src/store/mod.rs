// ── Reactive data store ──
//
// Feed state, its pure transition function, and the tracker projection
// derived from it.

mod data_store;
mod projection;
mod state;

pub use data_store::{DataStore, StoreView};
pub use projection::{FlatDeviceTracker, project};
pub use state::{AppState, DATAFEED_ACTION, RawAction, StateAction, reduce};
