// ── Navigation boundary ──

use std::sync::{Mutex, PoisonError};

use tracing::debug;

/// Default entry point of the onboarding flow.
pub const ONBOARDING_ENTRY: &str = "/onboarding/home";

/// Routing mechanism of the host application.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// [`Navigator`] that only records the routes it was asked for.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<String> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        debug!(route, "navigation recorded");
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route.to_owned());
    }
}
