// ── Host application settings ──
//
// Owned by the configuration collaborator; the synchronizer only reads it.

use serde::{Deserialize, Serialize};

/// Application settings observed by the onboarding redirect.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// The user has finished the onboarding flow.
    pub done_onboarding: bool,
    pub debug: bool,
    pub watch_new_devices: bool,
}

impl AppConfig {
    pub fn needs_onboarding(&self) -> bool {
        !self.done_onboarding
    }
}
