// ── Synchronizer configuration ──
//
// Runtime tuning for `FeedSync`. Never touches disk; the config crate
// loads it and hands it in.

use serde::{Deserialize, Serialize};

use crate::navigation::ONBOARDING_ENTRY;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Route opened when the configuration still needs onboarding.
    pub onboarding_entry: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            onboarding_entry: ONBOARDING_ENTRY.to_owned(),
        }
    }
}
