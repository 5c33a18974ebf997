use crate::model::AppConfig;

/// Fires when the application configuration changes to one that still
/// needs onboarding.
///
/// Re-evaluation is keyed on the configuration value: observing an equal
/// value again never fires, even if it is a fresh copy.
#[derive(Debug, Default)]
pub struct OnboardingGate {
    last: Option<Option<AppConfig>>,
}

impl OnboardingGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest configuration. Returns `true` when the user
    /// should be sent to onboarding.
    pub fn observe(&mut self, config: Option<&AppConfig>) -> bool {
        if self.last.as_ref().is_some_and(|last| last.as_ref() == config) {
            return false;
        }
        self.last = Some(config.cloned());
        config.is_some_and(AppConfig::needs_onboarding)
    }
}
