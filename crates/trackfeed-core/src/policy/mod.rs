// ── Reactive policies ──
//
// Value-keyed change detectors deciding when the controller acts on a
// connectivity or configuration change. Pure and synchronous so the
// trigger sequences can be tested without a runtime.

mod onboarding;
mod resubscribe;

pub use onboarding::OnboardingGate;
pub use resubscribe::ResubscribeGate;
