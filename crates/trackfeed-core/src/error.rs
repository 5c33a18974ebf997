// ── Core error types ──
//
// Errors surfaced by the synchronizer. Programmer errors (unknown action
// kinds, handles used outside their scope) are reported as dedicated
// variants so callers can abort on them instead of retrying.

use thiserror::Error;

use crate::transport::TransportError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Store errors ─────────────────────────────────────────────────
    #[error("unhandled state action {kind}")]
    UnhandledAction { kind: String },

    #[error("invalid payload for state action {kind}: {message}")]
    InvalidAction { kind: String, message: String },

    // ── Context errors ───────────────────────────────────────────────
    #[error("app context must be used within a running feed scope")]
    MissingContext,

    #[error("feed scope has ended; app context is no longer valid")]
    ContextClosed,

    // ── Collaborator errors ──────────────────────────────────────────
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl CoreError {
    /// Whether this error signals a wiring or code defect rather than a
    /// runtime condition.
    pub fn is_programmer_error(&self) -> bool {
        matches!(
            self,
            Self::UnhandledAction { .. } | Self::MissingContext | Self::ContextClosed
        )
    }
}
