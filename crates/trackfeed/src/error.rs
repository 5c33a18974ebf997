//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use trackfeed_config::ConfigError;
use trackfeed_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const SCRIPT: i32 = 4;
    pub const INTERNAL: i32 = 5;
}

#[derive(Debug, Error, Diagnostic)]
#[allow(unused_assignments)]
pub enum CliError {
    // ── Session script ───────────────────────────────────────────────

    #[error("Invalid event on line {line} of {path}: {message}")]
    #[diagnostic(
        code(trackfeed::script),
        help(
            "Each line must be one JSON event, e.g.\n\
             {{\"event\": \"connected\", \"value\": true}}\n\
             Known events: connected, config, feed, feed_config, action"
        )
    )]
    Script {
        path: String,
        line: usize,
        message: String,
    },

    #[error("Unhandled state action '{kind}' on line {line}")]
    #[diagnostic(
        code(trackfeed::unhandled_action),
        help("The store only accepts actions of type 'datafeed'.")
    )]
    UnhandledAction { kind: String, line: usize },

    #[error("Invalid '{kind}' action on line {line}: {message}")]
    #[diagnostic(code(trackfeed::invalid_action))]
    InvalidAction {
        kind: String,
        line: usize,
        message: String,
    },

    // ── Synchronizer ─────────────────────────────────────────────────

    #[error("Feed synchronizer failed: {message}")]
    #[diagnostic(code(trackfeed::internal))]
    Internal { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(trackfeed::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Configuration file already exists at {path}")]
    #[diagnostic(
        code(trackfeed::config_exists),
        help("Use --force to overwrite it, or edit it directly.")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(
        code(trackfeed::config),
        help("Check the config file and TRACKFEED_* environment variables.\nRun: trackfeed config path")
    )]
    Config(#[from] ConfigError),

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    #[diagnostic(code(trackfeed::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    #[diagnostic(code(trackfeed::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML serialization failed: {0}")]
    #[diagnostic(code(trackfeed::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Script { .. } | Self::InvalidAction { .. } => exit_code::SCRIPT,
            Self::UnhandledAction { .. } | Self::Internal { .. } => exit_code::INTERNAL,
            Self::Validation { .. } => exit_code::USAGE,
            Self::ConfigExists { .. } | Self::Config(_) => exit_code::CONFIG,
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the script line an action came from.
    pub fn from_action(err: CoreError, line: usize) -> Self {
        match err {
            CoreError::UnhandledAction { kind } => Self::UnhandledAction { kind, line },
            CoreError::InvalidAction { kind, message } => Self::InvalidAction {
                kind,
                line,
                message,
            },
            other => Self::from(other),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnhandledAction { kind } => CliError::UnhandledAction { kind, line: 0 },

            CoreError::InvalidAction { kind, message } => CliError::InvalidAction {
                kind,
                line: 0,
                message,
            },

            other => CliError::Internal {
                message: other.to_string(),
            },
        }
    }
}
