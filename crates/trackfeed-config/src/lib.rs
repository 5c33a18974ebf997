//! Shared configuration for trackfeed tools.
//!
//! TOML file plus `TRACKFEED_` environment overrides, and translation to
//! the core `SyncConfig`. The CLI layers its global flags on top.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use trackfeed_core::{AppConfig, DataFeedConfig, SyncConfig};

/// Environment variable prefix. Nested keys are separated by `__`,
/// e.g. `TRACKFEED_LOG__LEVEL=debug`.
pub const ENV_PREFIX: &str = "TRACKFEED_";

const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Config {
    /// Application settings the synchronizer starts from.
    #[serde(default)]
    pub app: AppConfig,

    /// Data feed subscription sent on every (re)connect.
    #[serde(default)]
    pub feed: DataFeedConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LogConfig {
    /// Default log level when neither `RUST_LOG` nor `-v` is given.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".into()
}

impl Config {
    /// Runtime settings for `FeedSync`.
    pub fn sync_config(&self) -> SyncConfig {
        self.sync.clone()
    }

    /// Check values serde cannot: route shape and log level name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.sync.onboarding_entry.starts_with('/') {
            return Err(ConfigError::Validation {
                field: "sync.onboarding_entry".into(),
                reason: format!("expected an absolute route, got '{}'", self.sync.onboarding_entry),
            });
        }

        let level = self.log.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::Validation {
                field: "log.level".into(),
                reason: format!("expected one of {}, got '{}'", LOG_LEVELS.join(", "), self.log.level),
            });
        }

        Ok(())
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "trackfeed", "trackfeed").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("trackfeed");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from defaults, the TOML file and the environment.
///
/// `path` overrides the platform config path. A missing file is not an
/// error; the defaults and environment still apply.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

/// Load config, returning a default if it cannot be loaded.
pub fn load_config_or_default(path: Option<&Path>) -> Config {
    load_config(path).unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

/// Serialize config to TOML and write it to `path`, creating parent
/// directories as needed.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    cfg.validate()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;

    use super::*;

    fn load(path: &str) -> figment::error::Result<Config> {
        load_config(Some(Path::new(path))).map_err(|e| e.to_string().into())
    }

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_jail| {
            let config = load("absent.toml")?;
            assert_eq!(config, Config::default());
            assert_eq!(config.sync.onboarding_entry, "/onboarding/home");
            assert_eq!(config.feed.minimum_time_since_last, 100);
            assert_eq!(config.log.level, "warn");
            Ok(())
        });
    }

    #[test]
    fn file_values_override_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "trackfeed.toml",
                r#"
                [app]
                done_onboarding = true

                [feed]
                minimum_time_since_last = 250

                [sync]
                onboarding_entry = "/setup"
                "#,
            )?;

            let config = load("trackfeed.toml")?;
            assert!(config.app.done_onboarding);
            assert_eq!(config.feed.minimum_time_since_last, 250);
            assert_eq!(config.sync_config().onboarding_entry, "/setup");
            // Untouched sections keep their defaults.
            assert_eq!(config.feed.data_mask, DataFeedConfig::default().data_mask);
            assert_eq!(config.log, LogConfig::default());
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("trackfeed.toml", "[log]\nlevel = \"info\"\n")?;
            jail.set_env("TRACKFEED_LOG__LEVEL", "debug");
            jail.set_env("TRACKFEED_APP__DONE_ONBOARDING", "true");

            let config = load("trackfeed.toml")?;
            assert_eq!(config.log.level, "debug");
            assert!(config.app.done_onboarding);
            Ok(())
        });
    }

    #[test]
    fn invalid_values_are_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("route.toml", "[sync]\nonboarding_entry = \"setup\"\n")?;
            jail.create_file("level.toml", "[log]\nlevel = \"loud\"\n")?;

            assert!(matches!(
                load_config(Some(Path::new("route.toml"))),
                Err(ConfigError::Validation { ref field, .. }) if field == "sync.onboarding_entry"
            ));
            assert!(matches!(
                load_config(Some(Path::new("level.toml"))),
                Err(ConfigError::Validation { ref field, .. }) if field == "log.level"
            ));
            Ok(())
        });
    }

    #[test]
    fn malformed_file_is_a_figment_error() {
        Jail::expect_with(|jail| {
            jail.create_file("bad.toml", "[feed]\nminimum_time_since_last = \"soon\"\n")?;

            assert!(matches!(
                load_config(Some(Path::new("bad.toml"))),
                Err(ConfigError::Figment(_))
            ));
            assert_eq!(load_config_or_default(Some(Path::new("bad.toml"))), Config::default());
            Ok(())
        });
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.app.debug = true;
        config.sync.onboarding_entry = "/welcome".into();
        save_config_to(&config, &path).expect("save");

        let text = std::fs::read_to_string(&path).expect("read back");
        let loaded: Config = toml::from_str(&text).expect("parse");
        assert_eq!(loaded, config);
    }
}
