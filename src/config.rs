//! Environment configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const ROOT_ENV_VAR: &str = "DEVLOG_ROOT";
pub const PROBE_ENV_VAR: &str = "DEVLOG_STATUS_PROBE";
pub const PROBE_TIMEOUT_ENV_VAR: &str = "DEVLOG_PROBE_TIMEOUT_MS";
pub const LOG_ENV_VAR: &str = "DEVLOG_LOG";

pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    /// Session root override; `<cwd>/.devlog/sessions` when unset.
    pub root: Option<PathBuf>,
    pub status_probe: Option<String>,
    pub probe_timeout: Option<Duration>,
    pub log_filter: Option<String>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            root: env_string_opt(ROOT_ENV_VAR).map(PathBuf::from),
            status_probe: env_string_opt(PROBE_ENV_VAR).map(|value| value.trim().to_string()),
            probe_timeout: env_millis_opt(PROBE_TIMEOUT_ENV_VAR),
            log_filter: env_string_opt(LOG_ENV_VAR),
        }
    }

    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

/// Zero and unparsable values are treated as unset.
fn env_millis_opt(key: &str) -> Option<Duration> {
    env_string_opt(key)
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|millis| *millis > 0)
        .map(Duration::from_millis)
}
