//! Diagnostic logging to stderr.
//!
//! Library crates only emit `tracing` events; the binary installs the one
//! subscriber here. Stdout is reserved for command output.

use tracing_subscriber::EnvFilter;

use crate::config::DEFAULT_LOG_FILTER;

/// Parses `filter`, falling back to the default when it is not a valid directive.
pub fn env_filter(filter: &str) -> EnvFilter {
    EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Installs the global subscriber. A second call is a no-op.
pub fn init(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn valid_filters_are_kept() {
        assert_eq!(
            env_filter("session_store=debug").max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
    }

    #[test]
    fn invalid_filters_fall_back_to_default() {
        assert_eq!(
            env_filter("session_store=loud").max_level_hint(),
            Some(LevelFilter::WARN)
        );
    }

    #[test]
    fn repeated_init_does_not_panic() {
        init("warn");
        init("debug");
    }
}
