//! Development session tracking.
//!
//! The `devlog` binary drives [`session_store::SessionStore`] from the command
//! line: `start`, `update` and `end` move a session through its lifecycle while
//! a [`status_probe::StatusProbe`] captures the working tree status at each
//! step.
//!
//! Invariant: at most one session under a root is open at any time; the
//! current pointer names it.

pub mod app;
pub mod cli;
pub mod config;
pub mod logging;
pub mod probes;

pub use app::{exit_code, hint, open_store, run};
pub use cli::{Cli, Command};
pub use config::EnvConfig;
