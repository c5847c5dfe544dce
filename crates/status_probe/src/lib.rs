//! Minimal contract for capturing the ambient status around a session event.
//!
//! This crate defines only the snapshot shape and the probe interface. Process
//! execution, version-control specifics, and failure degradation policy live in
//! the implementing crates and in `session_store`.

use std::fmt;
use std::sync::Arc;

/// Error returned when a probe cannot produce a snapshot or change summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeError {
    message: String,
}

impl ProbeError {
    /// Creates a new probe error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the underlying error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ProbeError {}

impl From<String> for ProbeError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ProbeError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Shortest and longest revision accepted, in hex digits.
pub const MIN_REVISION_LEN: usize = 7;
pub const MAX_REVISION_LEN: usize = 64;

/// Returns true for an abbreviated or full object id: 7 to 64 hex digits.
///
/// Revisions are read back from record files and handed to version-control
/// commands, so anything else (notably values starting with `-`) is refused.
#[must_use]
pub fn is_valid_revision(revision: &str) -> bool {
    (MIN_REVISION_LEN..=MAX_REVISION_LEN).contains(&revision.len())
        && revision.chars().all(|c| c.is_ascii_hexdigit())
}

/// Point-in-time description of the environment a session runs in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// Human-readable status text, e.g. short `git status` output.
    pub summary: String,
    /// Revision the working tree was at, when the probe can tell.
    pub revision: Option<String>,
}

impl StatusSnapshot {
    /// Constructs a snapshot without a revision.
    #[must_use]
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            revision: None,
        }
    }

    /// Snapshot with no text and no revision.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    /// Returns true when the snapshot carries neither text nor revision.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.summary.trim().is_empty() && self.revision.is_none()
    }
}

/// Source of ambient status snapshots.
pub trait StatusProbe {
    /// Stable identifier used for startup selection and logging.
    fn probe_id(&self) -> &str;

    /// Captures the current status.
    fn snapshot(&self) -> Result<StatusSnapshot, ProbeError>;

    /// Summarizes what changed since `revision` was captured.
    ///
    /// `revision` is `None` when the starting snapshot had no revision. Probes
    /// that cannot compute a change summary return an empty string.
    fn changes_since(&self, revision: Option<&str>) -> Result<String, ProbeError> {
        let _ = revision;
        Ok(String::new())
    }
}

impl<T: StatusProbe + ?Sized> StatusProbe for Arc<T> {
    fn probe_id(&self) -> &str {
        (**self).probe_id()
    }

    fn snapshot(&self) -> Result<StatusSnapshot, ProbeError> {
        (**self).snapshot()
    }

    fn changes_since(&self, revision: Option<&str>) -> Result<String, ProbeError> {
        (**self).changes_since(revision)
    }
}

/// Stable identifier for the probe that never reports anything.
pub const DISABLED_PROBE_ID: &str = "none";

/// Probe used when snapshots are turned off.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledProbe;

impl StatusProbe for DisabledProbe {
    fn probe_id(&self) -> &str {
        DISABLED_PROBE_ID
    }

    fn snapshot(&self) -> Result<StatusSnapshot, ProbeError> {
        Ok(StatusSnapshot::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::{is_valid_revision, DisabledProbe, ProbeError, StatusProbe, StatusSnapshot};

    struct FailingProbe;

    impl StatusProbe for FailingProbe {
        fn probe_id(&self) -> &str {
            "failing"
        }

        fn snapshot(&self) -> Result<StatusSnapshot, ProbeError> {
            Err(ProbeError::new("status unavailable"))
        }
    }

    #[test]
    fn probe_error_preserves_message() {
        let error = ProbeError::from("git exited with status 128");
        assert_eq!(error.message(), "git exited with status 128");
        assert_eq!(error.to_string(), "git exited with status 128");
    }

    #[test]
    fn snapshot_emptiness_considers_text_and_revision() {
        assert!(StatusSnapshot::empty().is_empty());
        assert!(StatusSnapshot::new("   \n").is_empty());
        assert!(!StatusSnapshot::new("## main").is_empty());
        assert!(!StatusSnapshot::new("").with_revision("abc123").is_empty());
    }

    #[test]
    fn default_changes_since_is_empty() {
        let probe = FailingProbe;
        assert!(probe.snapshot().is_err());
        assert_eq!(
            probe
                .changes_since(Some("abc123"))
                .expect("default change summary should not fail"),
            ""
        );
    }

    #[test]
    fn disabled_probe_returns_empty_snapshot() {
        let probe = DisabledProbe;
        assert_eq!(probe.probe_id(), "none");
        assert_eq!(
            probe.snapshot().expect("disabled probe never fails"),
            StatusSnapshot::empty()
        );
    }

    #[test]
    fn revisions_must_be_hex_object_ids() {
        assert!(is_valid_revision("abc1234"));
        assert!(is_valid_revision(&"0".repeat(40)));
        assert!(is_valid_revision(&"f".repeat(64)));

        assert!(!is_valid_revision("abc123"));
        assert!(!is_valid_revision(&"a".repeat(65)));
        assert!(!is_valid_revision("--output=/tmp/owned.txt"));
        assert!(!is_valid_revision("HEAD~1"));
        assert!(!is_valid_revision(""));
    }
}
