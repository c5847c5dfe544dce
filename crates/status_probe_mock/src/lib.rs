//! Deterministic mock implementation of the shared `status_probe` contract.
//!
//! This crate runs no subprocesses and is intended for local development and
//! lifecycle-level integration testing.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use status_probe::{ProbeError, StatusProbe, StatusSnapshot};

/// Stable probe identifier used for explicit startup selection.
pub const MOCK_PROBE_ID: &str = "mock";

const DEFAULT_SUMMARY: &str = "## mock...origin/mock\n M README.md";
const DEFAULT_REVISION: &str = "0000000000000000000000000000000000000000";
const DEFAULT_CHANGES: &str = "1 file changed, 1 insertion(+)";

#[derive(Debug, Default)]
struct ProbeState {
    queued: VecDeque<Result<StatusSnapshot, ProbeError>>,
    snapshot_calls: usize,
    change_requests: Vec<Option<String>>,
}

/// Probe that replays queued snapshots, then falls back to a fixed one.
#[derive(Debug)]
pub struct ScriptedStatusProbe {
    fallback: Result<StatusSnapshot, ProbeError>,
    changes: Result<String, ProbeError>,
    state: Mutex<ProbeState>,
}

impl ScriptedStatusProbe {
    /// Creates a probe that always answers with `fallback`.
    #[must_use]
    pub fn new(fallback: StatusSnapshot) -> Self {
        Self {
            fallback: Ok(fallback),
            changes: Ok(String::new()),
            state: Mutex::new(ProbeState::default()),
        }
    }

    /// Creates a probe whose every snapshot and change request fails.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            fallback: Err(ProbeError::new(message)),
            changes: Err(ProbeError::new(message)),
            state: Mutex::new(ProbeState::default()),
        }
    }

    #[must_use]
    pub fn with_changes(mut self, changes: Result<String, ProbeError>) -> Self {
        self.changes = changes;
        self
    }

    /// Queues one answer ahead of the fallback.
    pub fn push(&self, next: Result<StatusSnapshot, ProbeError>) {
        lock_unpoisoned(&self.state).queued.push_back(next);
    }

    /// Number of `snapshot` calls served so far.
    #[must_use]
    pub fn snapshot_calls(&self) -> usize {
        lock_unpoisoned(&self.state).snapshot_calls
    }

    /// Revisions passed to `changes_since`, in call order.
    #[must_use]
    pub fn change_requests(&self) -> Vec<Option<String>> {
        lock_unpoisoned(&self.state).change_requests.clone()
    }
}

impl Default for ScriptedStatusProbe {
    fn default() -> Self {
        Self::new(StatusSnapshot::new(DEFAULT_SUMMARY).with_revision(DEFAULT_REVISION))
            .with_changes(Ok(DEFAULT_CHANGES.to_string()))
    }
}

impl StatusProbe for ScriptedStatusProbe {
    fn probe_id(&self) -> &str {
        MOCK_PROBE_ID
    }

    fn snapshot(&self) -> Result<StatusSnapshot, ProbeError> {
        let mut state = lock_unpoisoned(&self.state);
        state.snapshot_calls += 1;
        state
            .queued
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }

    fn changes_since(&self, revision: Option<&str>) -> Result<String, ProbeError> {
        lock_unpoisoned(&self.state)
            .change_requests
            .push(revision.map(str::to_string));
        self.changes.clone()
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queued_answers_precede_fallback() {
        let probe = ScriptedStatusProbe::new(StatusSnapshot::new("fallback"));
        probe.push(Ok(StatusSnapshot::new("first")));
        probe.push(Err(ProbeError::new("second fails")));

        assert_eq!(
            probe.snapshot().expect("first queued answer"),
            StatusSnapshot::new("first")
        );
        assert_eq!(
            probe.snapshot().expect_err("second queued answer fails"),
            ProbeError::new("second fails")
        );
        assert_eq!(
            probe.snapshot().expect("fallback answer"),
            StatusSnapshot::new("fallback")
        );
        assert_eq!(probe.snapshot_calls(), 3);
    }

    #[test]
    fn default_probe_reports_revision_and_changes() {
        let probe = ScriptedStatusProbe::default();
        let snapshot = probe.snapshot().expect("default snapshot");
        assert_eq!(snapshot.revision.as_deref(), Some(DEFAULT_REVISION));
        assert!(snapshot.summary.starts_with("## mock"));

        let changes = probe
            .changes_since(snapshot.revision.as_deref())
            .expect("default changes");
        assert_eq!(changes, DEFAULT_CHANGES);
        assert_eq!(
            probe.change_requests(),
            vec![Some(DEFAULT_REVISION.to_string())]
        );
    }

    #[test]
    fn failing_probe_fails_both_calls() {
        let probe = ScriptedStatusProbe::failing("no repository");
        assert_eq!(
            probe.snapshot().expect_err("snapshot should fail").message(),
            "no repository"
        );
        assert!(probe.changes_since(None).is_err());
    }
}
