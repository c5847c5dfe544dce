//! `git`-backed implementation of the shared `status_probe` contract.
//!
//! Every probe call shells out to the `git` binary found on `PATH` with a
//! bounded wait and capped output. Nothing here mutates the repository.

mod command;

use std::path::{Path, PathBuf};
use std::time::Duration;

use status_probe::{is_valid_revision, ProbeError, StatusProbe, StatusSnapshot};

pub use command::{run_command, CommandOutput};

/// Stable probe identifier used for explicit startup selection.
pub const GIT_PROBE_ID: &str = "git";

pub const DEFAULT_GIT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_GIT_MAX_OUTPUT_BYTES: usize = 64 * 1024;

/// Probe reporting `git status`, `HEAD`, and change summaries for a work tree.
#[derive(Debug, Clone)]
pub struct GitStatusProbe {
    workdir: PathBuf,
    timeout: Duration,
    max_output_bytes: usize,
}

impl GitStatusProbe {
    #[must_use]
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            timeout: DEFAULT_GIT_TIMEOUT,
            max_output_bytes: DEFAULT_GIT_MAX_OUTPUT_BYTES,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_output_bytes(mut self, max_output_bytes: usize) -> Self {
        self.max_output_bytes = max_output_bytes;
        self
    }

    #[must_use]
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn git(&self, args: &[&str]) -> Result<String, ProbeError> {
        let output = run_command(
            "git",
            args,
            &self.workdir,
            self.timeout,
            self.max_output_bytes,
        )?;

        if !output.success {
            return Err(ProbeError::new(format!(
                "git {} failed ({}): {}",
                args.join(" "),
                output.status,
                output.stderr.trim()
            )));
        }

        Ok(output.stdout)
    }

    fn head_revision(&self) -> Option<String> {
        // An unborn branch has no HEAD; that is not a probe failure.
        match self.git(&["rev-parse", "--verify", "--quiet", "HEAD"]) {
            Ok(stdout) => {
                let revision = stdout.trim();
                (!revision.is_empty()).then(|| revision.to_string())
            }
            Err(error) => {
                tracing::debug!(%error, "no HEAD revision available");
                None
            }
        }
    }
}

impl StatusProbe for GitStatusProbe {
    fn probe_id(&self) -> &str {
        GIT_PROBE_ID
    }

    fn snapshot(&self) -> Result<StatusSnapshot, ProbeError> {
        let summary = self.git(&["status", "--short", "--branch"])?;
        let snapshot = StatusSnapshot::new(summary.trim_end());

        Ok(match self.head_revision() {
            Some(revision) => snapshot.with_revision(revision),
            None => snapshot,
        })
    }

    fn changes_since(&self, revision: Option<&str>) -> Result<String, ProbeError> {
        let Some(revision) = revision else {
            return Ok(self.git(&["diff", "--stat"])?.trim_end().to_string());
        };

        if !is_valid_revision(revision) {
            return Err(ProbeError::new(format!(
                "refusing to diff against malformed revision '{revision}'"
            )));
        }

        let range = format!("{revision}..HEAD");
        let commits = self.git(&["log", "--oneline", "--end-of-options", &range])?;
        let diff_stat = self.git(&["diff", "--stat", "--end-of-options", revision])?;

        Ok(format_change_summary(commits.trim_end(), diff_stat.trim_end()))
    }
}

fn format_change_summary(commits: &str, diff_stat: &str) -> String {
    let mut sections = Vec::new();
    if !commits.is_empty() {
        sections.push(format!("Commits:\n{commits}"));
    }
    if !diff_stat.is_empty() {
        sections.push(format!("Diff:\n{diff_stat}"));
    }
    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::format_change_summary;

    #[test]
    fn change_summary_omits_empty_sections() {
        assert_eq!(format_change_summary("", ""), "");
        assert_eq!(
            format_change_summary("abc123 add tests", ""),
            "Commits:\nabc123 add tests"
        );
        assert_eq!(
            format_change_summary("abc123 add tests", " a.rs | 2 +-"),
            "Commits:\nabc123 add tests\n\nDiff:\n a.rs | 2 +-"
        );
    }
}
