use std::path::Path;
use std::time::Duration;

use status_probe::{DisabledProbe, StatusProbe, DISABLED_PROBE_ID};
use status_probe_git::{GitStatusProbe, DEFAULT_GIT_TIMEOUT, GIT_PROBE_ID};
use status_probe_mock::{ScriptedStatusProbe, MOCK_PROBE_ID};

pub const DEFAULT_PROBE_ID: &str = GIT_PROBE_ID;

/// Builds the status probe named by `probe_id`, running in `workdir`.
pub fn probe_for_id(
    probe_id: &str,
    workdir: &Path,
    timeout: Option<Duration>,
) -> Result<Box<dyn StatusProbe>, String> {
    match probe_id {
        GIT_PROBE_ID => Ok(Box::new(
            GitStatusProbe::new(workdir).with_timeout(timeout.unwrap_or(DEFAULT_GIT_TIMEOUT)),
        )),
        DISABLED_PROBE_ID => Ok(Box::new(DisabledProbe)),
        MOCK_PROBE_ID => Ok(Box::new(ScriptedStatusProbe::default())),
        unknown => Err(format!(
            "Unsupported status probe '{unknown}'. Available probes: \
             {GIT_PROBE_ID}, {DISABLED_PROBE_ID}, {MOCK_PROBE_ID}"
        )),
    }
}
