use std::io::{self, Read};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use status_probe::ProbeError;
use wait_timeout::ChildExt;

/// Captured result of one finished child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: String,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Runs `program args..` in `cwd`, killing it after `timeout`.
///
/// Output streams are drained on background threads so a chatty child cannot
/// block on a full pipe while we wait on it.
pub fn run_command(
    program: &str,
    args: &[&str],
    cwd: &Path,
    timeout: Duration,
    max_output_bytes: usize,
) -> Result<CommandOutput, ProbeError> {
    let mut child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|error| ProbeError::new(format!("failed to launch {program}: {error}")))?;

    let stdout_reader = spawn_pipe_reader(child.stdout.take(), max_output_bytes);
    let stderr_reader = spawn_pipe_reader(child.stderr.take(), max_output_bytes);

    let status = match child.wait_timeout(timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ProbeError::new(format!(
                "{program} {} timed out after {}ms",
                args.join(" "),
                timeout.as_millis()
            )));
        }
        Err(error) => {
            let _ = child.kill();
            return Err(ProbeError::new(format!(
                "failed waiting for {program}: {error}"
            )));
        }
    };

    let stdout = String::from_utf8_lossy(&join_pipe_reader(stdout_reader)).into_owned();
    let stderr = String::from_utf8_lossy(&join_pipe_reader(stderr_reader)).into_owned();

    Ok(CommandOutput {
        status: format_exit_status(status),
        success: status.success(),
        stdout: truncate_to_byte_limit(stdout, max_output_bytes),
        stderr: truncate_to_byte_limit(stderr, max_output_bytes),
    })
}

type PipeReader = Option<thread::JoinHandle<Vec<u8>>>;

/// Keeps at most `max_bytes + 1` bytes, so truncation can still be detected,
/// and discards the rest of the stream.
fn spawn_pipe_reader(pipe: Option<impl Read + Send + 'static>, max_bytes: usize) -> PipeReader {
    let mut pipe = pipe?;
    let limit = u64::try_from(max_bytes)
        .unwrap_or(u64::MAX)
        .saturating_add(1);
    Some(thread::spawn(move || {
        let mut bytes = Vec::new();
        let _ = (&mut pipe).take(limit).read_to_end(&mut bytes);
        let _ = io::copy(&mut pipe, &mut io::sink());
        bytes
    }))
}

fn join_pipe_reader(reader: PipeReader) -> Vec<u8> {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

pub(crate) fn truncate_to_byte_limit(content: String, max_bytes: usize) -> String {
    if content.len() <= max_bytes {
        return content;
    }

    let mut cutoff = max_bytes.min(content.len());
    while cutoff > 0 && !content.is_char_boundary(cutoff) {
        cutoff -= 1;
    }

    let mut truncated = content[..cutoff].to_string();
    truncated.push_str("\n[truncated]");
    truncated
}

fn format_exit_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit_code={code}"),
        None => "exit_code=terminated_by_signal".to_string(),
    }
}
