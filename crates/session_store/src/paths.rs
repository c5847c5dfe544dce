use std::path::{Path, PathBuf};

pub const SESSION_DIR: [&str; 2] = [".devlog", "sessions"];
pub const POINTER_FILE_NAME: &str = ".current-session";
pub const LOCK_FILE_NAME: &str = ".lock";
pub const RECORD_EXTENSION: &str = "jsonl";

#[must_use]
pub fn session_root(cwd: &Path) -> PathBuf {
    cwd.join(SESSION_DIR[0]).join(SESSION_DIR[1])
}

#[must_use]
pub fn record_file_name(session_id: &str) -> String {
    format!("{session_id}.{RECORD_EXTENSION}")
}

#[must_use]
pub fn record_path(root: &Path, session_id: &str) -> PathBuf {
    root.join(record_file_name(session_id))
}

#[must_use]
pub fn pointer_path(root: &Path) -> PathBuf {
    root.join(POINTER_FILE_NAME)
}

#[must_use]
pub fn lock_path(root: &Path) -> PathBuf {
    root.join(LOCK_FILE_NAME)
}

/// Returns the session id a record path belongs to, if it looks like a record.
#[must_use]
pub fn session_id_from_path(path: &Path) -> Option<&str> {
    if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
        return None;
    }

    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.starts_with('.'))
}
