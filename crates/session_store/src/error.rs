use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification used by callers to pick exit codes and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NoActiveSession,
    AlreadyActive,
    /// The current pointer names a record that is missing or already closed.
    Inconsistent,
    StorageUnavailable,
    CorruptRecord,
}

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("no active session")]
    NoActiveSession,

    #[error("session '{id}' is already active; end it first or start with --close-active")]
    AlreadyActive { id: String },

    #[error("current session '{id}' has no record at {path}")]
    RecordMissing { id: String, path: PathBuf },

    #[error("session '{id}' is closed and cannot be modified")]
    RecordClosed { id: String },

    #[error("invalid session id '{id}'")]
    InvalidSessionId { id: String },

    #[error("current session pointer at {path} names invalid session id '{id}'")]
    InvalidPointer { path: PathBuf, id: String },

    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while reading line {line} in {path}: {source}")]
    IoLine {
        path: PathBuf,
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to acquire session lock at {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON at {path}:{line}: {source}")]
    JsonLineParse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize session line for {path}: {source}")]
    JsonSerialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("missing session header line in {path}")]
    MissingHeader { path: PathBuf },

    #[error("line {line} in {path} must be a session header record")]
    InvalidHeaderRecord { path: PathBuf, line: usize },

    #[error("line {line} in {path} must be an entry record")]
    InvalidEntryRecord { path: PathBuf, line: usize },

    #[error("line {line} in {path} has unknown record type '{found}'")]
    UnknownRecordType {
        path: PathBuf,
        line: usize,
        found: String,
    },

    #[error("line {line} in {path} has unsupported session version {found}; expected 1")]
    UnsupportedVersion {
        path: PathBuf,
        line: usize,
        found: u32,
    },

    #[error("line {line} in {path} has invalid RFC3339 timestamp in field '{field}': {value}")]
    InvalidTimestamp {
        path: PathBuf,
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("line {line} in {path} has non-absolute cwd path: {cwd}")]
    NonAbsoluteCwd {
        path: PathBuf,
        line: usize,
        cwd: String,
    },

    #[error("header in {path} names session '{found}' but the file belongs to '{expected}'")]
    SessionIdMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("line {line} in {path} has malformed revision '{value}'; expected 7-64 hex digits")]
    InvalidRevision {
        path: PathBuf,
        line: usize,
        value: String,
    },

    #[error("line {line} in {path} has sequence number {found}; expected {expected}")]
    SequenceGap {
        path: PathBuf,
        line: usize,
        expected: u32,
        found: u32,
    },

    #[error("line {line} in {path} must be the session start entry")]
    MissingStartEntry { path: PathBuf, line: usize },

    #[error("line {line} in {path} follows the closing entry")]
    EntryAfterClose { path: PathBuf, line: usize },

    #[error("failed to format current UTC timestamp as RFC3339: {0}")]
    ClockFormat(#[source] time::error::Format),
}

impl SessionStoreError {
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn io_line(path: impl Into<PathBuf>, line: usize, source: std::io::Error) -> Self {
        Self::IoLine {
            path: path.into(),
            line,
            source,
        }
    }

    #[must_use]
    pub fn lock(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Lock {
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn json_line(path: impl Into<PathBuf>, line: usize, source: serde_json::Error) -> Self {
        Self::JsonLineParse {
            path: path.into(),
            line,
            source,
        }
    }

    #[must_use]
    pub fn json_serialize(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::JsonSerialize {
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoActiveSession => ErrorKind::NoActiveSession,
            Self::AlreadyActive { .. } => ErrorKind::AlreadyActive,
            Self::RecordMissing { .. }
            | Self::RecordClosed { .. }
            | Self::InvalidPointer { .. } => ErrorKind::Inconsistent,
            Self::Io { .. } | Self::IoLine { .. } | Self::Lock { .. } | Self::ClockFormat(_) => {
                ErrorKind::StorageUnavailable
            }
            Self::InvalidSessionId { .. }
            | Self::JsonLineParse { .. }
            | Self::JsonSerialize { .. }
            | Self::MissingHeader { .. }
            | Self::InvalidHeaderRecord { .. }
            | Self::InvalidEntryRecord { .. }
            | Self::UnknownRecordType { .. }
            | Self::UnsupportedVersion { .. }
            | Self::InvalidTimestamp { .. }
            | Self::InvalidRevision { .. }
            | Self::NonAbsoluteCwd { .. }
            | Self::SessionIdMismatch { .. }
            | Self::SequenceGap { .. }
            | Self::MissingStartEntry { .. }
            | Self::EntryAfterClose { .. } => ErrorKind::CorruptRecord,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, SessionStoreError};

    #[test]
    fn lifecycle_errors_classify_by_kind() {
        assert_eq!(
            SessionStoreError::NoActiveSession.kind(),
            ErrorKind::NoActiveSession
        );
        assert_eq!(
            SessionStoreError::AlreadyActive {
                id: "2026-10-19-101500-refactor".to_string()
            }
            .kind(),
            ErrorKind::AlreadyActive
        );
        assert_eq!(
            SessionStoreError::RecordClosed {
                id: "old".to_string()
            }
            .kind(),
            ErrorKind::Inconsistent
        );
        assert_eq!(
            SessionStoreError::InvalidPointer {
                path: "/r/.current-session".into(),
                id: "../escape".to_string()
            }
            .kind(),
            ErrorKind::Inconsistent
        );
        assert_eq!(
            SessionStoreError::InvalidSessionId {
                id: "../escape".to_string()
            }
            .kind(),
            ErrorKind::CorruptRecord
        );
    }

    #[test]
    fn io_errors_are_storage_unavailable() {
        let error = SessionStoreError::io(
            "creating session root",
            "/nonexistent",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert_eq!(error.kind(), ErrorKind::StorageUnavailable);
        assert!(error
            .to_string()
            .starts_with("I/O error while creating session root at /nonexistent"));
    }
}
