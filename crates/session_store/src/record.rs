use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use status_probe::{is_valid_revision, StatusSnapshot};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::SessionStoreError;
use crate::id::SessionId;
use crate::paths::{record_path, session_id_from_path};
use crate::schema::{
    RecordTag, SessionEntry, SessionEvent, SessionHeader, SESSION_FORMAT_VERSION,
};

const MAX_ID_ATTEMPTS: u32 = 100;

/// One session log: a header line followed by append-only entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    path: PathBuf,
    header: SessionHeader,
    entries: Vec<SessionEntry>,
}

impl SessionRecord {
    /// Creates a new record file under `root` and writes its header and start entry.
    ///
    /// Identifier collisions with existing files are resolved by suffixing.
    pub(crate) fn create_unique(
        root: &Path,
        created_at: OffsetDateTime,
        name: Option<&str>,
        cwd: &Path,
        snapshot: StatusSnapshot,
    ) -> Result<Self, SessionStoreError> {
        let ts = format_rfc3339(created_at)?;
        let display_name = name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(crate::id::DEFAULT_SESSION_NAME);

        for attempt in 1..=MAX_ID_ATTEMPTS {
            let id = SessionId::generate(created_at, name, attempt);
            let path = record_path(root, id.as_str());
            let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(source) if source.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(source) => {
                    return Err(SessionStoreError::io("creating session file", &path, source));
                }
            };

            let header = SessionHeader::v1(
                id.as_str(),
                display_name,
                ts.clone(),
                cwd.display().to_string(),
            );
            let first = SessionEntry::new(
                1,
                ts,
                SessionEvent::Started,
                snapshot.summary,
                snapshot.revision,
            );

            let lines = [to_json_line(&path, &header)?, to_json_line(&path, &first)?];
            if let Err(error) = write_lines(&path, file, &lines) {
                let _ = fs::remove_file(&path);
                return Err(error);
            }

            return Ok(Self {
                path,
                header,
                entries: vec![first],
            });
        }

        Err(SessionStoreError::io(
            "allocating a unique session id",
            root,
            io::Error::from(io::ErrorKind::AlreadyExists),
        ))
    }

    /// Loads and validates a record file.
    pub fn open(path: &Path) -> Result<Self, SessionStoreError> {
        let path = path.to_path_buf();
        let read_file = File::open(&path)
            .map_err(|source| SessionStoreError::io("opening session file", &path, source))?;
        let reader = BufReader::new(read_file);

        let mut header: Option<SessionHeader> = None;
        let mut entries: Vec<SessionEntry> = Vec::new();

        for (line_index, line_result) in reader.lines().enumerate() {
            let line_number = line_index + 1;
            let line = line_result
                .map_err(|source| SessionStoreError::io_line(&path, line_number, source))?;
            if line.trim().is_empty() {
                continue;
            }

            let tag = parse_line::<RecordTag>(&path, line_number, &line)?;
            match (header.is_some(), tag.record_type.as_str()) {
                (false, "session") => {
                    let parsed = parse_line::<SessionHeader>(&path, line_number, &line)?;
                    validate_header_line(&path, line_number, &parsed)?;
                    header = Some(parsed);
                }
                (false, "entry") => {
                    return Err(SessionStoreError::InvalidHeaderRecord {
                        path,
                        line: line_number,
                    });
                }
                (true, "session") => {
                    return Err(SessionStoreError::InvalidEntryRecord {
                        path,
                        line: line_number,
                    });
                }
                (true, "entry") => {
                    let entry = parse_line::<SessionEntry>(&path, line_number, &line)?;
                    validate_entry_line(&path, line_number, &entries, &entry)?;
                    entries.push(entry);
                }
                (_, other) => {
                    return Err(SessionStoreError::UnknownRecordType {
                        path,
                        line: line_number,
                        found: other.to_string(),
                    });
                }
            }
        }

        let header =
            header.ok_or_else(|| SessionStoreError::MissingHeader { path: path.clone() })?;
        if entries.is_empty() {
            return Err(SessionStoreError::MissingStartEntry { path, line: 2 });
        }

        Ok(Self {
            path,
            header,
            entries,
        })
    }

    /// Appends one entry; the record must still be open.
    pub(crate) fn append(
        &mut self,
        ts: OffsetDateTime,
        event: SessionEvent,
        snapshot: StatusSnapshot,
    ) -> Result<(), SessionStoreError> {
        if self.is_closed() {
            return Err(SessionStoreError::RecordClosed {
                id: self.header.session_id.clone(),
            });
        }
        if matches!(event, SessionEvent::Started) {
            return Err(SessionStoreError::InvalidEntryRecord {
                path: self.path.clone(),
                line: self.entries.len() + 2,
            });
        }

        let seq = u32::try_from(self.entries.len() + 1).unwrap_or(u32::MAX);
        let entry = SessionEntry::new(
            seq,
            format_rfc3339(ts)?,
            event,
            snapshot.summary,
            snapshot.revision,
        );

        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|source| {
                SessionStoreError::io("opening session file for append", &self.path, source)
            })?;
        write_lines(&self.path, file, &[to_json_line(&self.path, &entry)?])?;

        self.entries.push(entry);
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn header(&self) -> &SessionHeader {
        &self.header
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.header.session_id
    }

    #[must_use]
    pub fn entries(&self) -> &[SessionEntry] {
        &self.entries
    }

    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn last_entry(&self) -> Option<&SessionEntry> {
        self.entries.last()
    }

    /// Revision captured by the start entry, if the probe reported one.
    #[must_use]
    pub fn start_revision(&self) -> Option<&str> {
        self.entries.first().and_then(|entry| entry.revision.as_deref())
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.entries
            .last()
            .is_some_and(|entry| entry.event.is_closed())
    }
}

fn to_json_line(path: &Path, value: &impl Serialize) -> Result<String, SessionStoreError> {
    serde_json::to_string(value).map_err(|source| SessionStoreError::json_serialize(path, source))
}

/// Writes whole lines in one call and syncs them before returning.
fn write_lines(path: &Path, mut file: File, lines: &[String]) -> Result<(), SessionStoreError> {
    let mut buffer = lines.join("\n");
    buffer.push('\n');

    file.write_all(buffer.as_bytes())
        .map_err(|source| SessionStoreError::io("writing session file", path, source))?;
    file.sync_data()
        .map_err(|source| SessionStoreError::io("syncing session file", path, source))
}

pub(crate) fn format_rfc3339(at: OffsetDateTime) -> Result<String, SessionStoreError> {
    at.format(&Rfc3339).map_err(SessionStoreError::ClockFormat)
}

fn parse_line<T: serde::de::DeserializeOwned>(
    path: &Path,
    line_number: usize,
    line: &str,
) -> Result<T, SessionStoreError> {
    serde_json::from_str::<T>(line)
        .map_err(|source| SessionStoreError::json_line(path, line_number, source))
}

pub(crate) fn validate_header_line(
    path: &Path,
    line_number: usize,
    header: &SessionHeader,
) -> Result<(), SessionStoreError> {
    if header.version != SESSION_FORMAT_VERSION {
        return Err(SessionStoreError::UnsupportedVersion {
            path: path.to_path_buf(),
            line: line_number,
            found: header.version,
        });
    }

    validate_rfc3339(path, line_number, "created_at", &header.created_at)?;

    if !Path::new(&header.cwd).is_absolute() {
        return Err(SessionStoreError::NonAbsoluteCwd {
            path: path.to_path_buf(),
            line: line_number,
            cwd: header.cwd.clone(),
        });
    }

    if let Some(expected) = session_id_from_path(path) {
        if expected != header.session_id {
            return Err(SessionStoreError::SessionIdMismatch {
                path: path.to_path_buf(),
                expected: expected.to_string(),
                found: header.session_id.clone(),
            });
        }
    }

    Ok(())
}

pub(crate) fn validate_entry_line(
    path: &Path,
    line_number: usize,
    previous: &[SessionEntry],
    entry: &SessionEntry,
) -> Result<(), SessionStoreError> {
    validate_rfc3339(path, line_number, "ts", &entry.ts)?;

    if let Some(revision) = entry.revision.as_deref() {
        if !is_valid_revision(revision) {
            return Err(SessionStoreError::InvalidRevision {
                path: path.to_path_buf(),
                line: line_number,
                value: revision.to_string(),
            });
        }
    }

    let expected = u32::try_from(previous.len() + 1).unwrap_or(u32::MAX);
    if entry.seq != expected {
        return Err(SessionStoreError::SequenceGap {
            path: path.to_path_buf(),
            line: line_number,
            expected,
            found: entry.seq,
        });
    }

    if previous.last().is_some_and(|last| last.event.is_closed()) {
        return Err(SessionStoreError::EntryAfterClose {
            path: path.to_path_buf(),
            line: line_number,
        });
    }

    let is_start = matches!(entry.event, SessionEvent::Started);
    if previous.is_empty() != is_start {
        return Err(if is_start {
            SessionStoreError::InvalidEntryRecord {
                path: path.to_path_buf(),
                line: line_number,
            }
        } else {
            SessionStoreError::MissingStartEntry {
                path: path.to_path_buf(),
                line: line_number,
            }
        });
    }

    Ok(())
}

pub(crate) fn validate_rfc3339(
    path: &Path,
    line_number: usize,
    field: &'static str,
    value: &str,
) -> Result<(), SessionStoreError> {
    if OffsetDateTime::parse(value, &Rfc3339).is_err() {
        return Err(SessionStoreError::InvalidTimestamp {
            path: path.to_path_buf(),
            line: line_number,
            field,
            value: value.to_string(),
        });
    }

    Ok(())
}
