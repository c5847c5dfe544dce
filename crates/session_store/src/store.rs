use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use status_probe::{is_valid_revision, StatusProbe, StatusSnapshot};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::SessionStoreError;
use crate::id::{SessionId, DEFAULT_SESSION_NAME};
use crate::lock::StoreLock;
use crate::paths::{record_path, session_id_from_path, session_root};
use crate::pointer::CurrentPointer;
use crate::record::SessionRecord;
use crate::schema::SessionEvent;

pub const DEFAULT_UPDATE_NOTE: &str = "Continuing development";
pub const DEFAULT_END_NOTE: &str = "Session ended";

/// What `start` does when another session is still open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivePolicy {
    /// Fail with `AlreadyActive`.
    #[default]
    Reject,
    /// End the open session first, then start the new one.
    CloseActive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateReceipt {
    pub session_id: SessionId,
    pub entry_count: usize,
}

/// Result of closing a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub session_id: SessionId,
    pub name: String,
    pub entry_count: usize,
    pub note: String,
    pub changes: String,
    pub started_at: String,
    pub ended_at: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionListing {
    pub session_id: SessionId,
    pub name: String,
    pub created_at: String,
    pub entry_count: usize,
    pub closed: bool,
    pub current: bool,
    pub last_note: String,
}

/// Owner of the session records under one root and of the current pointer.
///
/// Every call re-reads state from disk under the root's advisory lock; nothing
/// is cached between calls.
pub struct SessionStore {
    root: PathBuf,
    cwd: PathBuf,
    probe: Box<dyn StatusProbe>,
    clock: fn() -> OffsetDateTime,
}

impl SessionStore {
    pub fn new(
        root: impl Into<PathBuf>,
        cwd: impl Into<PathBuf>,
        probe: Box<dyn StatusProbe>,
    ) -> Self {
        Self {
            root: root.into(),
            cwd: cwd.into(),
            probe,
            clock: OffsetDateTime::now_utc,
        }
    }

    /// Store rooted at `<cwd>/.devlog/sessions`.
    pub fn for_cwd(cwd: impl Into<PathBuf>, probe: Box<dyn StatusProbe>) -> Self {
        let cwd = cwd.into();
        Self::new(session_root(&cwd), cwd, probe)
    }

    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> OffsetDateTime) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn probe_id(&self) -> &str {
        self.probe.probe_id()
    }

    #[must_use]
    pub fn record_path(&self, id: &SessionId) -> PathBuf {
        record_path(&self.root, id.as_str())
    }

    /// Starts a session, failing if one is already open.
    pub fn start(&self, name: Option<&str>) -> Result<SessionId, SessionStoreError> {
        self.start_with(name, ActivePolicy::Reject)
    }

    pub fn start_with(
        &self,
        name: Option<&str>,
        policy: ActivePolicy,
    ) -> Result<SessionId, SessionStoreError> {
        fs::create_dir_all(&self.root).map_err(|source| {
            SessionStoreError::io("creating session root", &self.root, source)
        })?;
        let _lock = StoreLock::exclusive(&self.root)?;
        let pointer = CurrentPointer::new(&self.root);

        match self.active_record(&pointer) {
            Ok(active) => match policy {
                ActivePolicy::Reject => {
                    return Err(SessionStoreError::AlreadyActive {
                        id: active.id().to_string(),
                    });
                }
                ActivePolicy::CloseActive => {
                    let note = format!(
                        "Superseded by {}",
                        display_name(name).unwrap_or(DEFAULT_SESSION_NAME)
                    );
                    let summary = self.close(active, &pointer, &note)?;
                    tracing::info!(
                        session = %summary.session_id,
                        "closed active session before start"
                    );
                }
            },
            Err(SessionStoreError::NoActiveSession) => {}
            Err(
                error @ (SessionStoreError::RecordMissing { .. }
                | SessionStoreError::RecordClosed { .. }
                | SessionStoreError::InvalidPointer { .. }),
            ) => {
                tracing::warn!(%error, "replacing stale current session pointer");
            }
            Err(error) => return Err(error),
        }

        let snapshot = self.capture_snapshot("start");
        let record =
            SessionRecord::create_unique(&self.root, (self.clock)(), name, &self.cwd, snapshot)?;
        let id = SessionId::parse(record.id())?;
        pointer.set(&id)?;

        tracing::debug!(session = %id, path = %record.path().display(), "session started");
        Ok(id)
    }

    /// Appends a progress note to the open session.
    pub fn update(&self, note: Option<&str>) -> Result<UpdateReceipt, SessionStoreError> {
        if !self.root.is_dir() {
            return Err(SessionStoreError::NoActiveSession);
        }
        let _lock = StoreLock::exclusive(&self.root)?;
        let pointer = CurrentPointer::new(&self.root);
        let mut record = self.active_record(&pointer)?;

        let note = display_name(note).unwrap_or(DEFAULT_UPDATE_NOTE).to_string();
        let snapshot = self.capture_snapshot("update");
        record.append((self.clock)(), SessionEvent::Note { note }, snapshot)?;

        let receipt = UpdateReceipt {
            session_id: SessionId::parse(record.id())?,
            entry_count: record.entry_count(),
        };
        tracing::debug!(
            session = %receipt.session_id,
            entries = receipt.entry_count,
            "session updated"
        );
        Ok(receipt)
    }

    /// Closes the open session and clears the current pointer.
    pub fn end(&self, note: Option<&str>) -> Result<Summary, SessionStoreError> {
        if !self.root.is_dir() {
            return Err(SessionStoreError::NoActiveSession);
        }
        let _lock = StoreLock::exclusive(&self.root)?;
        let pointer = CurrentPointer::new(&self.root);
        let record = self.active_record(&pointer)?;

        let note = display_name(note).unwrap_or(DEFAULT_END_NOTE).to_string();
        let summary = self.close(record, &pointer, &note)?;
        tracing::debug!(
            session = %summary.session_id,
            entries = summary.entry_count,
            "session ended"
        );
        Ok(summary)
    }

    /// Identifier named by the current pointer, without validating the record.
    pub fn current(&self) -> Result<Option<SessionId>, SessionStoreError> {
        if !self.root.is_dir() {
            return Ok(None);
        }
        let _lock = StoreLock::shared(&self.root)?;
        CurrentPointer::new(&self.root).read()
    }

    /// The open record named by the current pointer.
    pub fn active(&self) -> Result<Option<SessionRecord>, SessionStoreError> {
        if !self.root.is_dir() {
            return Ok(None);
        }
        let _lock = StoreLock::shared(&self.root)?;
        match self.active_record(&CurrentPointer::new(&self.root)) {
            Ok(record) => Ok(Some(record)),
            Err(SessionStoreError::NoActiveSession) => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Every readable record under the root, in creation order.
    ///
    /// Records that fail validation are skipped with a warning.
    pub fn list(&self) -> Result<Vec<SessionListing>, SessionStoreError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let _lock = StoreLock::shared(&self.root)?;
        let current = CurrentPointer::new(&self.root).read().unwrap_or_else(|error| {
            tracing::warn!(%error, "ignoring unreadable current session pointer");
            None
        });

        let dir_entries = fs::read_dir(&self.root).map_err(|source| {
            SessionStoreError::io("listing session root", &self.root, source)
        })?;

        let mut listings = Vec::new();
        for dir_entry in dir_entries {
            let dir_entry = dir_entry.map_err(|source| {
                SessionStoreError::io("listing session root", &self.root, source)
            })?;
            let path = dir_entry.path();
            if session_id_from_path(&path).is_none() {
                continue;
            }

            let record = match SessionRecord::open(&path) {
                Ok(record) => record,
                Err(error) => {
                    tracing::warn!(%error, "skipping unreadable session record");
                    continue;
                }
            };
            let Ok(session_id) = SessionId::parse(record.id()) else {
                tracing::warn!(path = %path.display(), "skipping record with invalid session id");
                continue;
            };
            let created_at = OffsetDateTime::parse(&record.header().created_at, &Rfc3339).ok();
            let attempt = created_at.map_or(1, |at| {
                session_id.collision_attempt(at, Some(record.header().name.as_str()))
            });
            let order = (created_at, attempt, session_id.clone());
            let listing = SessionListing {
                current: current.as_ref() == Some(&session_id),
                session_id,
                name: record.header().name.clone(),
                created_at: record.header().created_at.clone(),
                entry_count: record.entry_count(),
                closed: record.is_closed(),
                last_note: record
                    .last_entry()
                    .map(|entry| entry.note().to_string())
                    .unwrap_or_default(),
            };
            listings.push((order, listing));
        }

        // Creation time first; ids sharing a second fall back to their collision suffix.
        listings.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(listings.into_iter().map(|(_, listing)| listing).collect())
    }

    /// Loads one record by identifier.
    pub fn show(&self, id: &str) -> Result<SessionRecord, SessionStoreError> {
        let id = SessionId::parse(id)?;
        let path = self.record_path(&id);
        if !path.is_file() {
            return Err(SessionStoreError::RecordMissing {
                id: id.to_string(),
                path,
            });
        }
        let _lock = StoreLock::shared(&self.root)?;
        SessionRecord::open(&path)
    }

    fn active_record(
        &self,
        pointer: &CurrentPointer,
    ) -> Result<SessionRecord, SessionStoreError> {
        let id = pointer.read()?.ok_or(SessionStoreError::NoActiveSession)?;
        let path = self.record_path(&id);
        if !path.is_file() {
            return Err(SessionStoreError::RecordMissing {
                id: id.to_string(),
                path,
            });
        }

        let record = SessionRecord::open(&path)?;
        if record.is_closed() {
            return Err(SessionStoreError::RecordClosed { id: id.to_string() });
        }
        Ok(record)
    }

    fn close(
        &self,
        mut record: SessionRecord,
        pointer: &CurrentPointer,
        note: &str,
    ) -> Result<Summary, SessionStoreError> {
        let snapshot = self.capture_snapshot("end");
        let changes = self.capture_changes(record.start_revision());
        record.append(
            (self.clock)(),
            SessionEvent::Closed {
                note: note.to_string(),
                changes: changes.clone(),
            },
            snapshot,
        )?;
        pointer.clear()?;

        Ok(Summary {
            session_id: SessionId::parse(record.id())?,
            name: record.header().name.clone(),
            entry_count: record.entry_count(),
            note: note.to_string(),
            changes,
            started_at: record.header().created_at.clone(),
            ended_at: record
                .last_entry()
                .map(|entry| entry.ts.clone())
                .unwrap_or_default(),
            path: record.path().to_path_buf(),
        })
    }

    fn capture_snapshot(&self, operation: &'static str) -> StatusSnapshot {
        match self.probe.snapshot() {
            Ok(mut snapshot) => {
                if let Some(revision) = snapshot.revision.take() {
                    if is_valid_revision(&revision) {
                        snapshot.revision = Some(revision);
                    } else {
                        tracing::warn!(
                            probe = self.probe.probe_id(),
                            operation,
                            %revision,
                            "dropping malformed revision from status snapshot"
                        );
                    }
                }
                snapshot
            }
            Err(error) => {
                tracing::warn!(
                    probe = self.probe.probe_id(),
                    operation,
                    %error,
                    "status snapshot unavailable; recording empty status"
                );
                StatusSnapshot::empty()
            }
        }
    }

    fn capture_changes(&self, revision: Option<&str>) -> String {
        match self.probe.changes_since(revision) {
            Ok(changes) => changes,
            Err(error) => {
                tracing::warn!(
                    probe = self.probe.probe_id(),
                    %error,
                    "change summary unavailable; recording none"
                );
                String::new()
            }
        }
    }
}

fn display_name(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}
