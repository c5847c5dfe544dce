use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionRecordType {
    Session,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryRecordType {
    Entry,
}

pub const SESSION_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionHeader {
    #[serde(rename = "type")]
    pub record_type: SessionRecordType,
    pub version: u32,
    pub session_id: String,
    pub name: String,
    pub created_at: String,
    pub cwd: String,
}

impl SessionHeader {
    #[must_use]
    pub fn v1(
        session_id: impl Into<String>,
        name: impl Into<String>,
        created_at: impl Into<String>,
        cwd: impl Into<String>,
    ) -> Self {
        Self {
            record_type: SessionRecordType::Session,
            version: SESSION_FORMAT_VERSION,
            session_id: session_id.into(),
            name: name.into(),
            created_at: created_at.into(),
            cwd: cwd.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionEntry {
    #[serde(rename = "type")]
    pub record_type: EntryRecordType,
    pub seq: u32,
    pub ts: String,
    pub event: SessionEvent,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}

impl SessionEntry {
    #[must_use]
    pub fn new(
        seq: u32,
        ts: impl Into<String>,
        event: SessionEvent,
        status: impl Into<String>,
        revision: Option<String>,
    ) -> Self {
        Self {
            record_type: EntryRecordType::Entry,
            seq,
            ts: ts.into(),
            event,
            status: status.into(),
            revision,
        }
    }

    /// Free-text note carried by the entry; empty for the start entry.
    #[must_use]
    pub fn note(&self) -> &str {
        match &self.event {
            SessionEvent::Started => "",
            SessionEvent::Note { note } | SessionEvent::Closed { note, .. } => note,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEvent {
    Started,
    Note { note: String },
    Closed { note: String, changes: String },
}

impl SessionEvent {
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed { .. })
    }

    /// The persisted `kind` tag.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Note { .. } => "note",
            Self::Closed { .. } => "closed",
        }
    }
}

/// Just enough of a line to tell header and entry records apart.
#[derive(Debug, Deserialize)]
pub(crate) struct RecordTag {
    #[serde(rename = "type")]
    pub(crate) record_type: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn entry_serializes_nested_event_and_omits_missing_revision() {
        let entry = SessionEntry::new(
            2,
            "2026-10-19T14:31:00Z",
            SessionEvent::Note {
                note: "added tests".to_string(),
            },
            " M src/lib.rs",
            None,
        );

        let value = serde_json::to_value(&entry).expect("entry should serialize");
        assert_eq!(
            value,
            json!({
                "type": "entry",
                "seq": 2,
                "ts": "2026-10-19T14:31:00Z",
                "event": {"kind": "note", "note": "added tests"},
                "status": " M src/lib.rs",
            })
        );
    }

    #[test]
    fn note_accessor_covers_every_event() {
        let started = SessionEntry::new(1, "t", SessionEvent::Started, "", None);
        let closed = SessionEntry::new(
            2,
            "t",
            SessionEvent::Closed {
                note: "done".to_string(),
                changes: String::new(),
            },
            "",
            None,
        );
        assert_eq!(started.note(), "");
        assert_eq!(closed.note(), "done");
        assert!(closed.event.is_closed());
        assert!(!started.event.is_closed());
    }
}
