//! Durable development-session logs with a single "current session" pointer.
//!
//! A session root holds one JSONL record per session plus a pointer file naming
//! the open one. [`SessionStore`] drives the start/update/end lifecycle; each
//! call re-reads the pointer from disk under an advisory lock on the root.

mod error;
mod id;
mod lock;
mod paths;
mod pointer;
mod record;
mod schema;
mod store;

pub use error::{ErrorKind, SessionStoreError};
pub use id::{name_slug, SessionId, DEFAULT_SESSION_NAME};
pub use paths::{
    pointer_path, record_file_name, record_path, session_root, LOCK_FILE_NAME,
    POINTER_FILE_NAME, SESSION_DIR,
};
pub use record::SessionRecord;
pub use schema::{
    EntryRecordType, SessionEntry, SessionEvent, SessionHeader, SessionRecordType,
    SESSION_FORMAT_VERSION,
};
pub use store::{
    ActivePolicy, SessionListing, SessionStore, Summary, UpdateReceipt, DEFAULT_END_NOTE,
    DEFAULT_UPDATE_NOTE,
};
