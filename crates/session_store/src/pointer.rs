use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::SessionStoreError;
use crate::id::SessionId;
use crate::paths::pointer_path;

/// File naming the open session; empty or absent when none is open.
#[derive(Debug, Clone)]
pub(crate) struct CurrentPointer {
    path: PathBuf,
}

impl CurrentPointer {
    pub(crate) fn new(root: &Path) -> Self {
        Self {
            path: pointer_path(root),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn read(&self) -> Result<Option<SessionId>, SessionStoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SessionStoreError::io(
                    "reading current session pointer",
                    &self.path,
                    source,
                ));
            }
        };

        if raw.trim().is_empty() {
            return Ok(None);
        }

        SessionId::parse(&raw).map(Some).map_err(|_| SessionStoreError::InvalidPointer {
            path: self.path.clone(),
            id: raw.trim().to_string(),
        })
    }

    pub(crate) fn set(&self, id: &SessionId) -> Result<(), SessionStoreError> {
        self.replace(&format!("{id}\n"))
    }

    pub(crate) fn clear(&self) -> Result<(), SessionStoreError> {
        self.replace("")
    }

    /// Writes a sibling temp file and renames it over the pointer.
    fn replace(&self, contents: &str) -> Result<(), SessionStoreError> {
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        fs::write(&staging, contents).map_err(|source| {
            SessionStoreError::io("writing current session pointer", &staging, source)
        })?;
        fs::rename(&staging, &self.path).map_err(|source| {
            SessionStoreError::io("replacing current session pointer", &self.path, source)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_and_empty_pointers_read_as_none() {
        let root = tempfile::tempdir().expect("tempdir should be created");
        let pointer = CurrentPointer::new(root.path());
        assert_eq!(pointer.read().expect("absent pointer reads"), None);

        fs::write(pointer.path(), "  \n").expect("blank pointer written");
        assert_eq!(pointer.read().expect("blank pointer reads"), None);
    }

    #[test]
    fn set_then_clear_round_trips_through_disk() {
        let root = tempfile::tempdir().expect("tempdir should be created");
        let pointer = CurrentPointer::new(root.path());
        let id = SessionId::parse("2026-10-19-143005-refactor").expect("valid id");

        pointer.set(&id).expect("set should succeed");
        assert_eq!(
            fs::read_to_string(pointer.path()).expect("pointer readable"),
            "2026-10-19-143005-refactor\n"
        );
        assert_eq!(pointer.read().expect("read"), Some(id.clone()));
        assert_eq!(pointer.read().expect("second read"), Some(id));

        pointer.clear().expect("clear should succeed");
        assert_eq!(
            fs::read_to_string(pointer.path()).expect("pointer readable"),
            ""
        );
        assert_eq!(pointer.read().expect("read after clear"), None);
    }

    #[test]
    fn tampered_pointer_is_rejected() {
        let root = tempfile::tempdir().expect("tempdir should be created");
        let pointer = CurrentPointer::new(root.path());
        fs::write(pointer.path(), "../../etc/passwd\n").expect("pointer written");

        assert!(matches!(
            pointer.read(),
            Err(SessionStoreError::InvalidPointer { id, .. }) if id == "../../etc/passwd"
        ));
    }
}
