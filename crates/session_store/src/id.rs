use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::SessionStoreError;

pub const DEFAULT_SESSION_NAME: &str = "session";
const MAX_SLUG_CHARS: usize = 64;

/// Identifier of one session record: `<YYYY-MM-DD-HHMMSS>-<slug>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Builds the identifier for a session created at `created_at` under `name`.
    ///
    /// `attempt` disambiguates collisions: 0 and 1 yield the bare id, larger
    /// values append `-<attempt>`.
    #[must_use]
    pub fn generate(created_at: OffsetDateTime, name: Option<&str>, attempt: u32) -> Self {
        let base = format!("{}-{}", timestamp_slug(created_at), name_slug(name));
        if attempt <= 1 {
            Self(base)
        } else {
            Self(format!("{base}-{attempt}"))
        }
    }

    /// Validates an identifier read back from disk or supplied by a user.
    pub fn parse(raw: &str) -> Result<Self, SessionStoreError> {
        let trimmed = raw.trim();
        let valid = !trimmed.is_empty()
            && !trimmed.starts_with('.')
            && trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'));

        if valid {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(SessionStoreError::InvalidSessionId {
                id: trimmed.to_string(),
            })
        }
    }

    /// Recovers the `attempt` this id was generated with; 1 for a bare id.
    #[must_use]
    pub fn collision_attempt(&self, created_at: OffsetDateTime, name: Option<&str>) -> u32 {
        let base = Self::generate(created_at, name, 1);
        self.0
            .strip_prefix(base.as_str())
            .and_then(|rest| rest.strip_prefix('-'))
            .and_then(|suffix| suffix.parse::<u32>().ok())
            .filter(|attempt| *attempt > 1)
            .unwrap_or(1)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn timestamp_slug(at: OffsetDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02}-{:02}{:02}{:02}",
        at.year(),
        u8::from(at.month()),
        at.day(),
        at.hour(),
        at.minute(),
        at.second()
    )
}

/// Reduces a free-form name to `[A-Za-z0-9_-]`, falling back to `session`.
#[must_use]
pub fn name_slug(name: Option<&str>) -> String {
    let mut slug = String::new();
    for c in name.unwrap_or_default().trim().chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let slug: String = slug.trim_matches('-').chars().take(MAX_SLUG_CHARS).collect();
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        DEFAULT_SESSION_NAME.to_string()
    } else {
        slug.to_string()
    }
}
