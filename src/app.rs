//! Command dispatch and output rendering.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use serde_json::json;
use session_store::{
    ActivePolicy, ErrorKind, SessionEvent, SessionListing, SessionRecord, SessionStore,
    SessionStoreError, Summary, UpdateReceipt,
};

use crate::cli::{joined_words, Cli, Command};
use crate::config::EnvConfig;
use crate::probes::{probe_for_id, DEFAULT_PROBE_ID};

pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_NO_ACTIVE_SESSION: u8 = 3;
pub const EXIT_ALREADY_ACTIVE: u8 = 4;
pub const EXIT_INCONSISTENT: u8 = 5;

/// Opens the store for one invocation. `--root` wins over `DEVLOG_ROOT`;
/// relative roots resolve against `cwd`.
pub fn open_store(cli: &Cli, config: &EnvConfig, cwd: &Path) -> Result<SessionStore> {
    let probe_id = config.status_probe.as_deref().unwrap_or(DEFAULT_PROBE_ID);
    let probe = probe_for_id(probe_id, cwd, config.probe_timeout).map_err(anyhow::Error::msg)?;

    let store = match cli.root.as_ref().or(config.root.as_ref()) {
        Some(root) => SessionStore::new(cwd.join(root), cwd, probe),
        None => SessionStore::for_cwd(cwd, probe),
    };
    tracing::debug!(
        root = %store.root().display(),
        probe = store.probe_id(),
        "session store ready"
    );
    Ok(store)
}

pub fn run(cli: Cli, config: &EnvConfig, cwd: &Path, out: &mut dyn Write) -> Result<()> {
    let store = open_store(&cli, config, cwd)?;
    let json = cli.json;

    match cli.command {
        Command::Start { name, close_active } => {
            let policy = if close_active {
                ActivePolicy::CloseActive
            } else {
                ActivePolicy::Reject
            };
            let name = joined_words(&name);
            let id = store.start_with(name.as_deref(), policy)?;
            if json {
                writeln!(out, "{}", json!({ "session_id": id }))?;
            } else {
                writeln!(out, "Started session {id}")?;
            }
        }
        Command::Update { notes } => {
            let receipt = store.update(joined_words(&notes).as_deref())?;
            render_receipt(out, &receipt, json)?;
        }
        Command::End { notes } => {
            let summary = store.end(joined_words(&notes).as_deref())?;
            render_summary(out, &summary, json)?;
        }
        Command::Current => {
            let current = store.current()?;
            if json {
                writeln!(out, "{}", json!({ "session_id": current }))?;
            } else {
                match current {
                    Some(id) => writeln!(out, "{id}")?,
                    None => writeln!(out, "No active session")?,
                }
            }
        }
        Command::Status => {
            let active = store.active()?;
            render_status(out, active.as_ref(), json)?;
        }
        Command::List => {
            let listings = store.list()?;
            render_listings(out, &listings, json)?;
        }
        Command::Show { id } => {
            let record = store.show(&id)?;
            render_record(out, &record, json)?;
        }
    }

    Ok(())
}

/// Maps a failed invocation onto the process exit code.
pub fn exit_code(error: &anyhow::Error) -> u8 {
    match error
        .downcast_ref::<SessionStoreError>()
        .map(SessionStoreError::kind)
    {
        Some(ErrorKind::NoActiveSession) => EXIT_NO_ACTIVE_SESSION,
        Some(ErrorKind::AlreadyActive) => EXIT_ALREADY_ACTIVE,
        Some(ErrorKind::Inconsistent) => EXIT_INCONSISTENT,
        Some(ErrorKind::StorageUnavailable | ErrorKind::CorruptRecord) | None => EXIT_FAILURE,
    }
}

/// Follow-up advice printed after the error message, when there is any.
pub fn hint(error: &anyhow::Error) -> Option<&'static str> {
    match error
        .downcast_ref::<SessionStoreError>()
        .map(SessionStoreError::kind)?
    {
        ErrorKind::NoActiveSession => Some("run `devlog start [name]` to begin a session"),
        ErrorKind::AlreadyActive => Some("run `devlog end` first, or pass --close-active"),
        ErrorKind::Inconsistent => Some("run `devlog start` to replace the stale current session"),
        ErrorKind::StorageUnavailable | ErrorKind::CorruptRecord => None,
    }
}

fn render_receipt(out: &mut dyn Write, receipt: &UpdateReceipt, json: bool) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string(receipt)?)?;
    } else {
        writeln!(
            out,
            "Updated session {} ({} entries)",
            receipt.session_id, receipt.entry_count
        )?;
    }
    Ok(())
}

fn render_summary(out: &mut dyn Write, summary: &Summary, json: bool) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string(summary)?)?;
        return Ok(());
    }

    writeln!(
        out,
        "Ended session {} ({} entries)",
        summary.session_id, summary.entry_count
    )?;
    writeln!(out, "Started: {}", summary.started_at)?;
    writeln!(out, "Ended:   {}", summary.ended_at)?;
    writeln!(out, "Note:    {}", summary.note)?;
    if !summary.changes.trim().is_empty() {
        writeln!(out)?;
        writeln!(out, "Changes since start:")?;
        writeln!(out, "{}", summary.changes.trim_end())?;
    }
    Ok(())
}

fn render_status(out: &mut dyn Write, active: Option<&SessionRecord>, json: bool) -> Result<()> {
    let Some(record) = active else {
        if json {
            writeln!(out, "{}", json!({ "active": false }))?;
        } else {
            writeln!(out, "No active session")?;
        }
        return Ok(());
    };

    let header = record.header();
    let last = record.last_entry();
    if json {
        let value = json!({
            "active": true,
            "session_id": header.session_id,
            "name": header.name,
            "created_at": header.created_at,
            "entry_count": record.entry_count(),
            "last_note": last.map(|entry| entry.note()),
            "status": last.map(|entry| entry.status.as_str()),
        });
        writeln!(out, "{value}")?;
        return Ok(());
    }

    writeln!(out, "Session: {}", header.session_id)?;
    writeln!(out, "Name:    {}", header.name)?;
    writeln!(out, "Started: {}", header.created_at)?;
    writeln!(out, "Entries: {}", record.entry_count())?;
    if let Some(entry) = last {
        if !entry.note().is_empty() {
            writeln!(out, "Last:    {}", entry.note())?;
        }
        write_indented(out, &entry.status)?;
    }
    Ok(())
}

fn render_listings(out: &mut dyn Write, listings: &[SessionListing], json: bool) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string(listings)?)?;
        return Ok(());
    }
    if listings.is_empty() {
        writeln!(out, "No sessions recorded")?;
        return Ok(());
    }

    for listing in listings {
        let marker = if listing.current { '*' } else { ' ' };
        let state = if listing.closed { "closed" } else { "open" };
        write!(
            out,
            "{marker} {}  {state:<6}  {:>3} entries",
            listing.session_id, listing.entry_count
        )?;
        if listing.last_note.is_empty() {
            writeln!(out)?;
        } else {
            writeln!(out, "  {}", listing.last_note)?;
        }
    }
    Ok(())
}

fn render_record(out: &mut dyn Write, record: &SessionRecord, json: bool) -> Result<()> {
    if json {
        let value = json!({
            "header": record.header(),
            "entries": record.entries(),
            "closed": record.is_closed(),
        });
        writeln!(out, "{value}")?;
        return Ok(());
    }

    let header = record.header();
    writeln!(out, "Session: {}", header.session_id)?;
    writeln!(out, "Name:    {}", header.name)?;
    writeln!(out, "Cwd:     {}", header.cwd)?;
    writeln!(
        out,
        "State:   {}",
        if record.is_closed() { "closed" } else { "open" }
    )?;

    for entry in record.entries() {
        writeln!(out)?;
        write!(out, "{:>3}. {} [{}]", entry.seq, entry.ts, entry.event.kind())?;
        if entry.note().is_empty() {
            writeln!(out)?;
        } else {
            writeln!(out, " {}", entry.note())?;
        }
        write_indented(out, &entry.status)?;
        if let SessionEvent::Closed { changes, .. } = &entry.event {
            write_indented(out, changes)?;
        }
    }
    Ok(())
}

fn write_indented(out: &mut dyn Write, text: &str) -> Result<()> {
    for line in text.lines().filter(|line| !line.trim().is_empty()) {
        writeln!(out, "     {line}")?;
    }
    Ok(())
}
