//! Timestamp of the last remote poll.

use std::path::Path;

use chrono::NaiveDateTime;

use crate::Result;

/// Format of the marker file content, e.g. `2024/03/19-14:05:00`.
pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d-%H:%M:%S";

/// Read the marker. A missing or unparsable marker yields `None`.
pub fn read_last_access(path: &Path) -> Result<Option<NaiveDateTime>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = shelf_fs::io::read_text(path)?;
    match NaiveDateTime::parse_from_str(content.trim(), TIMESTAMP_FORMAT) {
        Ok(timestamp) => Ok(Some(timestamp)),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Ignoring unreadable last access marker"
            );
            Ok(None)
        }
    }
}

pub fn write_last_access(path: &Path, now: NaiveDateTime) -> Result<()> {
    shelf_fs::io::write_text(path, &now.format(TIMESTAMP_FORMAT).to_string())?;
    Ok(())
}

/// Whether a poll is due.
///
/// Polling is date-granular: once the calendar date of `now` is past the
/// date of the last poll a new poll is due, regardless of elapsed hours.
pub fn should_poll(force: bool, last: Option<NaiveDateTime>, now: NaiveDateTime) -> bool {
    match last {
        _ if force => true,
        None => true,
        Some(last) => now.date() > last.date(),
    }
}
