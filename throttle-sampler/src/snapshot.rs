//! The state file: one JSON object, replaced atomically.
//!
//! Writers go through `<path>.tmp` and a rename, the same way the generated
//! script does, so readers see either the previous snapshot or the new one.
//! Readers treat a missing or unparsable file as "no data".

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use throttle_core::PressureSnapshot;

use crate::error::{io_err, SamplerError};

pub fn write_snapshot(path: &Path, snapshot: &PressureSnapshot) -> Result<(), SamplerError> {
    let payload = serde_json::to_string(snapshot)?;
    let tmp = tmp_path(path);

    fs::write(&tmp, format!("{payload}\n")).map_err(|e| io_err(&tmp, e))?;
    set_world_readable(&tmp)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

/// Latest snapshot, or `None` when there is no usable data.
pub fn read_snapshot(path: &Path) -> Option<PressureSnapshot> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return None,
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "state file unreadable");
            return None;
        }
    };
    match serde_json::from_str(content.trim()) {
        Ok(snapshot) => Some(snapshot),
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "state file not a snapshot");
            None
        }
    }
}

/// Compact age of `snapshot` relative to `now` ("7s", "3m", "2h", "1d").
/// Timestamps in the future count as zero; timestamps outside chrono's
/// range are measured in raw epoch seconds.
pub fn format_age(snapshot: &PressureSnapshot, now: DateTime<Utc>) -> String {
    let age = match snapshot.observed_at() {
        Some(observed) => now.signed_duration_since(observed).num_seconds(),
        None => now.timestamp().saturating_sub(snapshot.timestamp),
    };
    format_seconds(age.max(0) as u64)
}

fn format_seconds(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut raw = OsString::from(path.as_os_str());
    raw.push(".tmp");
    PathBuf::from(raw)
}

#[cfg(unix)]
fn set_world_readable(path: &Path) -> Result<(), SamplerError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o644)).map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_world_readable(_path: &Path) -> Result<(), SamplerError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use throttle_core::PressureLevel;

    #[test]
    fn written_snapshot_has_exactly_two_keys() {
        let dir = TempDir::new().expect("dir");
        let path = dir.path().join("state");
        write_snapshot(&path, &PressureSnapshot::new(PressureLevel::Moderate, 1_700_000_000))
            .expect("write");

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
        let object = value.as_object().expect("object");
        assert_eq!(object.len(), 2);
        assert_eq!(object["pressure"], "moderate");
        assert_eq!(object["timestamp"], 1_700_000_000);
        assert!(!tmp_path(&path).exists());
    }

    #[cfg(unix)]
    #[test]
    fn written_snapshot_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().expect("dir");
        let path = dir.path().join("state");
        write_snapshot(&path, &PressureSnapshot::new(PressureLevel::Nominal, 1)).expect("write");
        let mode = fs::metadata(&path).expect("meta").permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn missing_and_corrupt_files_are_no_data() {
        let dir = TempDir::new().expect("dir");
        let path = dir.path().join("state");
        assert_eq!(read_snapshot(&path), None);

        fs::write(&path, r#"{"pressure":"heav"#).expect("write");
        assert_eq!(read_snapshot(&path), None);

        fs::write(&path, r#"{"pressure":"warm","timestamp":1}"#).expect("write");
        assert_eq!(read_snapshot(&path), None);
    }

    #[test]
    fn reads_script_written_snapshot() {
        let dir = TempDir::new().expect("dir");
        let path = dir.path().join("state");
        fs::write(&path, "{\"pressure\":\"trapping\",\"timestamp\":1700000123}\n").expect("write");
        assert_eq!(
            read_snapshot(&path),
            Some(PressureSnapshot::new(PressureLevel::Trapping, 1_700_000_123))
        );
    }

    #[test]
    fn age_formatting_is_compact() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).expect("now");
        let at = |secs_ago: i64| PressureSnapshot::new(PressureLevel::Nominal, 1_700_000_000 - secs_ago);
        assert_eq!(format_age(&at(0), now), "0s");
        assert_eq!(format_age(&at(59), now), "59s");
        assert_eq!(format_age(&at(125), now), "2m");
        assert_eq!(format_age(&at(7_200), now), "2h");
        assert_eq!(format_age(&at(3 * 86_400), now), "3d");
        assert_eq!(format_age(&at(-30), now), "0s");

        let ancient = PressureSnapshot::new(PressureLevel::Nominal, i64::MIN);
        assert!(format_age(&ancient, now).ends_with('d'));
        let far_future = PressureSnapshot::new(PressureLevel::Nominal, i64::MAX);
        assert_eq!(format_age(&far_future, now), "0s");
    }

    #[test]
    fn extreme_timestamp_in_state_file_still_formats() {
        let dir = TempDir::new().expect("dir");
        let path = dir.path().join("state");
        fs::write(&path, r#"{"pressure":"nominal","timestamp":-9223372036854775808}"#)
            .expect("write");
        let snapshot = read_snapshot(&path).expect("well-formed snapshot");
        assert!(format_age(&snapshot, Utc::now()).ends_with('d'));
    }
}
