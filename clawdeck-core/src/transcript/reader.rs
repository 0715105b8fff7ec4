//! Transcript file discovery and tolerant line-by-line parsing
//!
//! # Error Handling
//!
//! The reader is designed to degrade rather than fail:
//!
//! - **Unreadable directory**: returns an empty file list.
//! - **Unreadable file**: returns an empty record sequence.
//! - **Malformed line**: logged at debug level and skipped; parsing of the
//!   remaining lines continues. A line either fully parses into a
//!   [`RawRecord`] or is dropped.
//!
//! Callers must never fail because one file is corrupt.

use crate::transcript::record::RawRecord;
use std::io::BufRead;
use std::path::{Path, PathBuf};

/// Markers in file names that exclude a file from consideration.
const EXCLUDED_NAME_MARKERS: &[&str] = &["config-audit", ".deleted.", ".reset."];

/// One candidate session file paired with its last-modified time.
#[derive(Debug, Clone)]
pub struct SessionFile {
    pub path: PathBuf,
    /// Last-modified time, epoch milliseconds
    pub modified_ms: i64,
}

impl SessionFile {
    /// Session id: the file stem.
    pub fn session_id(&self) -> String {
        session_id_from_path(&self.path)
    }
}

/// Session id for a transcript path: the file stem.
pub fn session_id_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

/// Discover candidate session files in a directory.
///
/// Matches `*.jsonl`, excluding audit logs and tombstoned/reset files.
/// An unreadable directory yields an empty list, never an error.
pub fn session_files(dir: &Path) -> Vec<SessionFile> {
    let pattern = dir.join("*.jsonl");
    let Some(pattern) = pattern.to_str().map(str::to_string) else {
        return Vec::new();
    };

    let paths = match glob::glob(&pattern) {
        Ok(paths) => paths,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "bad glob pattern");
            return Vec::new();
        }
    };

    let mut files = Vec::new();
    for entry in paths.flatten() {
        let name = match entry.file_name().and_then(|n| n.to_str()) {
            Some(n) => n,
            None => continue,
        };
        if EXCLUDED_NAME_MARKERS.iter().any(|m| name.contains(m)) {
            continue;
        }
        let modified_ms = match std::fs::metadata(&entry)
            .and_then(|m| m.modified())
            .map(|t| chrono::DateTime::<chrono::Utc>::from(t).timestamp_millis())
        {
            Ok(ms) => ms,
            Err(e) => {
                tracing::debug!(path = %entry.display(), error = %e, "stat failed, skipping file");
                continue;
            }
        };
        files.push(SessionFile {
            path: entry,
            modified_ms,
        });
    }
    files
}

/// Discover candidate session files modified at or after `since_ms`.
pub fn session_files_since(dir: &Path, since_ms: i64) -> Vec<SessionFile> {
    session_files(dir)
        .into_iter()
        .filter(|f| f.modified_ms >= since_ms)
        .collect()
}

/// Parse a transcript file into its record sequence.
///
/// A read failure for the whole file yields an empty sequence. Malformed
/// individual lines are skipped silently.
pub fn read_records(path: &Path) -> Vec<RawRecord> {
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "unreadable transcript");
            return Vec::new();
        }
    };

    let mut records = Vec::new();
    let reader = std::io::BufReader::new(file);
    for (line_number, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                tracing::debug!(
                    path = %path.display(),
                    line = line_number + 1,
                    error = %e,
                    "read error, skipping line"
                );
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<RawRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::debug!(
                    path = %path.display(),
                    line = line_number + 1,
                    error = %e,
                    "malformed line, skipping"
                );
            }
        }
    }
    records
}
