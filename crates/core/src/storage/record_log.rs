use std::path::{Path, PathBuf};

use tracing::warn;

use crate::errors::CoreError;
use crate::models::record::TimeSeriesRecord;
use crate::models::settings::SnapshotGranularity;

/// Append-style JSONL log of wallet records, one JSON object per line.
///
/// The file is the user's data: lines this code did not write (or can no
/// longer parse) are preserved byte for byte on rewrite and skipped with
/// a warning on load.
pub struct RecordLog {
    path: PathBuf,
}

impl RecordLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert `record`, replacing any existing line whose timestamp
    /// truncates to the same date key. At most one record survives per
    /// key; re-running within the same period overwrites in place.
    pub fn upsert(
        &self,
        record: &TimeSeriesRecord,
        granularity: SnapshotGranularity,
    ) -> Result<(), CoreError> {
        let new_line = serde_json::to_string(record)
            .map_err(|e| CoreError::Serialization(e.to_string()))?;
        let key = granularity.truncate(record.date);

        let existing = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        let mut lines: Vec<String> = Vec::new();
        let mut replaced = false;
        let mut first_key: Option<chrono::NaiveDateTime> = None;

        for (idx, line) in existing.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<TimeSeriesRecord>(line) {
                Ok(parsed) => {
                    let line_key = granularity.truncate(parsed.date);
                    if first_key.is_none() {
                        first_key = Some(line_key);
                    }
                    if line_key == key {
                        if replaced {
                            warn!(
                                "{} line {}: duplicate record for {} dropped",
                                self.path.display(),
                                idx + 1,
                                line_key
                            );
                        } else {
                            lines.push(new_line.clone());
                            replaced = true;
                        }
                    } else {
                        lines.push(line.to_string());
                    }
                }
                Err(e) => {
                    warn!(
                        "{} line {}: unparseable log line kept untouched: {e}",
                        self.path.display(),
                        idx + 1
                    );
                    lines.push(line.to_string());
                }
            }
        }

        if !replaced {
            match first_key {
                // Backfilled record older than the whole log goes first,
                // everything else is appended.
                Some(first) if key < first => lines.insert(0, new_line),
                _ => lines.push(new_line),
            }
        }

        let mut out = lines.join("\n");
        out.push('\n');
        std::fs::write(&self.path, out)?;
        Ok(())
    }

    /// Read every parseable record in file order. A missing file is an
    /// empty history, not an error.
    pub fn load(&self) -> Result<Vec<TimeSeriesRecord>, CoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (idx, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<TimeSeriesRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    "{} line {}: skipping unparseable log line: {e}",
                    self.path.display(),
                    idx + 1
                ),
            }
        }
        Ok(records)
    }
}
