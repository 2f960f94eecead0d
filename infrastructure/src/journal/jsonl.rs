//! JSONL file writer for run events.
//!
//! Each [`RunEvent`] becomes a single line: the payload's fields plus
//! `type`, `timestamp` and a per-journal `seq`.

use litreview_application::ports::run_journal::{RunEvent, RunJournal};
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Thread-safe via `Mutex`. Flushes after every event and on `Drop`.
pub struct JsonlRunJournal {
    state: Mutex<JournalState>,
    path: PathBuf,
}

struct JournalState {
    writer: BufWriter<File>,
    seq: u64,
}

impl JsonlRunJournal {
    /// Open `path` for appending, creating it and its parent directories.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            state: Mutex::new(JournalState {
                writer: BufWriter::new(file),
                seq: 0,
            }),
            path: path.to_path_buf(),
        })
    }

    /// A journal named after the current UTC time inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> io::Result<Self> {
        let name = format!("run-{}.jsonl", chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ"));
        Self::open(dir.as_ref().join(name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn to_record(event: RunEvent, seq: u64) -> Value {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let mut record = match event.payload {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => Map::from_iter([("data".to_string(), other)]),
        };
        record.insert("type".to_string(), Value::from(event.event_type));
        record.insert("timestamp".to_string(), Value::from(timestamp));
        record.insert("seq".to_string(), Value::from(seq));
        Value::Object(record)
    }
}

impl RunJournal for JsonlRunJournal {
    fn record(&self, event: RunEvent) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.seq += 1;
        let record = Self::to_record(event, state.seq);

        let result = serde_json::to_string(&record)
            .map_err(io::Error::from)
            .and_then(|line| writeln!(state.writer, "{}", line))
            .and_then(|_| state.writer.flush());
        if let Err(e) = result {
            warn!("Could not write run journal {}: {}", self.path.display(), e);
        }
    }
}

impl Drop for JsonlRunJournal {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            let _ = state.writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_journal_writes_one_object_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs").join("run.jsonl");
        let journal = JsonlRunJournal::open(&path).unwrap();

        journal.record(RunEvent::new(
            "task_started",
            json!({"task": "create_framework", "role": "professor"}),
        ));
        journal.record(RunEvent::new(
            "task_finished",
            json!({"task": "create_framework", "status": "succeeded"}),
        ));
        drop(journal);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "task_started");
        assert_eq!(lines[0]["role"], "professor");
        assert_eq!(lines[0]["seq"], 1);
        assert_eq!(lines[1]["status"], "succeeded");
        assert_eq!(lines[1]["seq"], 2);
        let timestamp = lines[0]["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    }

    #[test]
    fn test_non_object_payload_is_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.jsonl");
        let journal = JsonlRunJournal::open(&path).unwrap();

        journal.record(RunEvent::new("note", json!("plain text")));
        drop(journal);

        let lines = read_lines(&path);
        assert_eq!(lines[0]["type"], "note");
        assert_eq!(lines[0]["data"], "plain text");
    }

    #[test]
    fn test_reopening_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.jsonl");

        JsonlRunJournal::open(&path)
            .unwrap()
            .record(RunEvent::new("first", json!({})));
        JsonlRunJournal::open(&path)
            .unwrap()
            .record(RunEvent::new("second", json!({})));

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["type"], "second");
    }

    #[test]
    fn test_in_dir_names_file_by_time() {
        let dir = tempfile::tempdir().unwrap();
        let journal = JsonlRunJournal::in_dir(dir.path()).unwrap();
        let name = journal.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("run-"));
        assert!(name.ends_with(".jsonl"));
    }
}
