use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};
use crate::model::document::{Completion, DEFAULT_TOPIC, Document, TaskRecord, TaskSets, TopicMap};

/// Error type for task-file I/O
#[derive(Debug, thiserror::Error)]
pub enum StoreIoError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed task file {path}: {source}")]
    Format {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Raw decode layer
// ---------------------------------------------------------------------------
//
// Historical files stored topical entries as bare name strings, and older
// exports stored a whole topical category as a flat list. Both shapes are
// decoded here as untagged unions and resolved to the current model before
// anything else sees them. The same layer backs defensive import reads,
// where every key may be missing.

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawDocument {
    #[serde(default)]
    tasks: RawTasks,
    #[serde(default)]
    completed: Vec<Completion>,
    #[serde(default)]
    last_reset: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawTasks {
    #[serde(default)]
    recurring: Vec<String>,
    #[serde(default)]
    adhoc: RawTopics,
    #[serde(default)]
    main_quest: RawTopics,
    #[serde(default)]
    side_quest: RawTopics,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTopics {
    Keyed(IndexMap<String, Vec<RawEntry>>),
    /// Pre-topic export shape: a whole category as one flat list
    Flat(Vec<RawEntry>),
}

impl Default for RawTopics {
    fn default() -> Self {
        RawTopics::Keyed(IndexMap::new())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Record(TaskRecord),
    /// Legacy shape: bare task name, upgraded with `created = fallback`
    Name(String),
}

impl RawEntry {
    fn into_record(self, created_fallback: NaiveDate) -> TaskRecord {
        match self {
            RawEntry::Record(r) => r,
            RawEntry::Name(name) => TaskRecord::new(name, created_fallback),
        }
    }
}

impl RawTopics {
    fn normalize(self, created_fallback: NaiveDate) -> TopicMap {
        match self {
            RawTopics::Keyed(map) => map
                .into_iter()
                .map(|(topic, entries)| {
                    let records = entries
                        .into_iter()
                        .map(|e| e.into_record(created_fallback))
                        .collect();
                    (topic, records)
                })
                .collect(),
            RawTopics::Flat(entries) => {
                let mut map = TopicMap::new();
                if !entries.is_empty() {
                    map.insert(
                        DEFAULT_TOPIC.to_string(),
                        entries
                            .into_iter()
                            .map(|e| e.into_record(created_fallback))
                            .collect(),
                    );
                }
                map
            }
        }
    }
}

impl RawDocument {
    pub(crate) fn normalize(self, created_fallback: NaiveDate) -> Document {
        Document {
            tasks: TaskSets {
                recurring: self.tasks.recurring,
                adhoc: self.tasks.adhoc.normalize(created_fallback),
                main_quest: self.tasks.main_quest.normalize(created_fallback),
                side_quest: self.tasks.side_quest.normalize(created_fallback),
            },
            completed: self.completed,
            last_reset: self.last_reset,
        }
    }
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Load the task file. Returns `Ok(None)` when the file does not exist;
/// the caller default-constructs. A present-but-malformed file is an error.
/// `created_fallback` stamps legacy bare-name entries.
pub fn load_document(
    path: &Path,
    created_fallback: NaiveDate,
) -> Result<Option<Document>, StoreIoError> {
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path).map_err(|e| StoreIoError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let raw: RawDocument = serde_json::from_str(&text).map_err(|e| StoreIoError::Format {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(Some(raw.normalize(created_fallback)))
}

/// Save the task file atomically. On failure the serialized document is
/// captured in the recovery log before the error is surfaced.
pub fn save_document(path: &Path, doc: &Document) -> Result<(), StoreIoError> {
    let content = to_pretty_json(path, doc)?;
    if let Err(e) = recovery::atomic_write(path, content.as_bytes()) {
        let dir = path.parent().unwrap_or(Path::new("."));
        recovery::log_recovery(
            dir,
            RecoveryEntry {
                timestamp: chrono::Utc::now(),
                category: RecoveryCategory::Write,
                description: "task file write failed".to_string(),
                fields: vec![
                    ("Target".to_string(), path.display().to_string()),
                    ("Error".to_string(), e.to_string()),
                ],
                body: content,
            },
        );
        return Err(StoreIoError::Write {
            path: path.to_path_buf(),
            source: e,
        });
    }
    Ok(())
}

/// Verbatim export of the document to a user-chosen path.
pub fn write_snapshot(path: &Path, doc: &Document) -> Result<(), StoreIoError> {
    let content = to_pretty_json(path, doc)?;
    fs::write(path, content).map_err(|e| StoreIoError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

fn to_pretty_json(path: &Path, doc: &Document) -> Result<String, StoreIoError> {
    serde_json::to_string_pretty(doc).map_err(|e| StoreIoError::Format {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::category::Category;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn missing_file_is_none() {
        let tmp = TempDir::new().unwrap();
        let loaded = load_document(&tmp.path().join("tasks.json"), day("2026-08-24")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn malformed_file_is_a_format_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tasks.json");
        fs::write(&path, "{ not json").unwrap();
        match load_document(&path, day("2026-08-24")) {
            Err(StoreIoError::Format { .. }) => {}
            other => panic!("expected Format error, got {:?}", other),
        }
    }

    #[test]
    fn save_and_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tasks.json");

        let mut doc = Document::new_with_defaults(&["Laundry".to_string()]);
        doc.tasks.main_quest.insert(
            "thesis".into(),
            vec![TaskRecord::new("Draft chapter 2", day("2026-08-20"))],
        );
        doc.completed.push(Completion {
            task: "Laundry".into(),
            category: Category::Recurring,
            topic: String::new(),
            timestamp: "2026-08-24T09:15:00".parse().unwrap(),
        });
        doc.last_reset = "2026-08-24".into();

        save_document(&path, &doc).unwrap();
        let loaded = load_document(&path, day("2026-08-24")).unwrap().unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn legacy_bare_names_upgrade_to_dated_records() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tasks.json");
        fs::write(
            &path,
            r#"{
  "tasks": {
    "recurring": ["Laundry"],
    "adhoc": {
      "errands": ["Fix bike", {"task": "Buy tape", "created": "2026-08-01"}]
    }
  }
}"#,
        )
        .unwrap();

        let doc = load_document(&path, day("2026-08-24")).unwrap().unwrap();
        let errands = &doc.tasks.adhoc["errands"];
        assert_eq!(
            errands,
            &vec![
                TaskRecord::new("Fix bike", day("2026-08-24")),
                TaskRecord::new("Buy tape", day("2026-08-01")),
            ]
        );
        assert_eq!(doc.last_reset, "");
        assert!(doc.completed.is_empty());
    }

    #[test]
    fn flat_category_folds_into_default_topic() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tasks.json");
        fs::write(
            &path,
            r#"{"tasks": {"side_quest": ["Learn juggling"]}}"#,
        )
        .unwrap();

        let doc = load_document(&path, day("2026-08-24")).unwrap().unwrap();
        assert_eq!(
            doc.tasks.side_quest[DEFAULT_TOPIC],
            vec![TaskRecord::new("Learn juggling", day("2026-08-24"))]
        );
    }

    #[test]
    fn topic_order_survives_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tasks.json");

        let mut doc = Document::default();
        for topic in ["zeta", "alpha", "mid"] {
            doc.tasks
                .adhoc
                .insert(topic.into(), vec![TaskRecord::new("t", day("2026-08-20"))]);
        }
        save_document(&path, &doc).unwrap();
        let loaded = load_document(&path, day("2026-08-24")).unwrap().unwrap();
        let topics: Vec<_> = loaded.tasks.adhoc.keys().cloned().collect();
        assert_eq!(topics, vec!["zeta", "alpha", "mid"]);
    }
}
