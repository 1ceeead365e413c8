use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};

use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};
use crate::io::store_io::RawDocument;
use crate::model::document::Document;

/// Error type for import operations
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed import file {path}: {source}")]
    Format {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// What a merge added. The merge never deletes local data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub recurring_added: usize,
    pub tasks_added: usize,
    pub topics_added: usize,
    pub completions_added: usize,
}

impl MergeStats {
    pub fn is_empty(&self) -> bool {
        *self == MergeStats::default()
    }
}

/// Read a document-shaped file defensively: missing keys default to empty,
/// bare task names and flat topic lists are normalized, anything else is an
/// error that aborts the merge before local state is touched. Unreadable
/// imports leave a note in the recovery log.
pub fn read_import(path: &Path, created_fallback: NaiveDate) -> Result<Document, ImportError> {
    let text = fs::read_to_string(path).map_err(|e| ImportError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let raw: RawDocument = match serde_json::from_str(&text) {
        Ok(raw) => raw,
        Err(e) => {
            let dir = path.parent().unwrap_or(Path::new("."));
            recovery::log_recovery(
                dir,
                RecoveryEntry {
                    timestamp: chrono::Utc::now(),
                    category: RecoveryCategory::Import,
                    description: "import file rejected".to_string(),
                    fields: vec![
                        ("Source".to_string(), path.display().to_string()),
                        ("Error".to_string(), e.to_string()),
                    ],
                    body: String::new(),
                },
            );
            return Err(ImportError::Format {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    Ok(raw.normalize(created_fallback))
}

/// Merge an imported document into the local one. Strictly additive:
///
/// - recurring: list union by exact name, local order first;
/// - topics: existing topics union their task lists, deduping by full
///   `{task, created}` equality; new topics are taken wholesale;
/// - completions: appended unless the same `(task, timestamp)` pair is
///   already in the local log.
pub fn merge_document(local: &mut Document, imported: Document) -> MergeStats {
    let mut stats = MergeStats::default();
    let imported_tasks = imported.tasks;

    for name in imported_tasks.recurring {
        if !local.tasks.recurring.contains(&name) {
            local.tasks.recurring.push(name);
            stats.recurring_added += 1;
        }
    }

    let pairs = [
        (imported_tasks.adhoc, &mut local.tasks.adhoc),
        (imported_tasks.main_quest, &mut local.tasks.main_quest),
        (imported_tasks.side_quest, &mut local.tasks.side_quest),
    ];
    for (incoming, target) in pairs {
        for (topic, records) in incoming {
            match target.get_mut(&topic) {
                Some(existing) => {
                    for record in records {
                        if !existing.contains(&record) {
                            existing.push(record);
                            stats.tasks_added += 1;
                        }
                    }
                }
                None => {
                    stats.tasks_added += records.len();
                    stats.topics_added += 1;
                    target.insert(topic, records);
                }
            }
        }
    }

    // Dedupe against the local log only: distinct timestamps are distinct
    // completion events and both survive.
    let existing: HashSet<(String, NaiveDateTime)> = local
        .completed
        .iter()
        .map(|c| (c.task.clone(), c.timestamp))
        .collect();
    for completion in imported.completed {
        if !existing.contains(&(completion.task.clone(), completion.timestamp)) {
            local.completed.push(completion);
            stats.completions_added += 1;
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::category::Category;
    use crate::model::document::{Completion, DEFAULT_TOPIC, TaskRecord};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn completion(task: &str, ts: &str) -> Completion {
        Completion {
            task: task.into(),
            category: Category::Recurring,
            topic: String::new(),
            timestamp: ts.parse().unwrap(),
        }
    }

    #[test]
    fn recurring_union_preserves_local_order() {
        let mut local = Document::default();
        local.tasks.recurring = vec!["A".into(), "B".into()];
        let mut imported = Document::default();
        imported.tasks.recurring = vec!["B".into(), "C".into()];

        let stats = merge_document(&mut local, imported);
        assert_eq!(local.tasks.recurring, vec!["A", "B", "C"]);
        assert_eq!(stats.recurring_added, 1);
    }

    #[test]
    fn existing_topic_unions_new_topic_is_wholesale() {
        let mut local = Document::default();
        local.tasks.adhoc.insert(
            "errands".into(),
            vec![TaskRecord::new("Fix bike", day("2026-08-20"))],
        );

        let mut imported = Document::default();
        imported.tasks.adhoc.insert(
            "errands".into(),
            vec![
                TaskRecord::new("Fix bike", day("2026-08-20")), // identical — dropped
                TaskRecord::new("Buy tape", day("2026-08-21")), // new — kept
            ],
        );
        imported.tasks.adhoc.insert(
            "garden".into(),
            vec![TaskRecord::new("Weed beds", day("2026-08-22"))],
        );

        let stats = merge_document(&mut local, imported);
        assert_eq!(
            local.tasks.adhoc["errands"],
            vec![
                TaskRecord::new("Fix bike", day("2026-08-20")),
                TaskRecord::new("Buy tape", day("2026-08-21")),
            ]
        );
        assert_eq!(
            local.tasks.adhoc["garden"],
            vec![TaskRecord::new("Weed beds", day("2026-08-22"))]
        );
        assert_eq!(stats.tasks_added, 2);
        assert_eq!(stats.topics_added, 1);
    }

    #[test]
    fn same_name_different_created_are_both_kept() {
        let mut local = Document::default();
        local.tasks.main_quest.insert(
            "thesis".into(),
            vec![TaskRecord::new("Draft", day("2026-08-01"))],
        );
        let mut imported = Document::default();
        imported.tasks.main_quest.insert(
            "thesis".into(),
            vec![TaskRecord::new("Draft", day("2026-08-15"))],
        );

        merge_document(&mut local, imported);
        assert_eq!(local.tasks.main_quest["thesis"].len(), 2);
    }

    #[test]
    fn completions_dedupe_on_task_and_timestamp() {
        let mut local = Document::default();
        local.completed.push(completion("Laundry", "2026-08-24T09:00:00"));

        let mut imported = Document::default();
        imported.completed.push(completion("Laundry", "2026-08-24T09:00:00")); // dup
        imported.completed.push(completion("Laundry", "2026-08-24T21:00:00")); // distinct event

        let stats = merge_document(&mut local, imported);
        assert_eq!(local.completed.len(), 2);
        assert_eq!(stats.completions_added, 1);
    }

    #[test]
    fn merge_never_deletes_local_data() {
        let mut local = Document::default();
        local.tasks.recurring = vec!["A".into()];
        local
            .tasks
            .side_quest
            .insert("music".into(), vec![TaskRecord::new("Practice", day("2026-08-10"))]);
        local.completed.push(completion("A", "2026-08-24T08:00:00"));
        let before = local.clone();

        let stats = merge_document(&mut local, Document::default());
        assert_eq!(local, before);
        assert!(stats.is_empty());
    }

    #[test]
    fn read_import_defaults_missing_keys_and_folds_flat_lists() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("export.json");
        fs::write(
            &path,
            r#"{"tasks": {"adhoc": ["Fix bike"]}}"#,
        )
        .unwrap();

        let doc = read_import(&path, day("2026-08-24")).unwrap();
        assert_eq!(
            doc.tasks.adhoc[DEFAULT_TOPIC],
            vec![TaskRecord::new("Fix bike", day("2026-08-24"))]
        );
        assert!(doc.completed.is_empty());
        assert!(doc.tasks.recurring.is_empty());
    }

    #[test]
    fn malformed_import_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("export.json");
        fs::write(&path, "[1, 2, 3").unwrap();
        assert!(matches!(
            read_import(&path, day("2026-08-24")),
            Err(ImportError::Format { .. })
        ));
    }
}
