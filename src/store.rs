use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

use chrono::{NaiveDate, NaiveDateTime};

use crate::io::config_io::{self, ConfigError};
use crate::io::store_io::{self, StoreIoError};
use crate::io::undo_state::{self, UndoEntry, UndoState};
use crate::model::category::Category;
use crate::model::config::TrackerConfig;
use crate::model::document::{Completion, DEFAULT_TOPIC, Document, TaskRecord};
use crate::ops::merge::{self, ImportError, MergeStats};
use crate::ops::reset;
use crate::ops::streak::{self, WeeklyReview};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] StoreIoError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Import(#[from] ImportError),
}

/// What just changed. Sent to every subscriber after a successful
/// write-through; the receiving side re-renders on receipt instead of
/// being called back imperatively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    TaskAdded,
    TaskCompleted,
    TaskDeleted,
    TopicDeleted,
    Undone,
    Merged,
}

/// The task store: owns the document for the life of the process.
///
/// Every mutating operation is write-through — mutate in memory, save
/// synchronously, notify subscribers. If the save fails the in-memory
/// mutation is rolled back, so the store never holds state the file
/// doesn't.
pub struct Store {
    dir: PathBuf,
    data_path: PathBuf,
    config: TrackerConfig,
    doc: Document,
    undo_stack: Vec<UndoEntry>,
    subscribers: Vec<Sender<ChangeEvent>>,
}

impl Store {
    /// Open the store rooted at `dir`: read the config, load the task file
    /// (or default-construct it), apply the daily reset, and persist the
    /// result. Loading always saves — legacy-shape migration and the reset
    /// both happen here, and the file on disk reflects them immediately.
    pub fn open(dir: &Path, now: NaiveDateTime) -> Result<Store, StoreError> {
        let config = config_io::read_config(dir)?;
        let data_path = dir.join(&config.store.file);
        let effective = reset::effective_date(now);

        let mut doc = match store_io::load_document(&data_path, effective)? {
            Some(doc) => doc,
            None => Document::new_with_defaults(&config.recurring.defaults),
        };
        let fresh_day = reset::apply_reset_if_needed(&mut doc, &config.recurring.defaults, now);
        store_io::save_document(&data_path, &doc)?;

        // A reset cleared the completion log, so entries recorded before it
        // have nothing left to reverse.
        let undo_stack = if fresh_day {
            Vec::new()
        } else {
            undo_state::read_undo_state(dir).unwrap_or_default().stack
        };

        let store = Store {
            dir: dir.to_path_buf(),
            data_path,
            config,
            doc,
            undo_stack,
            subscribers: Vec::new(),
        };
        if fresh_day {
            store.persist_undo_stack();
        }
        Ok(store)
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Register a change listener. Events are delivered after each
    /// successful mutation; dropped receivers are pruned on the next send.
    pub fn subscribe(&mut self) -> Receiver<ChangeEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn notify(&mut self, event: ChangeEvent) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }

    /// Write-through commit: persist the document, or roll back to
    /// `before` and surface the error. The recovery log capture happens
    /// inside the save path.
    fn commit(&mut self, before: Document, event: ChangeEvent) -> Result<(), StoreError> {
        match store_io::save_document(&self.data_path, &self.doc) {
            Ok(()) => {
                self.notify(event);
                Ok(())
            }
            Err(e) => {
                self.doc = before;
                Err(e.into())
            }
        }
    }

    /// Best-effort sidecar write; a lost undo stack is an annoyance, not
    /// data loss.
    fn persist_undo_stack(&self) {
        let state = UndoState {
            stack: self.undo_stack.clone(),
        };
        if let Err(e) = undo_state::write_undo_state(&self.dir, &state) {
            eprintln!("warning: could not write undo state: {}", e);
        }
    }

    /// Add a task. Recurring tasks are bare names; topical tasks get a
    /// creation date and land under `topic` (default "Uncategorized"),
    /// creating the topic if needed.
    pub fn add_task(
        &mut self,
        category: Category,
        topic: Option<&str>,
        name: &str,
        now: NaiveDateTime,
    ) -> Result<(), StoreError> {
        let before = self.doc.clone();
        match self.doc.tasks.topics_mut(category) {
            None => self.doc.tasks.recurring.push(name.to_string()),
            Some(topics) => {
                let topic = topic.filter(|t| !t.is_empty()).unwrap_or(DEFAULT_TOPIC);
                topics
                    .entry(topic.to_string())
                    .or_default()
                    .push(TaskRecord::new(name, now.date()));
            }
        }
        self.commit(before, ChangeEvent::TaskAdded)
    }

    /// Complete a task: remove every entry matching the name from its
    /// list, append a completion record, push an undo entry. Completing a
    /// name that isn't there is a no-op.
    pub fn complete_task(
        &mut self,
        category: Category,
        topic: Option<&str>,
        name: &str,
        now: NaiveDateTime,
    ) -> Result<(), StoreError> {
        // Resolve the topic fallback here so the completion record and the
        // undo entry name the topic the task was actually removed from.
        let topic = if category.is_topical() {
            Some(topic.filter(|t| !t.is_empty()).unwrap_or(DEFAULT_TOPIC))
        } else {
            None
        };
        let before = self.doc.clone();
        if !remove_by_name(&mut self.doc, category, topic, name) {
            return Ok(());
        }
        self.doc.completed.push(Completion {
            task: name.to_string(),
            category,
            topic: topic.unwrap_or_default().to_string(),
            timestamp: now,
        });
        self.undo_stack.push(UndoEntry {
            task: name.to_string(),
            category,
            topic: topic.map(|t| t.to_string()),
        });
        let result = self.commit(before, ChangeEvent::TaskCompleted);
        if result.is_err() {
            self.undo_stack.pop();
        } else {
            self.persist_undo_stack();
        }
        result
    }

    /// Remove a task without recording a completion. Touches neither the
    /// completion log nor the undo stack. No-op if the name isn't there.
    pub fn delete_task(
        &mut self,
        category: Category,
        topic: Option<&str>,
        name: &str,
    ) -> Result<(), StoreError> {
        let before = self.doc.clone();
        if !remove_by_name(&mut self.doc, category, topic, name) {
            return Ok(());
        }
        self.commit(before, ChangeEvent::TaskDeleted)
    }

    /// Reverse the most recent completion: re-append the task at the end
    /// of its list (original position is lost) and drop every completion
    /// record matching the task name — across all categories and topics,
    /// not just the one being undone. That breadth is inherited behavior;
    /// see DESIGN.md. No-op on an empty stack.
    pub fn undo_last(&mut self, now: NaiveDateTime) -> Result<(), StoreError> {
        let Some(entry) = self.undo_stack.pop() else {
            return Ok(());
        };
        let before = self.doc.clone();
        match self.doc.tasks.topics_mut(entry.category) {
            None => self.doc.tasks.recurring.push(entry.task.clone()),
            Some(topics) => {
                // The source re-appends a bare name and lets the next
                // load's migration stamp it; stamping directly produces
                // the same document without the transient legacy shape.
                let topic = entry.topic.clone().unwrap_or_else(|| DEFAULT_TOPIC.into());
                topics
                    .entry(topic)
                    .or_default()
                    .push(TaskRecord::new(entry.task.as_str(), reset::effective_date(now)));
            }
        }
        self.doc.completed.retain(|c| c.task != entry.task);
        let result = self.commit(before, ChangeEvent::Undone);
        if result.is_err() {
            self.undo_stack.push(entry);
        } else {
            self.persist_undo_stack();
        }
        result
    }

    /// Remove a topic and everything in it. No-op if the topic doesn't
    /// exist (or the category has no topics).
    pub fn delete_topic(&mut self, category: Category, topic: &str) -> Result<(), StoreError> {
        let before = self.doc.clone();
        let removed = self
            .doc
            .tasks
            .topics_mut(category)
            .is_some_and(|topics| topics.shift_remove(topic).is_some());
        if !removed {
            return Ok(());
        }
        self.commit(before, ChangeEvent::TopicDeleted)
    }

    /// Merge an exported file into this store. Parse failures abort before
    /// any local mutation; a failed save rolls back, so the merge is
    /// all-or-nothing.
    pub fn merge_import(
        &mut self,
        path: &Path,
        now: NaiveDateTime,
    ) -> Result<MergeStats, StoreError> {
        let imported = merge::read_import(path, reset::effective_date(now))?;
        let before = self.doc.clone();
        let stats = merge::merge_document(&mut self.doc, imported);
        self.commit(before, ChangeEvent::Merged)?;
        Ok(stats)
    }

    /// Verbatim dump of the current document to a user-chosen path.
    pub fn export_snapshot(&self, path: &Path) -> Result<(), StoreError> {
        store_io::write_snapshot(path, &self.doc)?;
        Ok(())
    }

    /// "(n)" consecutive-miss suffix for a recurring task; empty when the
    /// task is on track.
    pub fn streak_annotation(&self, name: &str, today: NaiveDate) -> String {
        streak::streak_annotation(&self.doc, name, today)
    }

    /// Trailing-week report: missed recurring days and stale adhoc tasks.
    pub fn weekly_review(&self, today: NaiveDate) -> WeeklyReview {
        streak::weekly_review(&self.doc, &self.config.recurring.defaults, today)
    }

    /// Locate a task by name: Recurring first, then topical categories in
    /// display order. Returns the category and (for topical hits) the topic.
    pub fn find_task(&self, name: &str) -> Option<(Category, Option<String>)> {
        if self.doc.tasks.recurring.iter().any(|t| t == name) {
            return Some((Category::Recurring, None));
        }
        for cat in Category::TOPICAL {
            if let Some(topics) = self.doc.tasks.topics(cat) {
                for (topic, records) in topics {
                    if records.iter().any(|r| r.task == name) {
                        return Some((cat, Some(topic.clone())));
                    }
                }
            }
        }
        None
    }
}

/// Remove every entry matching `name` from its list. Returns whether
/// anything was removed. For topical categories a missing/empty topic
/// falls back to "Uncategorized", mirroring add.
fn remove_by_name(doc: &mut Document, category: Category, topic: Option<&str>, name: &str) -> bool {
    match doc.tasks.topics_mut(category) {
        None => {
            let len = doc.tasks.recurring.len();
            doc.tasks.recurring.retain(|t| t != name);
            doc.tasks.recurring.len() != len
        }
        Some(topics) => {
            let topic = topic.filter(|t| !t.is_empty()).unwrap_or(DEFAULT_TOPIC);
            match topics.get_mut(topic) {
                Some(records) => {
                    let len = records.len();
                    records.retain(|r| r.task != name);
                    records.len() != len
                }
                None => false,
            }
        }
    }
}
