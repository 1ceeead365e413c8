use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::category::Category;

/// Topic name used when a task is added without one
pub const DEFAULT_TOPIC: &str = "Uncategorized";

/// Topic name → ordered task list. Insertion order is display order.
pub type TopicMap = IndexMap<String, Vec<TaskRecord>>;

/// A dated task entry within a topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Task name (identity within its topic; uniqueness is by convention)
    pub task: String,
    /// Date the task was added
    pub created: NaiveDate,
}

impl TaskRecord {
    pub fn new(task: impl Into<String>, created: NaiveDate) -> Self {
        TaskRecord {
            task: task.into(),
            created,
        }
    }
}

/// One entry in the append-only completion log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub task: String,
    pub category: Category,
    /// Empty for Recurring completions
    #[serde(default)]
    pub topic: String,
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
}

/// The four task collections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSets {
    /// Flat list of recurring task names, restored to the canonical set
    /// every effective day
    #[serde(default)]
    pub recurring: Vec<String>,
    #[serde(default)]
    pub adhoc: TopicMap,
    #[serde(default)]
    pub main_quest: TopicMap,
    #[serde(default)]
    pub side_quest: TopicMap,
}

impl TaskSets {
    /// Topic map for a topical category; None for Recurring
    pub fn topics(&self, category: Category) -> Option<&TopicMap> {
        match category {
            Category::Recurring => None,
            Category::Adhoc => Some(&self.adhoc),
            Category::MainQuest => Some(&self.main_quest),
            Category::SideQuest => Some(&self.side_quest),
        }
    }

    pub fn topics_mut(&mut self, category: Category) -> Option<&mut TopicMap> {
        match category {
            Category::Recurring => None,
            Category::Adhoc => Some(&mut self.adhoc),
            Category::MainQuest => Some(&mut self.main_quest),
            Category::SideQuest => Some(&mut self.side_quest),
        }
    }
}

/// The root aggregate persisted as one JSON file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub tasks: TaskSets,
    #[serde(default)]
    pub completed: Vec<Completion>,
    /// Effective date (as `YYYY-MM-DD`) of the last applied daily reset;
    /// empty until the first reset
    #[serde(default)]
    pub last_reset: String,
}

impl Document {
    /// Fresh document: recurring = the given canonical set, everything
    /// else empty. `last_reset` stays empty so the first load resets.
    pub fn new_with_defaults(recurring: &[String]) -> Document {
        Document {
            tasks: TaskSets {
                recurring: recurring.to_vec(),
                ..TaskSets::default()
            },
            ..Document::default()
        }
    }
}

/// Serde adapter for the `YYYY-MM-DD HH:MM:SS` timestamp format the
/// completion log has always used.
pub mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(dt: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&dt.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}
