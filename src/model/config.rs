use serde::{Deserialize, Serialize};

/// Configuration from questlog.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub recurring: RecurringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Data file name, relative to the tracker directory
    #[serde(default = "default_file")]
    pub file: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            file: default_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringConfig {
    /// Canonical recurring set, restored on every daily reset
    #[serde(default = "default_recurring")]
    pub defaults: Vec<String>,
}

impl Default for RecurringConfig {
    fn default() -> Self {
        RecurringConfig {
            defaults: default_recurring(),
        }
    }
}

fn default_file() -> String {
    "tasks.json".to_string()
}

fn default_recurring() -> Vec<String> {
    [
        "Morning hygiene",
        "Appearance check",
        "Take vitamins",
        "HIIT 30 min",
        "Gym hour",
        "Empty the trash",
        "Dust the room",
        "Read email",
        "Clear the desk",
        "Laundry",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
