use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::category::Category;

/// Persisted undo stack (written to .undo.json).
///
/// The source of each entry is a `complete` operation; undo pops the most
/// recent one. Persisting the stack lets `ql undo` work across process
/// invocations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UndoState {
    #[serde(default)]
    pub stack: Vec<UndoEntry>,
}

/// What `undo` needs to reverse one completion: where the task lived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoEntry {
    pub task: String,
    pub category: Category,
    /// None for Recurring
    #[serde(default)]
    pub topic: Option<String>,
}

/// Read .undo.json from the tracker directory. Missing or unreadable
/// state degrades to an empty stack.
pub fn read_undo_state(dir: &Path) -> Option<UndoState> {
    let path = dir.join(".undo.json");
    let content = fs::read_to_string(&path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Write .undo.json to the tracker directory
pub fn write_undo_state(dir: &Path, state: &UndoState) -> Result<(), std::io::Error> {
    let path = dir.join(".undo.json");
    let content = serde_json::to_string_pretty(state)?;
    fs::write(&path, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_and_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let state = UndoState {
            stack: vec![
                UndoEntry {
                    task: "Laundry".into(),
                    category: Category::Recurring,
                    topic: None,
                },
                UndoEntry {
                    task: "Fix bike".into(),
                    category: Category::Adhoc,
                    topic: Some("errands".into()),
                },
            ],
        };

        write_undo_state(dir.path(), &state).unwrap();
        let loaded = read_undo_state(dir.path()).unwrap();

        assert_eq!(loaded.stack, state.stack);
    }

    #[test]
    fn read_missing_file_returns_none() {
        let dir = TempDir::new().unwrap();
        assert!(read_undo_state(dir.path()).is_none());
    }
}
