use serde::{Deserialize, Serialize};
use std::fmt;

/// Task category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Recurring,
    Adhoc,
    MainQuest,
    SideQuest,
}

impl Category {
    /// All categories, in display order
    pub const ALL: [Category; 4] = [
        Category::Recurring,
        Category::Adhoc,
        Category::MainQuest,
        Category::SideQuest,
    ];

    /// Categories whose tasks are grouped under topics
    pub const TOPICAL: [Category; 3] = [Category::Adhoc, Category::MainQuest, Category::SideQuest];

    /// The key used for this category in the persisted file
    pub fn key(self) -> &'static str {
        match self {
            Category::Recurring => "recurring",
            Category::Adhoc => "adhoc",
            Category::MainQuest => "main_quest",
            Category::SideQuest => "side_quest",
        }
    }

    /// Recurring is a flat list; everything else is topic-keyed
    pub fn is_topical(self) -> bool {
        !matches!(self, Category::Recurring)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Parse a category name into a Category. Accepts the file keys plus the
/// short aliases used on the command line.
pub fn parse_category(s: &str) -> Result<Category, String> {
    match s {
        "recurring" => Ok(Category::Recurring),
        "adhoc" => Ok(Category::Adhoc),
        "main_quest" | "main" => Ok(Category::MainQuest),
        "side_quest" | "side" => Ok(Category::SideQuest),
        _ => Err(format!(
            "unknown category '{}' (expected: recurring, adhoc, main, side)",
            s
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip_through_parse() {
        for cat in Category::ALL {
            assert_eq!(parse_category(cat.key()), Ok(cat));
        }
    }

    #[test]
    fn short_aliases() {
        assert_eq!(parse_category("main"), Ok(Category::MainQuest));
        assert_eq!(parse_category("side"), Ok(Category::SideQuest));
        assert!(parse_category("bogus").is_err());
    }

    #[test]
    fn serde_uses_snake_case_keys() {
        let json = serde_json::to_string(&Category::MainQuest).unwrap();
        assert_eq!(json, "\"main_quest\"");
        let back: Category = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Category::MainQuest);
    }
}
