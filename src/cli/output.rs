use serde::Serialize;

use crate::model::category::Category;
use crate::model::document::{Completion, Document};
use crate::ops::merge::MergeStats;
use crate::ops::streak::WeeklyReview;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ListJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurring: Option<Vec<RecurringTaskJson>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adhoc: Option<Vec<TopicJson>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_quest: Option<Vec<TopicJson>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side_quest: Option<Vec<TopicJson>>,
}

#[derive(Serialize)]
pub struct RecurringTaskJson {
    pub name: String,
    /// "(n)" consecutive-miss suffix; empty when on track
    #[serde(skip_serializing_if = "String::is_empty")]
    pub streak: String,
}

#[derive(Serialize)]
pub struct TopicJson {
    pub topic: String,
    pub tasks: Vec<TopicTaskJson>,
}

#[derive(Serialize)]
pub struct TopicTaskJson {
    pub name: String,
    pub created: String,
}

#[derive(Serialize)]
pub struct CompletionJson {
    pub task: String,
    pub category: Category,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub topic: String,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct MergeStatsJson {
    pub recurring_added: usize,
    pub tasks_added: usize,
    pub topics_added: usize,
    pub completions_added: usize,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn topics_to_json(doc: &Document, category: Category) -> Vec<TopicJson> {
    doc.tasks
        .topics(category)
        .map(|topics| {
            topics
                .iter()
                .map(|(topic, records)| TopicJson {
                    topic: topic.clone(),
                    tasks: records
                        .iter()
                        .map(|r| TopicTaskJson {
                            name: r.task.clone(),
                            created: r.created.to_string(),
                        })
                        .collect(),
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn completion_to_json(c: &Completion) -> CompletionJson {
    CompletionJson {
        task: c.task.clone(),
        category: c.category,
        topic: c.topic.clone(),
        timestamp: c
            .timestamp
            .format(crate::model::document::timestamp_format::FORMAT)
            .to_string(),
    }
}

pub fn merge_stats_to_json(stats: &MergeStats) -> MergeStatsJson {
    MergeStatsJson {
        recurring_added: stats.recurring_added,
        tasks_added: stats.tasks_added,
        topics_added: stats.topics_added,
        completions_added: stats.completions_added,
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Display label for a category header
pub fn category_label(category: Category) -> &'static str {
    match category {
        Category::Recurring => "Recurring",
        Category::Adhoc => "Ad-hoc",
        Category::MainQuest => "Main quests",
        Category::SideQuest => "Side quests",
    }
}

/// Format a category section header
pub fn format_category_header(category: Category) -> String {
    format!("== {} ==", category_label(category))
}

/// Format one recurring task line, streak suffix attached
pub fn format_recurring_line(name: &str, streak: &str) -> String {
    if streak.is_empty() {
        format!("  {}", name)
    } else {
        format!("  {} {}", name, streak)
    }
}

/// Format one topic with its tasks on a single line
pub fn format_topic_line(topic: &str, tasks: &[String]) -> String {
    format!("  {}: {}", topic, tasks.join(", "))
}

/// Format a completion log entry
pub fn format_completion_line(c: &Completion) -> String {
    let place = if c.topic.is_empty() {
        category_label(c.category).to_string()
    } else {
        format!("{} - {}", category_label(c.category), c.topic)
    };
    format!(
        "  {} [{}] at {}",
        c.task,
        place,
        c.timestamp
            .format(crate::model::document::timestamp_format::FORMAT)
    )
}

/// Format the weekly review as report lines
pub fn format_review(review: &WeeklyReview) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("== Recurring: missed days this week ==".to_string());
    if review.missed.is_empty() {
        lines.push("  (nothing missed)".to_string());
    }
    for m in &review.missed {
        lines.push(format!("  {}: missed {} of 7", m.task, m.days_missed));
    }

    lines.push(String::new());
    lines.push("== Ad-hoc: open for over a week ==".to_string());
    if review.stale.is_empty() {
        lines.push("  (none)".to_string());
    }
    for s in &review.stale {
        lines.push(format_topic_line(&s.topic, &s.tasks));
    }

    lines
}

/// Format the merge report
pub fn format_merge_stats(stats: &MergeStats) -> String {
    if stats.is_empty() {
        return "nothing new to merge".to_string();
    }
    format!(
        "merged: {} recurring, {} tasks ({} new topics), {} completions",
        stats.recurring_added, stats.tasks_added, stats.topics_added, stats.completions_added
    )
}
