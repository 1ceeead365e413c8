use std::collections::HashSet;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::model::category::Category;
use crate::model::document::Document;

/// Longest consecutive-miss run the annotation reports
const STREAK_SCAN_LIMIT: u64 = 99;

/// How many trailing days the weekly review covers (today inclusive)
const REVIEW_WINDOW_DAYS: u64 = 7;

/// "(n)" suffix for a recurring task: n consecutive missed days, counted
/// back from yesterday up to the first completed day.
///
/// The logic is deliberately asymmetric:
/// - completed today → no annotation
/// - never completed → no annotation (new tasks get an observation period)
/// - completed yesterday → no annotation (one grace day)
/// - otherwise the miss run starts at yesterday, so the first visible
///   value is "(1)" on the second consecutive miss.
pub fn streak_annotation(doc: &Document, task: &str, today: NaiveDate) -> String {
    let completed_dates: HashSet<NaiveDate> = doc
        .completed
        .iter()
        .filter(|c| c.task == task && c.category == Category::Recurring)
        .map(|c| c.timestamp.date())
        .collect();

    if completed_dates.contains(&today) {
        return String::new();
    }
    if completed_dates.is_empty() {
        return String::new();
    }
    let yesterday = today - Days::new(1);
    if completed_dates.contains(&yesterday) {
        return String::new();
    }

    let mut streak = 1;
    for i in 2..=STREAK_SCAN_LIMIT {
        let d = today - Days::new(i);
        if completed_dates.contains(&d) {
            break;
        }
        streak += 1;
    }
    format!("({})", streak)
}

/// Read-only report over the trailing week
#[derive(Debug, Clone, Serialize)]
pub struct WeeklyReview {
    /// Canonical recurring tasks with at least one missed day this week
    pub missed: Vec<MissedRecurring>,
    /// Adhoc topics holding tasks created a week or more ago, still open
    pub stale: Vec<StaleTopic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissedRecurring {
    pub task: String,
    pub days_missed: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaleTopic {
    pub topic: String,
    pub tasks: Vec<String>,
}

/// Per canonical recurring task, how many of the last seven days (today
/// inclusive) have no completion; plus open adhoc tasks created at least
/// a week ago. Pure read, no mutation.
pub fn weekly_review(doc: &Document, defaults: &[String], today: NaiveDate) -> WeeklyReview {
    let mut missed = Vec::new();
    for task in defaults {
        let mut days_missed = 0;
        for i in 0..REVIEW_WINDOW_DAYS {
            let check = today - Days::new(i);
            let found = doc.completed.iter().any(|c| {
                c.task == *task && c.category == Category::Recurring && c.timestamp.date() == check
            });
            if !found {
                days_missed += 1;
            }
        }
        if days_missed > 0 {
            missed.push(MissedRecurring {
                task: task.clone(),
                days_missed,
            });
        }
    }

    let week_ago = today - Days::new(REVIEW_WINDOW_DAYS);
    let mut stale = Vec::new();
    for (topic, records) in &doc.tasks.adhoc {
        let old: Vec<String> = records
            .iter()
            .filter(|r| r.created <= week_ago)
            .map(|r| r.task.clone())
            .collect();
        if !old.is_empty() {
            stale.push(StaleTopic {
                topic: topic.clone(),
                tasks: old,
            });
        }
    }

    WeeklyReview { missed, stale }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::document::{Completion, TaskRecord};
    use chrono::NaiveDateTime;

    const TODAY: &str = "2026-08-24";

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn noon(date: NaiveDate) -> NaiveDateTime {
        date.and_hms_opt(12, 0, 0).unwrap()
    }

    fn doc_with_recurring_completions(days_ago: &[u64]) -> Document {
        let today = day(TODAY);
        let mut doc = Document::default();
        for &n in days_ago {
            doc.completed.push(Completion {
                task: "Laundry".into(),
                category: Category::Recurring,
                topic: String::new(),
                timestamp: noon(today - Days::new(n)),
            });
        }
        doc
    }

    #[test]
    fn completed_today_has_no_annotation() {
        let doc = doc_with_recurring_completions(&[0, 3]);
        assert_eq!(streak_annotation(&doc, "Laundry", day(TODAY)), "");
    }

    #[test]
    fn never_completed_has_no_annotation() {
        let doc = Document::default();
        assert_eq!(streak_annotation(&doc, "Laundry", day(TODAY)), "");
    }

    #[test]
    fn completed_yesterday_is_the_grace_day() {
        let doc = doc_with_recurring_completions(&[1]);
        assert_eq!(streak_annotation(&doc, "Laundry", day(TODAY)), "");
    }

    #[test]
    fn miss_run_counts_back_to_first_hit() {
        // Completions on T-3 and T-5; misses on T-1, T-2 → "(2)"
        let doc = doc_with_recurring_completions(&[3, 5]);
        assert_eq!(streak_annotation(&doc, "Laundry", day(TODAY)), "(2)");
    }

    #[test]
    fn single_miss_yesterday_shows_one() {
        let doc = doc_with_recurring_completions(&[2]);
        assert_eq!(streak_annotation(&doc, "Laundry", day(TODAY)), "(1)");
    }

    #[test]
    fn miss_run_is_bounded() {
        let doc = doc_with_recurring_completions(&[200]);
        assert_eq!(streak_annotation(&doc, "Laundry", day(TODAY)), "(99)");
    }

    #[test]
    fn other_categories_do_not_count() {
        let today = day(TODAY);
        let mut doc = Document::default();
        doc.completed.push(Completion {
            task: "Laundry".into(),
            category: Category::Adhoc,
            topic: "chores".into(),
            timestamp: noon(today),
        });
        doc.completed.push(Completion {
            task: "Laundry".into(),
            category: Category::Recurring,
            topic: String::new(),
            timestamp: noon(today - Days::new(3)),
        });
        // The adhoc completion today is invisible to the recurring streak
        assert_eq!(streak_annotation(&doc, "Laundry", today), "(2)");
    }

    #[test]
    fn review_counts_missed_days_in_window() {
        // Completed on 3 of the last 7 days → 4 missed
        let doc = doc_with_recurring_completions(&[0, 2, 4]);
        let defaults = vec!["Laundry".to_string(), "Gym hour".to_string()];
        let review = weekly_review(&doc, &defaults, day(TODAY));
        assert_eq!(
            review.missed,
            vec![
                MissedRecurring {
                    task: "Laundry".into(),
                    days_missed: 4
                },
                MissedRecurring {
                    task: "Gym hour".into(),
                    days_missed: 7
                },
            ]
        );
    }

    #[test]
    fn fully_kept_task_is_not_reported() {
        let doc = doc_with_recurring_completions(&[0, 1, 2, 3, 4, 5, 6]);
        let defaults = vec!["Laundry".to_string()];
        let review = weekly_review(&doc, &defaults, day(TODAY));
        assert!(review.missed.is_empty());
    }

    #[test]
    fn review_reports_stale_adhoc_tasks_only() {
        let today = day(TODAY);
        let mut doc = Document::default();
        doc.tasks.adhoc.insert(
            "errands".into(),
            vec![
                TaskRecord::new("Fix bike", today - Days::new(10)),
                TaskRecord::new("Buy tape", today - Days::new(2)),
                TaskRecord::new("Renew passport", today - Days::new(7)),
            ],
        );
        // Main-quest age is not the review's concern
        doc.tasks.main_quest.insert(
            "thesis".into(),
            vec![TaskRecord::new("Draft chapter 2", today - Days::new(30))],
        );

        let review = weekly_review(&doc, &[], today);
        assert_eq!(
            review.stale,
            vec![StaleTopic {
                topic: "errands".into(),
                tasks: vec!["Fix bike".into(), "Renew passport".into()],
            }]
        );
    }
}
