use chrono::{Days, NaiveDate, NaiveDateTime, Timelike};

use crate::model::document::Document;

/// The day rolls over at 05:00 local, not midnight. Tasks finished in the
/// small hours count toward the previous day.
pub const DAY_SWITCH_HOUR: u32 = 5;

/// The calendar date used for reset logic: before 05:00 this is still
/// yesterday.
pub fn effective_date(now: NaiveDateTime) -> NaiveDate {
    if now.hour() < DAY_SWITCH_HOUR {
        now.date() - Days::new(1)
    } else {
        now.date()
    }
}

/// Roll the document over to a new effective day: restore the recurring
/// list to the canonical set, clear the completion log, stamp `last_reset`.
/// Returns whether anything changed.
///
/// This runs once at load time only. A process that stays open across the
/// 05:00 boundary will not reset until the store is reopened.
pub fn apply_reset_if_needed(doc: &mut Document, defaults: &[String], now: NaiveDateTime) -> bool {
    let effective = effective_date(now).to_string();
    if doc.last_reset == effective {
        return false;
    }
    doc.tasks.recurring = defaults.to_vec();
    doc.completed.clear();
    doc.last_reset = effective;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::category::Category;
    use crate::model::document::Completion;

    fn at(s: &str) -> NaiveDateTime {
        s.parse().unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn before_five_is_yesterday() {
        assert_eq!(effective_date(at("2026-08-24T04:59:59")), day("2026-08-23"));
        assert_eq!(effective_date(at("2026-08-24T00:00:00")), day("2026-08-23"));
    }

    #[test]
    fn from_five_is_today() {
        assert_eq!(effective_date(at("2026-08-24T05:00:00")), day("2026-08-24"));
        assert_eq!(effective_date(at("2026-08-24T23:59:59")), day("2026-08-24"));
    }

    #[test]
    fn boundary_crosses_months() {
        assert_eq!(effective_date(at("2026-09-01T03:00:00")), day("2026-08-31"));
    }

    #[test]
    fn reset_restores_recurring_and_clears_log() {
        let defaults = vec!["Laundry".to_string(), "Gym hour".to_string()];
        let mut doc = Document::default();
        doc.tasks.recurring = vec!["Gym hour".to_string()];
        doc.completed.push(Completion {
            task: "Laundry".into(),
            category: Category::Recurring,
            topic: String::new(),
            timestamp: at("2026-08-23T10:00:00"),
        });
        doc.last_reset = "2026-08-23".into();

        let changed = apply_reset_if_needed(&mut doc, &defaults, at("2026-08-24T08:00:00"));
        assert!(changed);
        assert_eq!(doc.tasks.recurring, defaults);
        assert!(doc.completed.is_empty());
        assert_eq!(doc.last_reset, "2026-08-24");
    }

    #[test]
    fn reset_is_idempotent_for_the_same_instant() {
        let defaults = vec!["Laundry".to_string()];
        let mut doc = Document::default();
        let now = at("2026-08-24T08:00:00");

        assert!(apply_reset_if_needed(&mut doc, &defaults, now));
        let after_first = doc.clone();
        assert!(!apply_reset_if_needed(&mut doc, &defaults, now));
        assert_eq!(doc, after_first);
    }

    #[test]
    fn early_morning_does_not_reset_yesterdays_state() {
        let defaults = vec!["Laundry".to_string()];
        let mut doc = Document::default();
        doc.last_reset = "2026-08-23".into();
        doc.tasks.recurring.clear();

        // 02:00 on the 24th is still the effective 23rd
        assert!(!apply_reset_if_needed(
            &mut doc,
            &defaults,
            at("2026-08-24T02:00:00")
        ));
        assert!(doc.tasks.recurring.is_empty());
    }
}
