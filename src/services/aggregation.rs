//! Snapshot aggregation.
//!
//! One pass over the classified messages builds both outputs: day buckets
//! keyed by a human-readable calendar day, and per-company tallies of
//! Applied/Interview outcomes. Arrival order is preserved within buckets;
//! no re-sorting happens anywhere.

use chrono::{DateTime, FixedOffset};
use tracing::debug;

use crate::types::{Category, ClassifiedMessage, Snapshot};

/// Bucket key for messages whose Date header cannot be parsed. A bad
/// date never aborts a refresh pass.
pub const INVALID_DAY_KEY: &str = "Invalid Date";

/// Format a Date header as a calendar-day key, e.g. "Tuesday, Aug 5, 2025".
/// The day is taken in the header's own UTC offset, so bucketing does not
/// depend on where the server runs.
pub fn day_key(raw_date: &str) -> String {
    parse_message_date(raw_date)
        .map(|dt| dt.format("%A, %b %-d, %Y").to_string())
        .unwrap_or_else(|| INVALID_DAY_KEY.to_string())
}

fn parse_message_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = strip_trailing_comment(raw.trim());
    if trimmed.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc2822(trimmed)
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed))
        .ok()
}

/// Date headers commonly end with a parenthesized zone comment,
/// e.g. "Tue, 5 Aug 2025 10:30:00 +0000 (UTC)".
fn strip_trailing_comment(s: &str) -> &str {
    match s.rfind('(') {
        Some(idx) if s.ends_with(')') => s[..idx].trim_end(),
        _ => s,
    }
}

/// Fold one refresh pass's messages into a snapshot. Version and refresh
/// time are left for the store to stamp at publish.
pub fn build_snapshot(messages: Vec<ClassifiedMessage>) -> Snapshot {
    let mut snapshot = Snapshot {
        message_count: messages.len(),
        ..Snapshot::default()
    };

    for message in messages {
        match message.classification {
            Category::Applied => {
                snapshot
                    .company_stats
                    .entry(message.company.clone())
                    .or_default()
                    .applied += 1;
            }
            Category::Interview => {
                snapshot
                    .company_stats
                    .entry(message.company.clone())
                    .or_default()
                    .interviews += 1;
            }
            _ => {}
        }

        snapshot
            .emails_by_day
            .entry(day_key(&message.date))
            .or_default()
            .push(message);
    }

    debug!(
        messages = snapshot.message_count,
        days = snapshot.emails_by_day.len(),
        companies = snapshot.company_stats.len(),
        "Aggregated snapshot"
    );

    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(date: &str, classification: Category, company: &str) -> ClassifiedMessage {
        ClassifiedMessage {
            subject: "s".to_string(),
            from: format!("jobs@{}.com", company),
            date: date.to_string(),
            classification,
            company: company.to_string(),
        }
    }

    #[test]
    fn test_day_key_format() {
        assert_eq!(
            day_key("Tue, 5 Aug 2025 10:30:00 +0000"),
            "Tuesday, Aug 5, 2025"
        );
    }

    #[test]
    fn test_day_key_uses_header_offset() {
        // 01:30 at +0530 is still the previous day in UTC; the key keeps
        // the header's own calendar day.
        assert_eq!(
            day_key("Wed, 6 Aug 2025 01:30:00 +0530"),
            "Wednesday, Aug 6, 2025"
        );
    }

    #[test]
    fn test_day_key_tolerates_zone_comment() {
        assert_eq!(
            day_key("Tue, 5 Aug 2025 10:30:00 +0000 (UTC)"),
            "Tuesday, Aug 5, 2025"
        );
    }

    #[test]
    fn test_day_key_falls_back_on_garbage() {
        assert_eq!(day_key("not a date"), INVALID_DAY_KEY);
        assert_eq!(day_key(""), INVALID_DAY_KEY);
    }

    #[test]
    fn test_bucket_totals_match_input_count() {
        let messages = vec![
            message("Tue, 5 Aug 2025 08:00:00 +0000", Category::Applied, "acme"),
            message("Tue, 5 Aug 2025 09:00:00 +0000", Category::Rejection, "bigco"),
            message("Wed, 6 Aug 2025 10:00:00 +0000", Category::Interview, "acme"),
            message("garbage", Category::Uncategorized, "Unknown"),
        ];

        let snapshot = build_snapshot(messages);
        let total: usize = snapshot.emails_by_day.values().map(|b| b.len()).sum();
        assert_eq!(total, 4);
        assert_eq!(snapshot.message_count, 4);
        assert_eq!(snapshot.emails_by_day[INVALID_DAY_KEY].len(), 1);
    }

    #[test]
    fn test_arrival_order_preserved_within_bucket() {
        let mut first = message("Tue, 5 Aug 2025 09:00:00 +0000", Category::Applied, "acme");
        first.subject = "first".to_string();
        let mut second = message("Tue, 5 Aug 2025 08:00:00 +0000", Category::Applied, "acme");
        second.subject = "second".to_string();

        // Later timestamp arrives first; bucket keeps arrival order.
        let snapshot = build_snapshot(vec![first, second]);
        let bucket = &snapshot.emails_by_day["Tuesday, Aug 5, 2025"];
        assert_eq!(bucket[0].subject, "first");
        assert_eq!(bucket[1].subject, "second");
    }

    #[test]
    fn test_company_stats_count_applied_and_interviews() {
        let messages = vec![
            message("Tue, 5 Aug 2025 08:00:00 +0000", Category::Applied, "acme"),
            message("Tue, 5 Aug 2025 09:00:00 +0000", Category::Applied, "acme"),
            message("Wed, 6 Aug 2025 10:00:00 +0000", Category::Interview, "acme"),
            message("Wed, 6 Aug 2025 11:00:00 +0000", Category::Applied, "bigco"),
        ];

        let snapshot = build_snapshot(messages);
        assert_eq!(snapshot.company_stats["acme"].applied, 2);
        assert_eq!(snapshot.company_stats["acme"].interviews, 1);
        assert_eq!(snapshot.company_stats["bigco"].applied, 1);
        assert_eq!(snapshot.company_stats["bigco"].interviews, 0);
    }

    #[test]
    fn test_non_qualifying_categories_never_create_company_records() {
        let messages = vec![
            message("Tue, 5 Aug 2025 08:00:00 +0000", Category::Rejection, "bigco"),
            message("Tue, 5 Aug 2025 09:00:00 +0000", Category::LinkedIn, "linkedin"),
            message("Tue, 5 Aug 2025 10:00:00 +0000", Category::Uncategorized, "Unknown"),
        ];

        let snapshot = build_snapshot(messages);
        assert!(snapshot.company_stats.is_empty());
    }

    #[test]
    fn test_empty_input_builds_empty_snapshot() {
        let snapshot = build_snapshot(Vec::new());
        assert!(snapshot.emails_by_day.is_empty());
        assert!(snapshot.company_stats.is_empty());
        assert_eq!(snapshot.message_count, 0);
    }
}
