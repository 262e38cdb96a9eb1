//! Durable record shapes.
//!
//! Every slot in the store is one of these explicit types with a defined
//! default shape: map-shaped slots default to an empty map, list-shaped
//! slots to an empty list. No untyped blobs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One record per content item ever seen. Its presence is the idempotency
/// marker: an item with a record is never re-enumerated for processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedItemRecord {
    /// Platform item id.
    pub item_id: String,
    /// Item title at the time it was processed.
    pub title: String,
    /// When the item was published.
    pub published_at: DateTime<Utc>,
    /// When the item was first processed.
    pub processed_at: DateTime<Utc>,
    /// Comments fetched and evaluated for this item, cumulative.
    pub comments_checked: u32,
    /// Replies successfully posted on this item, cumulative.
    pub responses_posted: u32,
    /// When the item was last touched by a run.
    pub last_processed_at: DateTime<Utc>,
}

/// Author id → when we last replied to them.
///
/// An author with an entry younger than the cooldown period is ineligible
/// for any new reply.
pub type CooldownMap = BTreeMap<String, DateTime<Utc>>;

/// Window key → replies posted in that window.
///
/// Keys are wall-clock derived (`YYYY-MM-DD` or `YYYY-MM-DD-H`), so a new
/// day or hour introduces a fresh zero-valued key. Old keys are retained
/// for audit but never re-consulted.
pub type QuotaCounters = BTreeMap<String, u32>;

/// Which quota window a counter slot tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaWindow {
    Daily,
    Hourly,
}

impl QuotaWindow {
    /// Counter key for the window containing `now`.
    pub fn key(&self, now: DateTime<Utc>) -> String {
        match self {
            Self::Daily => now.format("%Y-%m-%d").to_string(),
            Self::Hourly => now.format("%Y-%m-%d-%-H").to_string(),
        }
    }
}

/// Severity of an activity log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl std::fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Info => "INFO",
            Self::Success => "SUCCESS",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        };
        write!(f, "{s}")
    }
}

/// One append-only audit record. The activity slot is a capped ring: the
/// oldest entries are dropped once the retention cap is exceeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// When the entry was recorded.
    pub timestamp: DateTime<Utc>,
    /// Severity.
    pub level: ActivityLevel,
    /// Human-readable message.
    pub message: String,
    /// Structured payload (`Value::Null` when there is none).
    #[serde(default)]
    pub data: serde_json::Value,
    /// Correlates entries from the same run.
    pub run_id: Uuid,
}

/// Aggregate statistics over everything the engine has ever done.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallStats {
    pub total_items_processed: usize,
    pub total_comments_checked: u64,
    pub total_responses_posted: u64,
    pub daily_responses_remaining: u32,
    pub hourly_responses_remaining: u32,
    /// Most recently recorded item, if any.
    pub last_processed_item: Option<ProcessedItemRecord>,
}

/// Snapshot of quota usage at report time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaSnapshot {
    pub hourly_used: u32,
    pub daily_used: u32,
    pub hourly_limit: u32,
    pub daily_limit: u32,
}

/// Persisted end-of-day report, one slot per calendar date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyReport {
    /// Calendar date the report covers (`YYYY-MM-DD`).
    pub date: String,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    pub stats: OverallStats,
    pub quota: QuotaSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn daily_key_is_calendar_date() {
        let now = Utc.with_ymd_and_hms(2025, 3, 9, 14, 30, 0).unwrap();
        assert_eq!(QuotaWindow::Daily.key(now), "2025-03-09");
    }

    #[test]
    fn hourly_key_appends_hour_without_padding() {
        let now = Utc.with_ymd_and_hms(2025, 3, 9, 7, 5, 0).unwrap();
        assert_eq!(QuotaWindow::Hourly.key(now), "2025-03-09-7");
        let later = Utc.with_ymd_and_hms(2025, 3, 9, 23, 59, 59).unwrap();
        assert_eq!(QuotaWindow::Hourly.key(later), "2025-03-09-23");
    }

    #[test]
    fn hour_rollover_yields_fresh_key() {
        let before = Utc.with_ymd_and_hms(2025, 3, 9, 7, 59, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2025, 3, 9, 8, 0, 0).unwrap();
        assert_ne!(QuotaWindow::Hourly.key(before), QuotaWindow::Hourly.key(after));
        assert_eq!(QuotaWindow::Daily.key(before), QuotaWindow::Daily.key(after));
    }

    #[test]
    fn activity_level_serializes_screaming() {
        let json = serde_json::to_string(&ActivityLevel::Warning).unwrap();
        assert_eq!(json, "\"WARNING\"");
        let parsed: ActivityLevel = serde_json::from_str("\"SUCCESS\"").unwrap();
        assert_eq!(parsed, ActivityLevel::Success);
    }

    #[test]
    fn processed_record_serde_roundtrip() {
        let record = ProcessedItemRecord {
            item_id: "vid-1".into(),
            title: "Mortgage renewal tips".into(),
            published_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
            processed_at: Utc.with_ymd_and_hms(2025, 3, 9, 14, 0, 0).unwrap(),
            comments_checked: 12,
            responses_posted: 1,
            last_processed_at: Utc.with_ymd_and_hms(2025, 3, 9, 14, 0, 0).unwrap(),
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: ProcessedItemRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
