//! Durable activity log and reporting.
//!
//! Every decision the engine takes is appended to the activity slot (a
//! capped ring: oldest entries dropped beyond the retention cap) and
//! mirrored to `tracing` for the operator console. The log survives runs;
//! the viewer binary reads the same slot.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::BotConfig;
use crate::error::StoreError;
use crate::quota::QuotaDecision;
use crate::store::{
    ActivityEntry, ActivityLevel, DailyReport, OverallStats, ProcessedItemRecord, QuotaSnapshot,
    StateStore,
};

/// Append-only audit record, persisted after every entry.
pub struct ActivityLog {
    store: Arc<dyn StateStore>,
    entries: Vec<ActivityEntry>,
    cap: usize,
    run_id: Uuid,
}

impl ActivityLog {
    /// Load the existing log and bind new entries to `run_id`.
    pub async fn open(
        store: Arc<dyn StateStore>,
        cap: usize,
        run_id: Uuid,
    ) -> Result<Self, StoreError> {
        let entries = store.load_activity().await?;
        Ok(Self {
            store,
            entries,
            cap,
            run_id,
        })
    }

    /// Append one entry, trim to the cap, persist, and mirror to tracing.
    pub async fn log(
        &mut self,
        level: ActivityLevel,
        message: impl Into<String>,
        data: serde_json::Value,
    ) -> Result<(), StoreError> {
        let message = message.into();
        match level {
            ActivityLevel::Info | ActivityLevel::Success => {
                info!(level = %level, data = %data, "{message}")
            }
            ActivityLevel::Warning => warn!(data = %data, "{message}"),
            ActivityLevel::Error => error!(data = %data, "{message}"),
        }

        self.entries.push(ActivityEntry {
            timestamp: Utc::now(),
            level,
            message,
            data,
            run_id: self.run_id,
        });
        if self.entries.len() > self.cap {
            let excess = self.entries.len() - self.cap;
            self.entries.drain(..excess);
        }
        self.store.save_activity(&self.entries).await
    }

    pub async fn info(
        &mut self,
        message: impl Into<String>,
        data: serde_json::Value,
    ) -> Result<(), StoreError> {
        self.log(ActivityLevel::Info, message, data).await
    }

    pub async fn success(
        &mut self,
        message: impl Into<String>,
        data: serde_json::Value,
    ) -> Result<(), StoreError> {
        self.log(ActivityLevel::Success, message, data).await
    }

    pub async fn warning(
        &mut self,
        message: impl Into<String>,
        data: serde_json::Value,
    ) -> Result<(), StoreError> {
        self.log(ActivityLevel::Warning, message, data).await
    }

    pub async fn error(
        &mut self,
        message: impl Into<String>,
        data: serde_json::Value,
    ) -> Result<(), StoreError> {
        self.log(ActivityLevel::Error, message, data).await
    }

    /// Entries currently retained, oldest first.
    pub fn entries(&self) -> &[ActivityEntry] {
        &self.entries
    }
}

/// Aggregate lifetime statistics from the processed-item records plus the
/// current quota position.
pub fn overall_stats(
    items: &[ProcessedItemRecord],
    quota: QuotaDecision,
    config: &BotConfig,
) -> OverallStats {
    OverallStats {
        total_items_processed: items.len(),
        total_comments_checked: items.iter().map(|i| u64::from(i.comments_checked)).sum(),
        total_responses_posted: items.iter().map(|i| u64::from(i.responses_posted)).sum(),
        daily_responses_remaining: config.daily_limit.saturating_sub(quota.daily_count),
        hourly_responses_remaining: config.hourly_limit.saturating_sub(quota.hourly_count),
        last_processed_item: items.last().cloned(),
    }
}

/// Snapshot today's report.
pub fn build_daily_report(
    now: DateTime<Utc>,
    stats: OverallStats,
    quota: QuotaDecision,
    config: &BotConfig,
) -> DailyReport {
    DailyReport {
        date: now.format("%Y-%m-%d").to_string(),
        generated_at: now,
        stats,
        quota: QuotaSnapshot {
            hourly_used: quota.hourly_count,
            daily_used: quota.daily_count,
            hourly_limit: config.hourly_limit,
            daily_limit: config.daily_limit,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonFileStore;
    use chrono::TimeZone;
    use serde_json::json;

    async fn open_log(cap: usize) -> (tempfile::TempDir, ActivityLog) {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn StateStore> =
            Arc::new(JsonFileStore::open(dir.path()).await.unwrap());
        let log = ActivityLog::open(store, cap, Uuid::new_v4()).await.unwrap();
        (dir, log)
    }

    #[tokio::test]
    async fn entries_append_in_order() {
        let (_dir, mut log) = open_log(100).await;
        log.info("first", serde_json::Value::Null).await.unwrap();
        log.success("second", json!({"n": 1})).await.unwrap();
        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "first");
        assert_eq!(entries[1].level, ActivityLevel::Success);
    }

    #[tokio::test]
    async fn retention_cap_drops_oldest() {
        let (_dir, mut log) = open_log(5).await;
        for i in 0..8 {
            log.info(format!("entry {i}"), serde_json::Value::Null)
                .await
                .unwrap();
        }
        let entries = log.entries();
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[0].message, "entry 3");
        assert_eq!(entries[4].message, "entry 7");
    }

    #[tokio::test]
    async fn log_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn StateStore> =
            Arc::new(JsonFileStore::open(dir.path()).await.unwrap());
        {
            let mut log = ActivityLog::open(Arc::clone(&store), 100, Uuid::new_v4())
                .await
                .unwrap();
            log.warning("persisted", serde_json::Value::Null)
                .await
                .unwrap();
        }
        let log = ActivityLog::open(store, 100, Uuid::new_v4()).await.unwrap();
        assert_eq!(log.entries().len(), 1);
        assert_eq!(log.entries()[0].message, "persisted");
    }

    fn record(comments: u32, responses: u32) -> ProcessedItemRecord {
        let ts = Utc.with_ymd_and_hms(2025, 3, 9, 10, 0, 0).unwrap();
        ProcessedItemRecord {
            item_id: "v".into(),
            title: "t".into(),
            published_at: ts,
            processed_at: ts,
            comments_checked: comments,
            responses_posted: responses,
            last_processed_at: ts,
        }
    }

    #[test]
    fn overall_stats_aggregate_records() {
        let items = vec![record(10, 1), record(5, 0), record(20, 2)];
        let quota = QuotaDecision {
            allowed: true,
            daily_count: 3,
            hourly_count: 1,
        };
        let stats = overall_stats(&items, quota, &BotConfig::default());
        assert_eq!(stats.total_items_processed, 3);
        assert_eq!(stats.total_comments_checked, 35);
        assert_eq!(stats.total_responses_posted, 3);
        assert_eq!(stats.daily_responses_remaining, 12);
        assert_eq!(stats.hourly_responses_remaining, 2);
        assert_eq!(stats.last_processed_item.unwrap().comments_checked, 20);
    }

    #[test]
    fn report_carries_date_and_quota() {
        let now = Utc.with_ymd_and_hms(2025, 3, 9, 18, 0, 0).unwrap();
        let quota = QuotaDecision {
            allowed: false,
            daily_count: 15,
            hourly_count: 3,
        };
        let stats = overall_stats(&[], quota, &BotConfig::default());
        let report = build_daily_report(now, stats, quota, &BotConfig::default());
        assert_eq!(report.date, "2025-03-09");
        assert_eq!(report.quota.daily_used, 15);
        assert_eq!(report.quota.daily_limit, 15);
    }
}
