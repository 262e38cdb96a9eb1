//! Dual-window quota admission control.
//!
//! Two independent counters, keyed by calendar day and by hour within the
//! day. Keys are derived from the wall clock, so windows reset by
//! construction: a new hour or day simply reads a fresh zero-valued key.
//! Old keys stay in the store for audit and are never re-consulted.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::BotConfig;
use crate::error::StoreError;
use crate::store::{QuotaWindow, StateStore};

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaDecision {
    /// Whether a reply may be posted right now.
    pub allowed: bool,
    /// Replies already posted today.
    pub daily_count: u32,
    /// Replies already posted this hour.
    pub hourly_count: u32,
}

/// Enforces the hourly and daily reply budgets.
pub struct QuotaController {
    store: Arc<dyn StateStore>,
    daily_limit: u32,
    hourly_limit: u32,
}

impl QuotaController {
    pub fn new(store: Arc<dyn StateStore>, config: &BotConfig) -> Self {
        Self {
            store,
            daily_limit: config.daily_limit,
            hourly_limit: config.hourly_limit,
        }
    }

    /// Read-only admission check for the windows containing `now`.
    pub async fn check(&self, now: DateTime<Utc>) -> Result<QuotaDecision, StoreError> {
        let daily = self.store.load_counters(QuotaWindow::Daily).await?;
        let hourly = self.store.load_counters(QuotaWindow::Hourly).await?;

        let daily_count = daily.get(&QuotaWindow::Daily.key(now)).copied().unwrap_or(0);
        let hourly_count = hourly
            .get(&QuotaWindow::Hourly.key(now))
            .copied()
            .unwrap_or(0);

        let decision = QuotaDecision {
            allowed: daily_count < self.daily_limit && hourly_count < self.hourly_limit,
            daily_count,
            hourly_count,
        };
        debug!(
            allowed = decision.allowed,
            daily_count,
            daily_limit = self.daily_limit,
            hourly_count,
            hourly_limit = self.hourly_limit,
            "Quota check"
        );
        Ok(decision)
    }

    /// Increment both window counters.
    ///
    /// Must only be called after a reply is confirmed posted, never
    /// speculatively. Each slot is persisted before the next so a crash
    /// between the two over-counts (never under-counts) the daily window.
    pub async fn record(&self, now: DateTime<Utc>) -> Result<(), StoreError> {
        for window in [QuotaWindow::Daily, QuotaWindow::Hourly] {
            let mut counters = self.store.load_counters(window).await?;
            *counters.entry(window.key(now)).or_insert(0) += 1;
            self.store.save_counters(window, &counters).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonFileStore;
    use chrono::TimeZone;

    async fn controller(hourly: u32, daily: u32) -> (tempfile::TempDir, QuotaController) {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn StateStore> =
            Arc::new(JsonFileStore::open(dir.path()).await.unwrap());
        let config = BotConfig {
            hourly_limit: hourly,
            daily_limit: daily,
            ..BotConfig::default()
        };
        (dir, QuotaController::new(store, &config))
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 9, hour, 15, 0).unwrap()
    }

    #[tokio::test]
    async fn fresh_windows_allow() {
        let (_dir, quota) = controller(3, 15).await;
        let decision = quota.check(at(10)).await.unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.daily_count, 0);
        assert_eq!(decision.hourly_count, 0);
    }

    #[tokio::test]
    async fn hourly_limit_refuses_first() {
        let (_dir, quota) = controller(3, 15).await;
        for _ in 0..3 {
            quota.record(at(10)).await.unwrap();
        }
        let decision = quota.check(at(10)).await.unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.hourly_count, 3);
        assert_eq!(decision.daily_count, 3);
    }

    #[tokio::test]
    async fn new_hour_resets_hourly_but_not_daily() {
        let (_dir, quota) = controller(3, 15).await;
        for _ in 0..3 {
            quota.record(at(10)).await.unwrap();
        }
        let decision = quota.check(at(11)).await.unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.hourly_count, 0);
        assert_eq!(decision.daily_count, 3);
    }

    #[tokio::test]
    async fn daily_limit_refuses_across_hours() {
        let (_dir, quota) = controller(3, 5).await;
        for hour in [8, 8, 8, 9, 9] {
            quota.record(at(hour)).await.unwrap();
        }
        let decision = quota.check(at(12)).await.unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.daily_count, 5);
        assert_eq!(decision.hourly_count, 0);
    }

    #[tokio::test]
    async fn counts_never_exceed_limits_when_gated() {
        let (_dir, quota) = controller(3, 15).await;
        // Caller discipline: record only when check allows.
        let mut posted = 0;
        for _ in 0..10 {
            let decision = quota.check(at(10)).await.unwrap();
            if !decision.allowed {
                break;
            }
            quota.record(at(10)).await.unwrap();
            posted += 1;
        }
        assert_eq!(posted, 3);
        let decision = quota.check(at(10)).await.unwrap();
        assert_eq!(decision.hourly_count, 3);
        assert!(decision.hourly_count <= 3 && decision.daily_count <= 15);
    }

    #[tokio::test]
    async fn old_keys_are_retained_for_audit() {
        let (dir, quota) = controller(3, 15).await;
        quota.record(at(8)).await.unwrap();
        quota.record(at(9)).await.unwrap();

        let store = JsonFileStore::open(dir.path()).await.unwrap();
        let hourly = store.load_counters(QuotaWindow::Hourly).await.unwrap();
        assert_eq!(hourly.len(), 2);
        assert_eq!(hourly.get("2025-03-09-8"), Some(&1));
        assert_eq!(hourly.get("2025-03-09-9"), Some(&1));
    }
}
