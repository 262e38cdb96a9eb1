//! Run orchestrator.
//!
//! One invocation is one bounded batch run: resolve the channel, enumerate
//! recent content items, and for each unprocessed item walk its comments
//! through the eligibility pipeline, the quota gate, the response
//! generator, and the platform post — recording every outcome durably as
//! it happens. Execution is strictly sequential; a terminated run leaves
//! the store at the last completed increment and a later run resumes
//! safely.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use crate::activity::{ActivityLog, build_daily_report, overall_stats};
use crate::config::BotConfig;
use crate::error::Error;
use crate::pipeline::filters::EligibilityPipeline;
use crate::pipeline::types::Verdict;
use crate::platform::{Comment, ContentItem, Platform};
use crate::quota::QuotaController;
use crate::reply::ResponseGenerator;
use crate::store::{ProcessedItemRecord, StateStore};

/// Items processed in one run above which a daily report is always
/// snapshotted, even with zero replies posted.
const REPORT_ITEM_THRESHOLD: usize = 10;

/// What one run accomplished.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Correlation id stamped into this run's activity entries.
    pub run_id: Uuid,
    /// Items newly processed this run (skipped items excluded).
    pub items_processed: usize,
    /// Comments fetched and evaluated this run.
    pub comments_checked: u32,
    /// Replies successfully posted this run.
    pub responses_posted: u32,
    /// Whether a quota refusal ended the run early.
    pub stopped_by_quota: bool,
}

/// Outcome of walking one item's comments.
enum ItemOutcome {
    /// Scan completed; true when a reply was posted.
    Scanned { posted: bool, attempts_failed: u32 },
    /// Quota refused mid-item; the whole run stops.
    QuotaStop,
}

/// The engine: owns the run loop and all engine state for its duration.
pub struct Engine {
    config: BotConfig,
    store: Arc<dyn StateStore>,
    platform: Arc<dyn Platform>,
    quota: QuotaController,
    pipeline: EligibilityPipeline,
    generator: ResponseGenerator,
    rng: StdRng,
    /// Sleep for real during pacing. Disabled by tests.
    pacing_enabled: bool,
}

impl Engine {
    pub fn new(config: BotConfig, store: Arc<dyn StateStore>, platform: Arc<dyn Platform>) -> Self {
        Self::with_rng(config, store, platform, StdRng::from_entropy())
    }

    /// Build with a caller-supplied rng so template selection and pacing
    /// jitter are reproducible.
    pub fn with_rng(
        config: BotConfig,
        store: Arc<dyn StateStore>,
        platform: Arc<dyn Platform>,
        mut rng: StdRng,
    ) -> Self {
        let quota = QuotaController::new(Arc::clone(&store), &config);
        let pipeline = EligibilityPipeline::new(&config);
        let generator = ResponseGenerator::new(
            config.outreach_url.clone(),
            StdRng::seed_from_u64(rng.next_u64()),
        );
        Self {
            config,
            store,
            platform,
            quota,
            pipeline,
            generator,
            rng,
            pacing_enabled: true,
        }
    }

    /// Disable the post-reply pacing sleep (test runs).
    pub fn without_pacing(mut self) -> Self {
        self.pacing_enabled = false;
        self
    }

    /// Execute one run to completion or fatal failure.
    pub async fn run(&mut self) -> Result<RunSummary, Error> {
        let run_id = Uuid::new_v4();
        let mut activity = ActivityLog::open(
            Arc::clone(&self.store),
            self.config.activity_log_cap,
            run_id,
        )
        .await?;

        let mut summary = RunSummary {
            run_id,
            items_processed: 0,
            comments_checked: 0,
            responses_posted: 0,
            stopped_by_quota: false,
        };

        activity
            .info(
                "Starting comment outreach run",
                json!({
                    "channel": self.config.channel_handle,
                    "lookback_days": self.config.lookback_days,
                    "max_items": self.config.max_items_per_run,
                }),
            )
            .await?;

        // Preflight: a run that cannot post anything does no platform work.
        let preflight = self.quota.check(Utc::now()).await?;
        if !preflight.allowed {
            activity
                .warning(
                    "Rate limit reached, run skipped",
                    json!({
                        "daily": format!("{}/{}", preflight.daily_count, self.config.daily_limit),
                        "hourly": format!("{}/{}", preflight.hourly_count, self.config.hourly_limit),
                    }),
                )
                .await?;
            summary.stopped_by_quota = true;
            return Ok(summary);
        }

        // Channel resolution failure is fatal: nothing is possible without it.
        let channel_id = match self.platform.resolve_channel_id().await {
            Ok(id) => id,
            Err(e) => {
                activity
                    .error(
                        "Could not resolve channel id",
                        json!({ "channel": self.config.channel_handle, "error": e.to_string() }),
                    )
                    .await?;
                return Err(e.into());
            }
        };
        activity
            .success("Resolved channel id", json!({ "channel_id": channel_id }))
            .await?;

        let published_after = Utc::now() - Duration::days(self.config.lookback_days);
        let items = match self
            .platform
            .list_recent_items(&channel_id, self.config.max_items_per_run, published_after)
            .await
        {
            Ok(items) => items,
            Err(e) => {
                activity
                    .error(
                        "Could not enumerate recent items",
                        json!({ "channel_id": channel_id, "error": e.to_string() }),
                    )
                    .await?;
                return Err(e.into());
            }
        };
        activity
            .info(
                "Enumerated recent items",
                json!({ "count": items.len(), "lookback_days": self.config.lookback_days }),
            )
            .await?;

        let mut processed = self.store.load_processed_items().await?;

        for item in &items {
            if processed.iter().any(|r| r.item_id == item.id) {
                debug!(item_id = %item.id, title = %item.title, "Item already processed, skipping");
                continue;
            }

            info!(item_id = %item.id, title = %item.title, "Processing item");

            let comments = match self
                .platform
                .list_comments(&item.id, self.config.max_comments_per_item)
                .await
            {
                Ok(comments) => comments,
                Err(e) => {
                    // Recoverable per action: the item stays unmarked so a
                    // later run retries it.
                    activity
                        .error(
                            "Could not fetch comments",
                            json!({ "item_id": item.id, "error": e.to_string() }),
                        )
                        .await?;
                    continue;
                }
            };
            summary.comments_checked += comments.len() as u32;

            let outcome = self
                .scan_item(item, &comments, &mut activity, &mut summary)
                .await?;

            match outcome {
                ItemOutcome::Scanned {
                    posted,
                    attempts_failed,
                } => {
                    // Only a successful post, or a scan with no failed
                    // attempts, consumes the per-item slot. Pure post
                    // failure leaves the item for a later run.
                    if posted || attempts_failed == 0 {
                        upsert_record(&mut processed, item, comments.len() as u32, posted);
                        self.store.save_processed_items(&processed).await?;
                        summary.items_processed += 1;
                    }
                }
                ItemOutcome::QuotaStop => {
                    summary.stopped_by_quota = true;
                    break;
                }
            }
        }

        self.finalize(&mut activity, &summary, &processed).await?;
        Ok(summary)
    }

    /// Walk one item's comments in order, posting at most one reply.
    async fn scan_item(
        &mut self,
        item: &ContentItem,
        comments: &[Comment],
        activity: &mut ActivityLog,
        summary: &mut RunSummary,
    ) -> Result<ItemOutcome, Error> {
        let mut attempts_failed = 0u32;

        for comment in comments {
            let now = Utc::now();
            let cooldowns = self.store.load_cooldowns().await?;
            let verdict = self.pipeline.evaluate(comment, &cooldowns, now);

            let Verdict::Eligible {
                keyword,
                classification,
            } = verdict
            else {
                continue;
            };

            // Global gate: refusal stops the whole run, not just this item.
            let decision = self.quota.check(now).await?;
            if !decision.allowed {
                activity
                    .warning(
                        "Quota exhausted mid-run, stopping",
                        json!({
                            "daily": format!("{}/{}", decision.daily_count, self.config.daily_limit),
                            "hourly": format!("{}/{}", decision.hourly_count, self.config.hourly_limit),
                        }),
                    )
                    .await?;
                return Ok(ItemOutcome::QuotaStop);
            }

            let reply_text = self.generator.generate(&keyword, classification);

            match self.platform.post_reply(&comment.id, &reply_text).await {
                Ok(()) => {
                    // Confirmed post: counters first, then cooldown, then the
                    // audit entry. No step is recorded speculatively.
                    self.quota.record(now).await?;
                    if let Some(author_id) = &comment.author_id {
                        let mut cooldowns = self.store.load_cooldowns().await?;
                        cooldowns.insert(author_id.clone(), now);
                        self.store.save_cooldowns(&cooldowns).await?;
                    }
                    summary.responses_posted += 1;
                    activity
                        .success(
                            "Posted outreach reply",
                            json!({
                                "item_id": item.id,
                                "comment_id": comment.id,
                                "keyword": keyword,
                                "classification": classification,
                                "comment_text": comment.text,
                                "reply_text": reply_text,
                            }),
                        )
                        .await?;

                    self.pace().await;
                    // One reply per item per run.
                    return Ok(ItemOutcome::Scanned {
                        posted: true,
                        attempts_failed,
                    });
                }
                Err(e) => {
                    // No action taken: quota, cooldown, and processed state
                    // are untouched for this attempt.
                    attempts_failed += 1;
                    activity
                        .error(
                            "Failed to post reply",
                            json!({
                                "item_id": item.id,
                                "comment_id": comment.id,
                                "error": e.to_string(),
                            }),
                        )
                        .await?;
                }
            }
        }

        Ok(ItemOutcome::Scanned {
            posted: false,
            attempts_failed,
        })
    }

    /// Human-cadence delay after a successful post.
    async fn pace(&mut self) {
        let (min, max) = self.config.pacing_minutes;
        let minutes = self.rng.gen_range(min..=max);
        if !self.pacing_enabled {
            debug!(minutes, "Pacing disabled, skipping delay");
            return;
        }
        info!(minutes, "Pacing before next response");
        tokio::time::sleep(std::time::Duration::from_secs_f64(minutes * 60.0)).await;
    }

    /// Session summary, lifetime stats, and (when warranted) the daily
    /// report snapshot.
    async fn finalize(
        &mut self,
        activity: &mut ActivityLog,
        summary: &RunSummary,
        processed: &[ProcessedItemRecord],
    ) -> Result<(), Error> {
        activity
            .success(
                "Processing session completed",
                serde_json::to_value(summary).unwrap_or(serde_json::Value::Null),
            )
            .await?;

        let now = Utc::now();
        let quota = self.quota.check(now).await?;
        let stats = overall_stats(processed, quota, &self.config);
        activity
            .info(
                "Final overall statistics",
                serde_json::to_value(&stats).unwrap_or(serde_json::Value::Null),
            )
            .await?;

        if summary.responses_posted > 0 || summary.items_processed > REPORT_ITEM_THRESHOLD {
            let report = build_daily_report(now, stats, quota, &self.config);
            self.store.save_report(&report).await?;
            activity
                .info("Daily report generated", json!({ "date": report.date }))
                .await?;
        }

        Ok(())
    }
}

/// Create or refresh the processed record for an item.
fn upsert_record(
    processed: &mut Vec<ProcessedItemRecord>,
    item: &ContentItem,
    comments_checked: u32,
    posted: bool,
) {
    let now = Utc::now();
    let posted_count = u32::from(posted);
    if let Some(record) = processed.iter_mut().find(|r| r.item_id == item.id) {
        record.comments_checked += comments_checked;
        record.responses_posted += posted_count;
        record.last_processed_at = now;
    } else {
        processed.push(ProcessedItemRecord {
            item_id: item.id.clone(),
            title: item.title.clone(),
            published_at: item.published_at,
            processed_at: now,
            comments_checked,
            responses_posted: posted_count,
            last_processed_at: now,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(id: &str) -> ContentItem {
        ContentItem {
            id: id.into(),
            title: format!("Item {id}"),
            published_at: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn upsert_creates_then_updates() {
        let mut processed = Vec::new();
        upsert_record(&mut processed, &item("a"), 10, true);
        assert_eq!(processed.len(), 1);
        assert_eq!(processed[0].comments_checked, 10);
        assert_eq!(processed[0].responses_posted, 1);

        upsert_record(&mut processed, &item("a"), 5, false);
        assert_eq!(processed.len(), 1);
        assert_eq!(processed[0].comments_checked, 15);
        assert_eq!(processed[0].responses_posted, 1);
    }
}
