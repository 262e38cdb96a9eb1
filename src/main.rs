//! Ops viewer for the outreach engine's data directory.
//!
//! The engine itself runs as a library embedded behind a scheduler with a
//! concrete `Platform` implementation; this binary inspects what it has
//! done: the activity log, daily reports, and lifetime statistics.

use std::sync::Arc;

use chrono::Utc;

use comment_outreach::activity::overall_stats;
use comment_outreach::config::BotConfig;
use comment_outreach::quota::QuotaController;
use comment_outreach::store::{ActivityLevel, JsonFileStore, StateStore};

const RESET: &str = "\x1b[0m";

fn level_color(level: ActivityLevel) -> &'static str {
    match level {
        ActivityLevel::Info => "\x1b[36m",
        ActivityLevel::Success => "\x1b[32m",
        ActivityLevel::Warning => "\x1b[33m",
        ActivityLevel::Error => "\x1b[31m",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let data_dir =
        std::env::var("OUTREACH_DATA_DIR").unwrap_or_else(|_| "./data".to_string());
    let store = Arc::new(JsonFileStore::open(&data_dir).await?);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("logs") => {
            let count = args
                .get(1)
                .and_then(|n| n.parse::<usize>().ok())
                .unwrap_or(50);
            show_logs(&store, count).await?;
        }
        Some("reports") => show_reports(&store).await?,
        Some("stats") => show_stats(&store).await?,
        Some(other) => {
            eprintln!("Unknown command: {other}");
            eprintln!("Usage: comment-outreach [logs [N] | reports | stats]");
            std::process::exit(2);
        }
    }

    Ok(())
}

async fn show_logs(store: &JsonFileStore, count: usize) -> anyhow::Result<()> {
    let entries = store.load_activity().await?;
    if entries.is_empty() {
        println!("No activity log found yet. Run the engine first to generate logs.");
        return Ok(());
    }

    let shown = entries.len().min(count);
    println!("\nActivity Log (last {shown} of {} entries)\n", entries.len());
    println!("{}", "=".repeat(80));

    for entry in entries.iter().rev().take(count).rev() {
        let color = level_color(entry.level);
        println!(
            "{color}[{}] {}:{RESET} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.level,
            entry.message
        );
        if !entry.data.is_null() {
            println!(
                "{color}Data:{RESET} {}",
                serde_json::to_string_pretty(&entry.data)?
            );
        }
        println!("{}", "-".repeat(40));
    }
    Ok(())
}

async fn show_reports(store: &JsonFileStore) -> anyhow::Result<()> {
    let mut dates = store.list_report_dates().await?;
    if dates.is_empty() {
        println!("No daily reports found yet.");
        return Ok(());
    }
    dates.reverse();

    println!("\nDaily Reports ({} available, showing up to 7)\n", dates.len());
    println!("{}", "=".repeat(80));

    for date in dates.iter().take(7) {
        let Some(report) = store.load_report(date).await? else {
            continue;
        };
        println!("\n{}", report.date);
        println!("  Items processed:  {}", report.stats.total_items_processed);
        println!("  Comments checked: {}", report.stats.total_comments_checked);
        println!("  Responses posted: {}", report.stats.total_responses_posted);
        println!(
            "  Rate limits:      {}/{} daily, {}/{} hourly",
            report.quota.daily_used,
            report.quota.daily_limit,
            report.quota.hourly_used,
            report.quota.hourly_limit
        );
        println!("{}", "-".repeat(40));
    }
    Ok(())
}

async fn show_stats(store: &Arc<JsonFileStore>) -> anyhow::Result<()> {
    let config = BotConfig::from_env()?;
    let items = store.load_processed_items().await?;

    let dyn_store: Arc<dyn StateStore> = Arc::clone(store) as Arc<dyn StateStore>;
    let quota = QuotaController::new(dyn_store, &config)
        .check(Utc::now())
        .await?;
    let stats = overall_stats(&items, quota, &config);

    println!("\nOverall Statistics\n");
    println!("{}", "=".repeat(80));
    println!("  Items processed:    {}", stats.total_items_processed);
    println!("  Comments checked:   {}", stats.total_comments_checked);
    println!("  Responses posted:   {}", stats.total_responses_posted);
    println!("  Daily remaining:    {}", stats.daily_responses_remaining);
    println!("  Hourly remaining:   {}", stats.hourly_responses_remaining);
    if let Some(last) = stats.last_processed_item {
        println!(
            "  Last item:          {} ({}, {} replies)",
            last.title, last.item_id, last.responses_posted
        );
    }
    Ok(())
}
