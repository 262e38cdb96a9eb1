//! Persistence layer — JSON-document slots behind the `StateStore` seam.

pub mod json_store;
pub mod records;

pub use json_store::{JsonFileStore, StateStore};
pub use records::{
    ActivityEntry, ActivityLevel, CooldownMap, DailyReport, OverallStats, ProcessedItemRecord,
    QuotaCounters, QuotaSnapshot, QuotaWindow,
};
