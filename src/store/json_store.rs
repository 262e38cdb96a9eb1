//! JSON-file-backed state store.
//!
//! One pretty-printed JSON document per slot, whole-document replacement
//! on every save. Saves go through a temp file + rename so a crash leaves
//! either the old document or the new one, never a torn write. A missing
//! slot file yields the slot's default shape; an unreadable or corrupt
//! file is a hard error (the caller cannot safely default-initialize over
//! real history).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::StoreError;
use crate::store::records::{
    ActivityEntry, CooldownMap, DailyReport, ProcessedItemRecord, QuotaCounters, QuotaWindow,
};

/// Durable state owned exclusively by the engine.
///
/// One typed method pair per logical slot. Writes are synchronous with
/// the unit of work that produced them; there are no cross-slot
/// transactions because each slot is updated by at most one orchestrator
/// step per comment/item.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// All content items ever processed.
    async fn load_processed_items(&self) -> Result<Vec<ProcessedItemRecord>, StoreError>;
    async fn save_processed_items(
        &self,
        items: &[ProcessedItemRecord],
    ) -> Result<(), StoreError>;

    /// Author id → last-replied-at map.
    async fn load_cooldowns(&self) -> Result<CooldownMap, StoreError>;
    async fn save_cooldowns(&self, cooldowns: &CooldownMap) -> Result<(), StoreError>;

    /// Reply counters for one quota window.
    async fn load_counters(&self, window: QuotaWindow) -> Result<QuotaCounters, StoreError>;
    async fn save_counters(
        &self,
        window: QuotaWindow,
        counters: &QuotaCounters,
    ) -> Result<(), StoreError>;

    /// The capped activity log.
    async fn load_activity(&self) -> Result<Vec<ActivityEntry>, StoreError>;
    async fn save_activity(&self, entries: &[ActivityEntry]) -> Result<(), StoreError>;

    /// Dated report snapshots.
    async fn save_report(&self, report: &DailyReport) -> Result<(), StoreError>;
    async fn load_report(&self, date: &str) -> Result<Option<DailyReport>, StoreError>;
    /// Dates (`YYYY-MM-DD`) for which a report snapshot exists.
    async fn list_report_dates(&self) -> Result<Vec<String>, StoreError>;
}

const PROCESSED_ITEMS: &str = "processed_items";
const RESPONDED_USERS: &str = "responded_users";
const DAILY_RESPONSES: &str = "daily_responses";
const HOURLY_RESPONSES: &str = "hourly_responses";
const ACTIVITY_LOG: &str = "activity_log";
const REPORT_PREFIX: &str = "daily_report_";

/// File-per-slot store rooted at a data directory.
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    /// Open (and create if needed) a store at `data_dir`.
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .map_err(|e| StoreError::Io {
                slot: data_dir.display().to_string(),
                source: e,
            })?;
        Ok(Self { data_dir })
    }

    /// Directory this store persists into.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.data_dir.join(format!("{slot}.json"))
    }

    async fn load_doc<T: DeserializeOwned + Default>(&self, slot: &str) -> Result<T, StoreError> {
        let path = self.slot_path(slot);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(slot, "Slot file missing, using default shape");
                return Ok(T::default());
            }
            Err(e) => {
                return Err(StoreError::Io {
                    slot: slot.to_string(),
                    source: e,
                });
            }
        };
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
            slot: slot.to_string(),
            source: e,
        })
    }

    async fn save_doc<T: Serialize>(&self, slot: &str, value: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(value).map_err(|e| StoreError::Serialization {
            slot: slot.to_string(),
            source: e,
        })?;

        let path = self.slot_path(slot);
        let tmp = self.data_dir.join(format!("{slot}.json.tmp"));
        let io_err = |e| StoreError::Io {
            slot: slot.to_string(),
            source: e,
        };

        tokio::fs::write(&tmp, &bytes).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &path).await.map_err(io_err)?;
        debug!(slot, bytes = bytes.len(), "Saved slot");
        Ok(())
    }

    fn counter_slot(window: QuotaWindow) -> &'static str {
        match window {
            QuotaWindow::Daily => DAILY_RESPONSES,
            QuotaWindow::Hourly => HOURLY_RESPONSES,
        }
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn load_processed_items(&self) -> Result<Vec<ProcessedItemRecord>, StoreError> {
        self.load_doc(PROCESSED_ITEMS).await
    }

    async fn save_processed_items(
        &self,
        items: &[ProcessedItemRecord],
    ) -> Result<(), StoreError> {
        self.save_doc(PROCESSED_ITEMS, &items).await
    }

    async fn load_cooldowns(&self) -> Result<CooldownMap, StoreError> {
        self.load_doc(RESPONDED_USERS).await
    }

    async fn save_cooldowns(&self, cooldowns: &CooldownMap) -> Result<(), StoreError> {
        self.save_doc(RESPONDED_USERS, cooldowns).await
    }

    async fn load_counters(&self, window: QuotaWindow) -> Result<QuotaCounters, StoreError> {
        self.load_doc(Self::counter_slot(window)).await
    }

    async fn save_counters(
        &self,
        window: QuotaWindow,
        counters: &QuotaCounters,
    ) -> Result<(), StoreError> {
        self.save_doc(Self::counter_slot(window), counters).await
    }

    async fn load_activity(&self) -> Result<Vec<ActivityEntry>, StoreError> {
        self.load_doc(ACTIVITY_LOG).await
    }

    async fn save_activity(&self, entries: &[ActivityEntry]) -> Result<(), StoreError> {
        self.save_doc(ACTIVITY_LOG, &entries).await
    }

    async fn save_report(&self, report: &DailyReport) -> Result<(), StoreError> {
        self.save_doc(&format!("{REPORT_PREFIX}{}", report.date), report)
            .await
    }

    async fn load_report(&self, date: &str) -> Result<Option<DailyReport>, StoreError> {
        let slot = format!("{REPORT_PREFIX}{date}");
        let path = self.slot_path(&slot);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }
        let report: DailyReport = {
            let bytes = tokio::fs::read(&path).await.map_err(|e| StoreError::Io {
                slot: slot.clone(),
                source: e,
            })?;
            serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
                slot: slot.clone(),
                source: e,
            })?
        };
        Ok(Some(report))
    }

    async fn list_report_dates(&self) -> Result<Vec<String>, StoreError> {
        let mut dates = Vec::new();
        let mut entries =
            tokio::fs::read_dir(&self.data_dir)
                .await
                .map_err(|e| StoreError::Io {
                    slot: self.data_dir.display().to_string(),
                    source: e,
                })?;
        while let Some(entry) = entries.next_entry().await.map_err(|e| StoreError::Io {
            slot: self.data_dir.display().to_string(),
            source: e,
        })? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(rest) = name.strip_prefix(REPORT_PREFIX) {
                if let Some(date) = rest.strip_suffix(".json") {
                    dates.push(date.to_string());
                }
            }
        }
        dates.sort();
        Ok(dates)
    }
}
