use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ===== Scan Event Models =====

/// Payload columns shared by source rows and destination records.
///
/// The synchronizer never interprets these; they are copied through as read.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, FromRow)]
pub struct ScanPayload {
    pub program_scan_code: Option<String>,
    pub scan_code: Option<String>,
    pub scan_time: Option<DateTime<Utc>>,
    pub encrypted_scan_code: Option<String>,
    pub placement_code: Option<String>,
    pub choice_selected: Option<String>,
    pub sample_dispensed: Option<bool>,
    pub scan_type: Option<String>,
    pub location_id: Option<i32>,
    pub position_id: Option<i32>,
    pub scan_mode_id: Option<i32>,
    pub optin_selected: Option<bool>,
}

/// A row as a source returns it. Sources do not carry their own kiosk identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SourceScanRow {
    pub id: i64,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub payload: ScanPayload,
}

impl SourceScanRow {
    pub fn new(id: i64, payload: ScanPayload) -> Self {
        Self { id, payload }
    }

    /// Attach the configured kiosk identifier, producing a loadable record.
    pub fn stamp(self, kiosk_id: &str) -> ScanRecord {
        ScanRecord {
            id: self.id,
            kiosk_id: kiosk_id.to_string(),
            payload: self.payload,
        }
    }
}

/// One scan event keyed by `(id, kiosk_id)` in the destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ScanRecord {
    pub id: i64,
    pub kiosk_id: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub payload: ScanPayload,
}

impl ScanRecord {
    pub fn key(&self) -> (i64, &str) {
        (self.id, self.kiosk_id.as_str())
    }
}

/// Records extracted from one source in one cycle, in the source's result order.
pub type Batch = Vec<ScanRecord>;
