//! In-memory sources and destination for cycle tests.

#![allow(dead_code)]

use kiosk_sync::config::SourceConfig;
use kiosk_sync::error::{ExtractError, LoadError};
use kiosk_sync::models::{ScanPayload, ScanRecord, SourceScanRow};
use kiosk_sync::sync::{Destination, RowWriter};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn row(id: i64, scan_code: &str) -> SourceScanRow {
    SourceScanRow::new(
        id,
        ScanPayload {
            scan_code: Some(scan_code.to_string()),
            scan_type: Some("barcode".to_string()),
            location_id: Some(3),
            sample_dispensed: Some(true),
            ..Default::default()
        },
    )
}

/// Rows tagged with the kiosk that owns them, so stamping mistakes are visible.
pub fn rows_for(kiosk_id: &str, ids: &[i64]) -> Vec<SourceScanRow> {
    ids.iter()
        .map(|id| row(*id, &format!("{}-{}", kiosk_id, id)))
        .collect()
}

pub fn config(kiosk_id: &str) -> SourceConfig {
    SourceConfig::new("kiosk.internal", 5432, &format!("freeosk_{}", kiosk_id), kiosk_id)
        .with_auth("sync", "secret")
}

#[derive(Clone)]
pub enum Behavior {
    Rows(Vec<SourceScanRow>),
    Refuse,
    Hang(Duration),
    SlowRows(Duration, Vec<SourceScanRow>),
    Panic,
}

/// Sources keyed by kiosk id.
#[derive(Default)]
pub struct FakeSource {
    behaviors: HashMap<String, Behavior>,
    page_sizes: Mutex<Vec<i64>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kiosk_id: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(kiosk_id.to_string(), behavior);
        self
    }

    fn serve(rows: &[SourceScanRow], page_size: i64) -> Vec<SourceScanRow> {
        let mut rows = rows.to_vec();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        rows.into_iter()
            .filter(|row| row.id > 1)
            .take(page_size as usize)
            .collect()
    }
}

impl kiosk_sync::sync::ScanSource for FakeSource {
    async fn fetch_latest(
        &self,
        config: &SourceConfig,
        page_size: i64,
    ) -> Result<Vec<SourceScanRow>, ExtractError> {
        self.page_sizes.lock().unwrap().push(page_size);
        let behavior = self.behaviors.get(&config.kiosk_id).cloned();

        match behavior {
            Some(Behavior::Rows(rows)) => Ok(Self::serve(&rows, page_size)),
            Some(Behavior::SlowRows(delay, rows)) => {
                tokio::time::sleep(delay).await;
                Ok(Self::serve(&rows, page_size))
            }
            Some(Behavior::Hang(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(Vec::new())
            }
            Some(Behavior::Panic) => panic!("driver crashed for {}", config.kiosk_id),
            Some(Behavior::Refuse) | None => Err(ExtractError::Connect(sqlx::Error::Io(
                io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
            ))),
        }
    }
}

#[derive(Default)]
struct Store {
    rows: BTreeMap<(i64, String), ScanRecord>,
    rejected: HashSet<(i64, String)>,
    over_reported: HashSet<(i64, String)>,
    fail_prepare: bool,
}

/// Destination enforcing `(id, kiosk_id)` uniqueness with insert-or-ignore semantics.
#[derive(Clone, Default)]
pub struct FakeDestination {
    store: Arc<Mutex<Store>>,
    prepares: Arc<AtomicUsize>,
}

impl FakeDestination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make inserts of this key fail with a driver error.
    pub fn reject(&self, id: i64, kiosk_id: &str) {
        self.store
            .lock()
            .unwrap()
            .rejected
            .insert((id, kiosk_id.to_string()));
    }

    pub fn accept_all(&self) {
        self.store.lock().unwrap().rejected.clear();
    }

    /// Make the driver report two affected rows for this key while still storing it.
    pub fn over_report(&self, id: i64, kiosk_id: &str) {
        self.store
            .lock()
            .unwrap()
            .over_reported
            .insert((id, kiosk_id.to_string()));
    }

    pub fn fail_prepare(&self, fail: bool) {
        self.store.lock().unwrap().fail_prepare = fail;
    }

    pub fn prepares(&self) -> usize {
        self.prepares.load(Ordering::SeqCst)
    }

    pub fn keys(&self) -> Vec<(i64, String)> {
        self.store.lock().unwrap().rows.keys().cloned().collect()
    }

    pub fn records(&self) -> Vec<ScanRecord> {
        self.store.lock().unwrap().rows.values().cloned().collect()
    }
}

impl Destination for FakeDestination {
    type Writer = FakeWriter;

    async fn prepare(&self) -> Result<FakeWriter, LoadError> {
        self.prepares.fetch_add(1, Ordering::SeqCst);
        if self.store.lock().unwrap().fail_prepare {
            return Err(LoadError::Prepare(sqlx::Error::Protocol(
                "relation \"ods_scan_data\" does not exist".to_string(),
            )));
        }

        Ok(FakeWriter {
            store: Arc::clone(&self.store),
        })
    }
}

pub struct FakeWriter {
    store: Arc<Mutex<Store>>,
}

impl RowWriter for FakeWriter {
    async fn insert_ignore(&mut self, record: &ScanRecord) -> Result<u64, sqlx::Error> {
        let mut store = self.store.lock().unwrap();
        let key = (record.id, record.kiosk_id.clone());

        if store.rejected.contains(&key) {
            return Err(sqlx::Error::Protocol("value too long for column".to_string()));
        }
        if store.rows.contains_key(&key) {
            return Ok(0);
        }

        let over_reported = store.over_reported.contains(&key);
        store.rows.insert(key, record.clone());
        Ok(if over_reported { 2 } else { 1 })
    }
}
