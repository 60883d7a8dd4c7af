//! Session state: loaded datasets, saved reports and saved layouts

use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDateTime};
use serde::Serialize;
use sha2::{Digest, Sha256};
use shared_types::{DashboardLayout, Dataset};
use tokio::sync::RwLock;

pub const REPORT_PREFIX: &str = "REL";
pub const LAYOUT_PREFIX: &str = "Layout";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Custom,
    Management,
}

/// Report metadata as listed by the API
#[derive(Debug, Clone, Serialize)]
pub struct ReportInfo {
    pub id: String,
    pub title: String,
    pub kind: ReportKind,
    pub created_at: DateTime<Local>,
    pub size: usize,
    /// Hex SHA-256 of the stored bytes
    pub sha256: String,
}

pub struct SavedReport {
    pub info: ReportInfo,
    pub pdf: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SavedLayout {
    pub key: String,
    pub created_at: DateTime<Local>,
    pub layout: DashboardLayout,
}

#[derive(Default)]
pub struct Session {
    pub datasets: BTreeMap<String, Dataset>,
    pub reports: BTreeMap<String, SavedReport>,
    pub layouts: BTreeMap<String, SavedLayout>,
}

impl Session {
    /// Replaces any dataset with the same label
    pub fn insert_dataset(&mut self, dataset: Dataset) {
        self.datasets.insert(dataset.label.clone(), dataset);
    }

    pub fn save_report(
        &mut self,
        title: String,
        kind: ReportKind,
        pdf: Vec<u8>,
        now: DateTime<Local>,
    ) -> ReportInfo {
        let id = unique_key(REPORT_PREFIX, now.naive_local(), |k| {
            self.reports.contains_key(k)
        });
        let info = ReportInfo {
            id: id.clone(),
            title,
            kind,
            created_at: now,
            size: pdf.len(),
            sha256: hex::encode(Sha256::digest(&pdf)),
        };
        self.reports.insert(id, SavedReport { info: info.clone(), pdf });
        info
    }

    pub fn save_layout(&mut self, layout: DashboardLayout, now: DateTime<Local>) -> SavedLayout {
        let key = unique_key(LAYOUT_PREFIX, now.naive_local(), |k| {
            self.layouts.contains_key(k)
        });
        let saved = SavedLayout {
            key: key.clone(),
            created_at: now,
            layout,
        };
        self.layouts.insert(key, saved.clone());
        saved
    }
}

/// Shared application state
#[derive(Default)]
pub struct AppState {
    pub session: RwLock<Session>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// `<prefix>_YYYYMMDD_HHMMSS`, with `_2`, `_3`, ... appended while taken
pub fn unique_key(prefix: &str, now: NaiveDateTime, taken: impl Fn(&str) -> bool) -> String {
    let base = format!("{}_{}", prefix, now.format("%Y%m%d_%H%M%S"));
    if !taken(&base) {
        return base;
    }
    (2u32..)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or(base)
}
