//! CLI command implementations and shared input loading

pub mod analyze;
pub mod batch;
pub mod forecast;

use anyhow::{Context, Result};
use risk_lib::{Record, VendorMetrics};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// Accepted history file layouts
#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryFile {
    /// Bare array of records
    Records(Vec<Record>),
    /// Records with optional vendor id and current metrics
    Vendor {
        #[serde(default)]
        vendor_id: Option<Value>,
        records: Vec<Record>,
        #[serde(default)]
        current: Option<VendorMetrics>,
    },
}

/// One vendor's history as read from disk
#[derive(Debug)]
pub struct VendorHistory {
    pub label: String,
    pub records: Vec<Record>,
    pub current: Option<VendorMetrics>,
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load a history file; the label falls back to the file stem
pub fn load_history(path: &Path) -> Result<VendorHistory> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(match read_json::<HistoryFile>(path)? {
        HistoryFile::Records(records) => VendorHistory {
            label: stem,
            records,
            current: None,
        },
        HistoryFile::Vendor {
            vendor_id,
            records,
            current,
        } => VendorHistory {
            label: match vendor_id {
                Some(Value::String(id)) => id,
                Some(other) => other.to_string(),
                None => stem,
            },
            records,
            current,
        },
    })
}

/// Load explicit current metrics
pub fn load_current(path: &Path) -> Result<VendorMetrics> {
    read_json(path)
}
