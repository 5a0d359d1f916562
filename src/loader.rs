//! CSV ingestion for consultation exports.
//!
//! The load boundary is the only fatal error surface: an unreadable source
//! or a header row missing required columns aborts the run. Everything
//! below the header check fails soft per field (see [`crate::event`]).

use serde::Deserialize;
use std::fs::File;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Columns the source must carry. Order in the file does not matter.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "user_id",
    "handled_time",
    "slot_start_time",
    "payment_time",
    "booked_flag",
    "funnel",
    "India vs NRI",
    "medicalconditionflag",
    "expert_id",
    "target_class",
];

/// Load failures, distinguishable by the caller.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source could not be opened or read at all.
    #[error("source unreadable: {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// The source was readable but its header row lacks required columns.
    #[error("schema mismatch: missing columns {missing:?}")]
    SchemaMismatch { missing: Vec<String> },
    /// A row could not be read at the CSV layer (malformed quoting etc).
    #[error("malformed row {row}: {source}")]
    MalformedRow {
        row: u64,
        #[source]
        source: csv::Error,
    },
}

/// One row as it appears in the source. Every cell is optional; field-level
/// coercion happens later in the normalizer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    pub user_id: Option<String>,
    pub handled_time: Option<String>,
    pub slot_start_time: Option<String>,
    pub payment_time: Option<String>,
    pub booked_flag: Option<String>,
    pub funnel: Option<String>,
    #[serde(rename = "India vs NRI")]
    pub india_vs_nri: Option<String>,
    #[serde(rename = "medicalconditionflag")]
    pub medical_condition_flag: Option<String>,
    pub expert_id: Option<String>,
    pub target_class: Option<String>,
}

/// Loads and deserializes every row of a consultation CSV.
pub fn load_records(path: &str) -> Result<Vec<RawRecord>, LoadError> {
    let file = File::open(Path::new(path)).map_err(|source| LoadError::Unreadable {
        path: path.to_string(),
        source,
    })?;

    let mut rdr = csv::Reader::from_reader(file);
    validate_headers(&mut rdr)?;

    let mut records = Vec::new();
    for (i, result) in rdr.deserialize().enumerate() {
        let record: RawRecord = result.map_err(|source| LoadError::MalformedRow {
            row: i as u64 + 2, // 1-based, after the header row
            source,
        })?;
        records.push(record);
    }

    info!(path, rows = records.len(), "Source loaded");
    Ok(records)
}

fn validate_headers(rdr: &mut csv::Reader<File>) -> Result<(), LoadError> {
    let headers = rdr
        .headers()
        .map_err(|source| LoadError::MalformedRow { row: 1, source })?;

    let present: Vec<&str> = headers.iter().collect();
    debug!(?present, "Header row");

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !present.contains(*c))
        .map(|c| c.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(LoadError::SchemaMismatch { missing })
    }
}
