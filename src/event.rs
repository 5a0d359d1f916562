//! Normalization of raw consultation rows into [`Event`] values.
//!
//! Parsing fails soft: an unparseable timestamp or flag becomes "no value"
//! for that field and is tallied in [`CoercionStats`], never aborting the
//! batch.

use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;
use tracing::debug;

use crate::loader::RawRecord;

/// Timestamp layouts accepted from the source, tried in order.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d-%m-%Y %H:%M",
];

/// Canonical token marking a confirmed slot in the source data.
const BOOKED_TOKEN: &str = "Booked";

/// Separator used to build the composite lead-type key.
const LEAD_TYPE_SEP: char = '_';

/// A normalized consultation event. Derived fields are computed once here
/// and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    pub id: String,
    pub handled_at: Option<NaiveDateTime>,
    pub slot_start_at: Option<NaiveDateTime>,
    pub payment_at: Option<NaiveDateTime>,

    // segment dimensions
    pub funnel: Option<String>,
    pub lead_type: Option<String>,
    pub expert_id: Option<String>,
    pub target_class: Option<String>,

    // derived flags
    pub booked: bool,
    pub converted: bool,
    pub connected: bool,
    pub slot_hour: Option<u32>,
    pub elapsed_days: Option<i64>,
}

/// Per-field counts of values that were present but could not be coerced.
///
/// Surfaced in the output bundle for data-quality visibility; a nonzero
/// count is a data problem upstream, not a processing error.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CoercionStats {
    pub handled_at_unparseable: u64,
    pub slot_start_at_unparseable: u64,
    pub payment_at_unparseable: u64,
    pub medical_flag_unrecognized: u64,
    pub lead_type_undefined: u64,
}

impl Event {
    /// Normalizes one raw row. Pure over the record; the only side effect
    /// is tallying coercion failures into `stats`.
    pub fn from_raw(raw: &RawRecord, stats: &mut CoercionStats) -> Self {
        let handled_at = coerce_timestamp(
            raw.handled_time.as_deref(),
            &mut stats.handled_at_unparseable,
        );
        let slot_start_at = coerce_timestamp(
            raw.slot_start_time.as_deref(),
            &mut stats.slot_start_at_unparseable,
        );
        let payment_at = coerce_timestamp(
            raw.payment_time.as_deref(),
            &mut stats.payment_at_unparseable,
        );

        let booked = raw.booked_flag.as_deref() == Some(BOOKED_TOKEN);

        let lead_type = lead_type(
            raw.india_vs_nri.as_deref(),
            raw.medical_condition_flag.as_deref(),
            stats,
        );
        if lead_type.is_none() {
            stats.lead_type_undefined += 1;
        }

        Event {
            id: raw.user_id.clone().unwrap_or_default(),
            handled_at,
            slot_start_at,
            payment_at,
            funnel: non_empty(raw.funnel.as_deref()),
            lead_type,
            expert_id: non_empty(raw.expert_id.as_deref()),
            target_class: non_empty(raw.target_class.as_deref()),
            booked,
            converted: payment_at.is_some(),
            connected: booked,
            slot_hour: slot_start_at.map(|t| t.hour()),
            elapsed_days: elapsed_days(slot_start_at, payment_at),
        }
    }
}

/// Normalizes a whole batch, preserving order and cardinality.
pub fn normalize(records: &[RawRecord]) -> (Vec<Event>, CoercionStats) {
    let mut stats = CoercionStats::default();
    let events = records
        .iter()
        .map(|r| Event::from_raw(r, &mut stats))
        .collect();
    (events, stats)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Some(v.to_string()),
        _ => None,
    }
}

/// Parses a timestamp field, counting values that are present but
/// unreadable. Empty cells are plain absence, not a coercion failure.
fn coerce_timestamp(value: Option<&str>, failures: &mut u64) -> Option<NaiveDateTime> {
    let raw = value?.trim();
    if raw.is_empty() {
        return None;
    }
    match parse_timestamp(raw) {
        Some(t) => Some(t),
        None => {
            *failures += 1;
            debug!(value = raw, "Unparseable timestamp, treating as absent");
            None
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    for format in TIMESTAMP_FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(t);
        }
    }
    // Date-only cells resolve to midnight.
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Whole days between slot start and payment, floored. A payment a few
/// hours before the slot lands on day -1, keeping it out of every window.
fn elapsed_days(
    slot_start_at: Option<NaiveDateTime>,
    payment_at: Option<NaiveDateTime>,
) -> Option<i64> {
    let slot = slot_start_at?;
    let payment = payment_at?;
    Some((payment - slot).num_seconds().div_euclid(86_400))
}

/// Builds the composite lead-type key. Defined only when both the region
/// field and the medical flag are present and the flag is one of the four
/// accepted surface forms.
fn lead_type(
    region: Option<&str>,
    medical_flag: Option<&str>,
    stats: &mut CoercionStats,
) -> Option<String> {
    let region = non_empty(region)?;
    let flag = non_empty(medical_flag)?;

    let medical = match flag.as_str() {
        "True" | "Yes" => "Medical",
        "False" | "No" => "NonMedical",
        other => {
            stats.medical_flag_unrecognized += 1;
            debug!(value = other, "Unrecognized medical flag");
            return None;
        }
    };

    Some(format!("{}{}{}", region, LEAD_TYPE_SEP, medical))
}
