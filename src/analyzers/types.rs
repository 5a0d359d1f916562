//! Result bundle types produced by the analysis pipeline.
//!
//! Everything here is a Serialize-only value record. Collections are
//! pre-sorted so that serializing the same input twice yields byte-identical
//! JSON.

use serde::Serialize;

use crate::event::CoercionStats;

/// Headline counts over the whole dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasicMetrics {
    pub total_consultations: u64,
    pub total_conversions: u64,
    pub overall_conversion_rate: f64,
    pub active_experts: u64,
    pub unique_funnels: u64,
    pub unique_lead_types: u64,
}

/// One row of a single-dimension rate table (funnel or target class).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateRow {
    pub label: String,
    pub population: u64,
    pub conversions: u64,
    pub conversion_rate: f64,
}

/// One (funnel, lead type) segment of a windowed rate table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowRow {
    pub funnel: String,
    pub lead_type: String,
    pub population: u64,
    pub conversions_in_window: u64,
    pub conversion_rate: f64,
}

/// Windowed rate table for one configured window length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowReport {
    pub window_days: i64,
    pub rows: Vec<WindowRow>,
}

/// Hourly performance row. `hour` is absent for records without a parseable
/// slot-start timestamp; they still form a row of their own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyRow {
    pub hour: Option<u32>,
    pub population: u64,
    pub conversions: u64,
    pub connected: u64,
    pub conversion_rate: f64,
    pub connectivity_rate: f64,
}

/// Per (expert, target class) performance row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpertRow {
    pub expert_id: String,
    pub target_class: String,
    pub population: u64,
    pub conversions: u64,
    pub conversion_rate: f64,
}

/// Best/worst timing insight. Ties on rate resolve to the lowest hour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingInsight {
    pub best_hour: u32,
    pub best_hour_rate: f64,
    pub worst_hour: u32,
    pub worst_hour_rate: f64,
    pub peak_hours: Vec<u32>,
}

/// Best/worst spread across one categorical dimension. `gap` is in
/// percentage points, not a ratio.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapInsight {
    pub best: String,
    pub best_rate: f64,
    pub worst: String,
    pub worst_rate: f64,
    pub gap: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallInsight {
    pub total_consultations: u64,
    pub overall_conversion_rate: f64,
}

/// Synthesized insights. Any section whose input table was empty is `None`
/// and rendered as "N/A" downstream, never an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyInsights {
    pub timing: Option<TimingInsight>,
    pub class_performance: Option<GapInsight>,
    pub funnel_performance: Option<GapInsight>,
    pub overall: OverallInsight,
}

/// Heuristic projection of achievable improvement. The blended gap
/// weighting is business policy (see [`crate::config::AnalysisConfig`]),
/// not a statistical estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PotentialImpact {
    pub current_conversion_rate: f64,
    pub potential_conversion_rate: f64,
    pub improvement_points: f64,
    pub additional_monthly_conversions: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendations {
    pub immediate: Vec<String>,
    pub short_term: Vec<String>,
    pub potential_impact: Option<PotentialImpact>,
}

/// Complete analysis result for one dataset, exported as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisBundle {
    pub basic_metrics: BasicMetrics,
    pub data_quality: CoercionStats,
    pub windowed: Vec<WindowReport>,
    pub hourly: Vec<HourlyRow>,
    pub funnel_performance: Vec<RateRow>,
    pub class_performance: Vec<RateRow>,
    pub expert_performance: Vec<ExpertRow>,
    pub key_insights: KeyInsights,
    pub recommendations: Recommendations,
}
