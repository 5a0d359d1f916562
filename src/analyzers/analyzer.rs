//! Pipeline orchestration: raw records in, [`AnalysisBundle`] out.
//!
//! The engine is a pure function of the record collection and the config;
//! loading is the only fallible stage.

use std::collections::BTreeSet;

use anyhow::Result;
use tracing::{info, warn};

use crate::analyzers::aggregate::{self, Dimension};
use crate::analyzers::insights;
use crate::analyzers::types::{
    AnalysisBundle, BasicMetrics, ExpertRow, HourlyRow, RateRow, WindowReport, WindowRow,
};
use crate::analyzers::utility::{pct, round2};
use crate::analyzers::window;
use crate::config::AnalysisConfig;
use crate::event::{self, CoercionStats, Event};
use crate::loader::{self, RawRecord};

/// Loads a consultation CSV and runs the full analysis over it.
pub fn analyze_file(path: &str, config: &AnalysisConfig) -> Result<AnalysisBundle> {
    let records = loader::load_records(path)?;
    Ok(run_analysis(&records, config))
}

/// Normalizes the batch and builds every report table and insight.
pub fn run_analysis(records: &[RawRecord], config: &AnalysisConfig) -> AnalysisBundle {
    let (events, coercions) = event::normalize(records);
    log_data_quality(&coercions);

    let basic_metrics = basic_metrics(&events);
    info!(
        consultations = basic_metrics.total_consultations,
        conversions = basic_metrics.total_conversions,
        overall_rate = basic_metrics.overall_conversion_rate,
        "Dataset normalized"
    );

    let windowed = window_reports(&events, &config.window_days);
    let hourly = hourly_table(&events);
    let funnel_performance = rate_table(&events, Dimension::Funnel);
    let class_performance = rate_table(&events, Dimension::TargetClass);
    let expert_performance = expert_table(&events);

    let key_insights = insights::synthesize(
        &hourly,
        &class_performance,
        &funnel_performance,
        &basic_metrics,
        config.top_hours,
    );
    let recommendations = insights::recommend(&key_insights, config);

    AnalysisBundle {
        basic_metrics,
        data_quality: coercions,
        windowed,
        hourly,
        funnel_performance,
        class_performance,
        expert_performance,
        key_insights,
        recommendations,
    }
}

fn log_data_quality(coercions: &CoercionStats) {
    let unparseable = coercions.handled_at_unparseable
        + coercions.slot_start_at_unparseable
        + coercions.payment_at_unparseable;
    if unparseable > 0 || coercions.medical_flag_unrecognized > 0 {
        warn!(
            timestamps = unparseable,
            medical_flags = coercions.medical_flag_unrecognized,
            lead_type_undefined = coercions.lead_type_undefined,
            "Field coercion failures in source data"
        );
    }
}

fn basic_metrics(events: &[Event]) -> BasicMetrics {
    let total = events.len() as u64;
    let conversions = events.iter().filter(|e| e.converted).count() as u64;

    let distinct = |f: fn(&Event) -> Option<&String>| {
        events
            .iter()
            .filter_map(f)
            .collect::<BTreeSet<_>>()
            .len() as u64
    };

    BasicMetrics {
        total_consultations: total,
        total_conversions: conversions,
        overall_conversion_rate: round2(pct(conversions, total)),
        active_experts: distinct(|e| e.expert_id.as_ref()),
        unique_funnels: distinct(|e| e.funnel.as_ref()),
        unique_lead_types: distinct(|e| e.lead_type.as_ref()),
    }
}

/// One windowed (funnel, lead type) rate table per configured window
/// length, all sharing a single population pass.
fn window_reports(events: &[Event], window_days: &[i64]) -> Vec<WindowReport> {
    let dims = [Dimension::Funnel, Dimension::LeadType];
    let population = aggregate::aggregate(events, &dims);

    window_days
        .iter()
        .map(|&days| {
            let rows = window::merge_window(events, &dims, days, &population)
                .into_iter()
                .map(|(key, rate)| WindowRow {
                    funnel: aggregate::render_key_part(&key[0]),
                    lead_type: aggregate::render_key_part(&key[1]),
                    population: rate.population,
                    conversions_in_window: rate.conversions_in_window,
                    conversion_rate: rate.rate_percent,
                })
                .collect();
            WindowReport {
                window_days: days,
                rows,
            }
        })
        .collect()
}

/// Hourly table, defined hours ascending with the undefined-hour group
/// (if any) last.
fn hourly_table(events: &[Event]) -> Vec<HourlyRow> {
    let groups = aggregate::aggregate_by(events, |e| e.slot_hour);

    groups
        .iter()
        .filter(|(hour, _)| hour.is_some())
        .chain(groups.iter().filter(|(hour, _)| hour.is_none()))
        .map(|(hour, counts)| HourlyRow {
            hour: *hour,
            population: counts.population,
            conversions: counts.conversions,
            connected: counts.connected,
            conversion_rate: round2(pct(counts.conversions, counts.population)),
            connectivity_rate: round2(pct(counts.connected, counts.population)),
        })
        .collect()
}

/// Single-dimension rate table, sorted by rate descending then label.
fn rate_table(events: &[Event], dim: Dimension) -> Vec<RateRow> {
    let mut rows: Vec<RateRow> = aggregate::aggregate(events, &[dim])
        .into_iter()
        .map(|(key, counts)| RateRow {
            label: aggregate::render_key_part(&key[0]),
            population: counts.population,
            conversions: counts.conversions,
            conversion_rate: round2(pct(counts.conversions, counts.population)),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.conversion_rate
            .total_cmp(&a.conversion_rate)
            .then_with(|| a.label.cmp(&b.label))
    });
    rows
}

fn expert_table(events: &[Event]) -> Vec<ExpertRow> {
    aggregate::aggregate(events, &[Dimension::Expert, Dimension::TargetClass])
        .into_iter()
        .map(|(key, counts)| ExpertRow {
            expert_id: aggregate::render_key_part(&key[0]),
            target_class: aggregate::render_key_part(&key[1]),
            population: counts.population,
            conversions: counts.conversions,
            conversion_rate: round2(pct(counts.conversions, counts.population)),
        })
        .collect()
}
