//! Output formatting and persistence for analysis results.
//!
//! Supports pretty JSON export, CSV export of windowed rate tables, and a
//! short plain-text summary report.

use anyhow::Result;
use csv::WriterBuilder;
use std::fs;
use tracing::info;

use crate::analyzers::types::{AnalysisBundle, WindowReport};

/// Writes the full bundle as pretty-printed JSON.
pub fn write_json(path: &str, bundle: &AnalysisBundle) -> Result<()> {
    let json = serde_json::to_string_pretty(bundle)?;
    fs::write(path, json)?;
    info!(path, "Analysis results written");
    Ok(())
}

/// Logs the bundle as pretty-printed JSON.
pub fn print_json(bundle: &AnalysisBundle) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(bundle)?);
    Ok(())
}

/// Writes one windowed rate table as CSV, one row per segment.
pub fn write_window_csv(path: &str, report: &WindowReport) -> Result<()> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    for row in &report.rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(path, window_days = report.window_days, rows = report.rows.len(), "Rate table written");
    Ok(())
}

/// Renders the short text report. Insights whose input tables were empty
/// show as "N/A".
pub fn summary_report(bundle: &AnalysisBundle) -> String {
    let basic = &bundle.basic_metrics;
    let insights = &bundle.key_insights;

    let best_funnel = insights
        .funnel_performance
        .as_ref()
        .map(|f| format!("{} ({:.1}%)", f.best, f.best_rate))
        .unwrap_or_else(|| "N/A".to_string());

    let peak_hours = insights
        .timing
        .as_ref()
        .map(|t| {
            t.peak_hours
                .iter()
                .map(|h| format!("{h:02}:00"))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_else(|| "N/A".to_string());

    let top_class = insights
        .class_performance
        .as_ref()
        .map(|c| format!("{} ({:.1}%)", c.best, c.best_rate))
        .unwrap_or_else(|| "N/A".to_string());

    let improvement = bundle
        .recommendations
        .potential_impact
        .as_ref()
        .map(|p| format!("+{:.1} points", p.improvement_points))
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        "Consultation Funnel Report\n\
         Total: {} consultations\n\
         Conversion: {:.1}%\n\
         Best Funnel: {}\n\
         Peak Hours: {}\n\
         Top Class: {}\n\
         Potential Improvement: {}",
        basic.total_consultations,
        basic.overall_conversion_rate,
        best_funnel,
        peak_hours,
        top_class,
        improvement,
    )
}
