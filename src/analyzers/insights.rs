//! Insight synthesis over the computed rate tables.
//!
//! Selectors return `None` when the backing table is empty; reporting
//! renders that as "N/A" instead of failing the run.

use std::cmp::Ordering;

use tracing::debug;

use crate::analyzers::types::{
    BasicMetrics, GapInsight, HourlyRow, KeyInsights, OverallInsight, PotentialImpact, RateRow,
    Recommendations, TimingInsight,
};
use crate::analyzers::utility::round2;
use crate::config::AnalysisConfig;

/// Derives the timing, class, and funnel insights from their rate tables.
pub fn synthesize(
    hourly: &[HourlyRow],
    class_table: &[RateRow],
    funnel_table: &[RateRow],
    basic: &BasicMetrics,
    top_hours: usize,
) -> KeyInsights {
    KeyInsights {
        timing: timing_insight(hourly, top_hours),
        class_performance: gap_insight(class_table),
        funnel_performance: gap_insight(funnel_table),
        overall: OverallInsight {
            total_consultations: basic.total_consultations,
            overall_conversion_rate: basic.overall_conversion_rate,
        },
    }
}

/// Best/worst/top-N hours by conversion rate. Rows without a defined hour
/// are not hours and take no part in the ranking.
fn timing_insight(hourly: &[HourlyRow], top_hours: usize) -> Option<TimingInsight> {
    let mut ranked: Vec<(u32, f64)> = hourly
        .iter()
        .filter_map(|row| row.hour.map(|h| (h, row.conversion_rate)))
        .collect();
    if ranked.is_empty() {
        debug!("No hourly rows with a defined hour, skipping timing insight");
        return None;
    }

    // Rate descending, then hour ascending so ties resolve deterministically.
    ranked.sort_by(|a, b| rank_desc(a.1, b.1).then(a.0.cmp(&b.0)));

    let (best_hour, best_hour_rate) = ranked[0];
    let (worst_hour, worst_hour_rate) = ranked
        .iter()
        .copied()
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))?;
    let peak_hours = ranked.iter().take(top_hours).map(|(h, _)| *h).collect();

    Some(TimingInsight {
        best_hour,
        best_hour_rate,
        worst_hour,
        worst_hour_rate,
        peak_hours,
    })
}

/// Best and worst class of a single-dimension rate table, with the spread
/// in percentage points. Ties resolve to the lexicographically smallest
/// label.
fn gap_insight(table: &[RateRow]) -> Option<GapInsight> {
    let best = table
        .iter()
        .min_by(|a, b| rank_desc(a.conversion_rate, b.conversion_rate).then(a.label.cmp(&b.label)))?;
    let worst = table
        .iter()
        .min_by(|a, b| a.conversion_rate.total_cmp(&b.conversion_rate).then(a.label.cmp(&b.label)))?;

    Some(GapInsight {
        best: best.label.clone(),
        best_rate: best.conversion_rate,
        worst: worst.label.clone(),
        worst_rate: worst.conversion_rate,
        gap: round2(best.conversion_rate - worst.conversion_rate),
    })
}

fn rank_desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// Derives recommendations and the blended potential-improvement
/// projection from the insights.
///
/// The projection adds `class_gap_weight x class gap +
/// funnel_gap_weight x funnel gap` to the current overall rate, then
/// scales the dataset volume by the monthly multiplier. It is a heuristic
/// business projection, not a statistical estimate.
pub fn recommend(insights: &KeyInsights, config: &AnalysisConfig) -> Recommendations {
    let mut immediate = Vec::new();
    let mut short_term = Vec::new();

    if let Some(timing) = &insights.timing {
        let hours = timing
            .peak_hours
            .iter()
            .map(|h| format!("{h:02}:00"))
            .collect::<Vec<_>>()
            .join(", ");
        immediate.push(format!("Focus 70% of slots during peak hours: {hours}"));
    }
    if let Some(class) = &insights.class_performance {
        immediate.push(format!(
            "Prioritize class {} experts for high-value leads",
            class.best
        ));
        short_term.push(format!(
            "Train lower-tier experts using class {} best practices",
            class.best
        ));
    }
    if let Some(funnel) = &insights.funnel_performance {
        immediate.push(format!("Scale {} funnel marketing budget", funnel.best));
        short_term.push(format!(
            "Optimize {} funnel conversion process",
            funnel.worst
        ));
    }

    let potential_impact = match (&insights.class_performance, &insights.funnel_performance) {
        (Some(class), Some(funnel)) => {
            let current = insights.overall.overall_conversion_rate;
            let improvement = round2(
                config.class_gap_weight * class.gap + config.funnel_gap_weight * funnel.gap,
            );
            let potential = round2(current + improvement);

            let monthly_consultations =
                insights.overall.total_consultations as f64 * config.monthly_multiplier;
            let additional = ((potential - current) / 100.0 * monthly_consultations) as i64;

            Some(PotentialImpact {
                current_conversion_rate: round2(current),
                potential_conversion_rate: potential,
                improvement_points: improvement,
                additional_monthly_conversions: additional,
            })
        }
        _ => None,
    };

    Recommendations {
        immediate,
        short_term,
        potential_impact,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hourly_row(hour: Option<u32>, rate: f64) -> HourlyRow {
        HourlyRow {
            hour,
            population: 10,
            conversions: 0,
            connected: 0,
            conversion_rate: rate,
            connectivity_rate: 0.0,
        }
    }

    fn rate_row(label: &str, rate: f64) -> RateRow {
        RateRow {
            label: label.to_string(),
            population: 10,
            conversions: 0,
            conversion_rate: rate,
        }
    }

    fn basic(total: u64, rate: f64) -> BasicMetrics {
        BasicMetrics {
            total_consultations: total,
            total_conversions: 0,
            overall_conversion_rate: rate,
            active_experts: 0,
            unique_funnels: 0,
            unique_lead_types: 0,
        }
    }

    #[test]
    fn test_timing_tie_breaks_to_lowest_hour() {
        let hourly = vec![
            hourly_row(Some(15), 40.0),
            hourly_row(Some(9), 40.0),
            hourly_row(Some(11), 10.0),
            hourly_row(Some(4), 10.0),
        ];

        let timing = timing_insight(&hourly, 3).unwrap();
        assert_eq!(timing.best_hour, 9);
        assert_eq!(timing.worst_hour, 4);
        assert_eq!(timing.peak_hours, vec![9, 15, 4]);
    }

    #[test]
    fn test_timing_ignores_undefined_hour_row() {
        let hourly = vec![hourly_row(None, 90.0), hourly_row(Some(10), 20.0)];

        let timing = timing_insight(&hourly, 3).unwrap();
        assert_eq!(timing.best_hour, 10);
        assert_eq!(timing.peak_hours, vec![10]);
    }

    #[test]
    fn test_empty_tables_yield_no_insight() {
        let insights = synthesize(&[], &[], &[], &basic(0, 0.0), 3);
        assert_eq!(insights.timing, None);
        assert_eq!(insights.class_performance, None);
        assert_eq!(insights.funnel_performance, None);

        let recs = recommend(&insights, &AnalysisConfig::default());
        assert!(recs.immediate.is_empty());
        assert!(recs.short_term.is_empty());
        assert_eq!(recs.potential_impact, None);
    }

    #[test]
    fn test_gap_is_percentage_points() {
        let table = vec![rate_row("A", 42.5), rate_row("B", 12.5), rate_row("C", 30.0)];

        let gap = gap_insight(&table).unwrap();
        assert_eq!(gap.best, "A");
        assert_eq!(gap.worst, "B");
        assert_eq!(gap.gap, 30.0);
    }

    /// Reference scenario: class gap 30 points, funnel gap 10 points,
    /// current rate 25% -> improvement 11.0 points, potential 36.0%.
    #[test]
    fn test_weighted_projection() {
        let insights = synthesize(
            &[],
            &[rate_row("A", 40.0), rate_row("B", 10.0)],
            &[rate_row("IG", 25.0), rate_row("FB", 15.0)],
            &basic(100, 25.0),
            3,
        );

        let recs = recommend(&insights, &AnalysisConfig::default());
        let impact = recs.potential_impact.unwrap();
        assert_eq!(impact.improvement_points, 11.0);
        assert_eq!(impact.potential_conversion_rate, 36.0);
        // (36 - 25) / 100 * (100 * 4) = 44 additional conversions.
        assert_eq!(impact.additional_monthly_conversions, 44);
    }

    #[test]
    fn test_weights_come_from_config() {
        let insights = synthesize(
            &[],
            &[rate_row("A", 40.0), rate_row("B", 10.0)],
            &[rate_row("IG", 25.0), rate_row("FB", 15.0)],
            &basic(100, 25.0),
            3,
        );

        let config = AnalysisConfig {
            class_gap_weight: 1.0,
            funnel_gap_weight: 0.0,
            ..AnalysisConfig::default()
        };
        let recs = recommend(&insights, &config);
        assert_eq!(recs.potential_impact.unwrap().improvement_points, 30.0);
    }
}
