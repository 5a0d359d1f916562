//! Cohort-windowed conversion rates.
//!
//! For a window of `N` days, an event counts as a within-window conversion
//! iff its `elapsed_days` is defined and in `0..=N`. Negative elapsed time
//! (payment recorded before the slot) is a data anomaly and never counts,
//! for any window length. The denominator is always the full segment
//! population, converted or not.

use std::collections::BTreeMap;

use crate::analyzers::aggregate::{self, Dimension, SegmentKey};
use crate::analyzers::utility::{pct, round2};
use crate::event::Event;

/// Windowed conversion statistics for one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowedRate {
    pub population: u64,
    pub conversions_in_window: u64,
    /// Rounded to two decimals; 0 when the population is 0.
    pub rate_percent: f64,
}

/// Computes per-segment windowed conversion rates.
///
/// Left-join semantics: every segment of the full population appears in
/// the result, with zero windowed conversions when none fall inside the
/// window. A `window_days` of 0 counts same-day conversions only.
pub fn windowed_rates(
    events: &[Event],
    dims: &[Dimension],
    window_days: i64,
) -> BTreeMap<SegmentKey, WindowedRate> {
    let population = aggregate::aggregate(events, dims);
    merge_window(events, dims, window_days, &population)
}

/// Same as [`windowed_rates`] but reusing an already-computed population
/// pass, for callers evaluating several window lengths over one dataset.
pub fn merge_window(
    events: &[Event],
    dims: &[Dimension],
    window_days: i64,
    population: &BTreeMap<SegmentKey, aggregate::SegmentCounts>,
) -> BTreeMap<SegmentKey, WindowedRate> {
    let mut in_window: BTreeMap<SegmentKey, u64> = BTreeMap::new();
    for event in events {
        if within_window(event, window_days) {
            *in_window
                .entry(aggregate::segment_key(event, dims))
                .or_default() += 1;
        }
    }

    population
        .iter()
        .map(|(key, counts)| {
            let conversions = in_window.get(key).copied().unwrap_or(0);
            let rate = round2(pct(conversions, counts.population));
            (
                key.clone(),
                WindowedRate {
                    population: counts.population,
                    conversions_in_window: conversions,
                    rate_percent: rate,
                },
            )
        })
        .collect()
}

fn within_window(event: &Event, window_days: i64) -> bool {
    matches!(event.elapsed_days, Some(d) if d >= 0 && d <= window_days)
}
