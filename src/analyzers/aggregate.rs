//! Segment aggregation: a single parameterized grouping pass over the
//! event collection, driven by an ordered list of dimensions.
//!
//! Grouping is stable: every event lands in exactly one group, so group
//! populations always sum to the input cardinality. Records with an
//! undefined value for a requested dimension form their own `None` group
//! rather than being dropped.

use std::collections::BTreeMap;

use crate::event::Event;

/// A categorical dimension events can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Funnel,
    LeadType,
    SlotHour,
    Expert,
    TargetClass,
}

impl Dimension {
    pub fn name(&self) -> &'static str {
        match self {
            Dimension::Funnel => "funnel",
            Dimension::LeadType => "lead_type",
            Dimension::SlotHour => "slot_hour",
            Dimension::Expert => "expert_id",
            Dimension::TargetClass => "target_class",
        }
    }

    /// The event's value for this dimension, `None` when undefined.
    pub fn value(&self, event: &Event) -> Option<String> {
        match self {
            Dimension::Funnel => event.funnel.clone(),
            Dimension::LeadType => event.lead_type.clone(),
            Dimension::SlotHour => event.slot_hour.map(|h| h.to_string()),
            Dimension::Expert => event.expert_id.clone(),
            Dimension::TargetClass => event.target_class.clone(),
        }
    }
}

/// One key component per requested dimension; `None` is the explicit
/// "undefined" group.
pub type SegmentKey = Vec<Option<String>>;

/// Counters accumulated per group. Never mutated after the aggregation
/// pass that builds them.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SegmentCounts {
    pub population: u64,
    pub conversions: u64,
    pub connected: u64,
}

/// Builds the grouping key for one event.
pub fn segment_key(event: &Event, dims: &[Dimension]) -> SegmentKey {
    dims.iter().map(|d| d.value(event)).collect()
}

/// Groups events by the given dimensions and counts population,
/// conversions, and connected slots per group.
pub fn aggregate(events: &[Event], dims: &[Dimension]) -> BTreeMap<SegmentKey, SegmentCounts> {
    aggregate_by(events, |e| segment_key(e, dims))
}

/// Generic keyed reduction underlying [`aggregate`]. Merging partial maps
/// would just sum counters per key, so the reduction is shard-order
/// independent.
pub fn aggregate_by<K, F>(events: &[Event], key: F) -> BTreeMap<K, SegmentCounts>
where
    K: Ord,
    F: Fn(&Event) -> K,
{
    let mut groups: BTreeMap<K, SegmentCounts> = BTreeMap::new();

    for event in events {
        let counts = groups.entry(key(event)).or_default();
        counts.population += 1;
        if event.converted {
            counts.conversions += 1;
        }
        if event.connected {
            counts.connected += 1;
        }
    }

    groups
}

/// Renders one key component for reports.
pub fn render_key_part(part: &Option<String>) -> String {
    part.clone().unwrap_or_else(|| "undefined".to_string())
}
