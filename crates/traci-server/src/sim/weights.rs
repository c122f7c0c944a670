//! Per-vehicle edge weight overrides (travel time and effort).

use std::collections::HashMap;

use super::network::EdgeId;
use super::SimTime;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Interval {
    begin: SimTime,
    end: SimTime,
    value: f64,
}

/// (edge, time window) -> value. Later entries shadow earlier ones.
#[derive(Debug, Clone, Default)]
pub struct WeightTable {
    entries: HashMap<EdgeId, Vec<Interval>>,
}

impl WeightTable {
    pub fn add(&mut self, edge: EdgeId, begin: SimTime, end: SimTime, value: f64) {
        self.entries
            .entry(edge)
            .or_default()
            .push(Interval { begin, end, value });
    }

    /// Drop every interval stored for `edge`.
    pub fn remove(&mut self, edge: EdgeId) {
        self.entries.remove(&edge);
    }

    pub fn knows(&self, edge: EdgeId) -> bool {
        self.entries.get(&edge).is_some_and(|v| !v.is_empty())
    }

    /// Value of the most recently added interval covering `time`.
    pub fn retrieve(&self, edge: EdgeId, time: SimTime) -> Option<f64> {
        self.entries.get(&edge)?.iter().rev().find_map(|i| {
            (i.begin <= time && time < i.end).then_some(i.value)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightKind {
    TravelTime,
    Effort,
}

impl WeightKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WeightKind::TravelTime => "travel time",
            WeightKind::Effort => "effort",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EdgeWeights {
    travel_time: WeightTable,
    effort: WeightTable,
}

impl EdgeWeights {
    pub fn table(&self, kind: WeightKind) -> &WeightTable {
        match kind {
            WeightKind::TravelTime => &self.travel_time,
            WeightKind::Effort => &self.effort,
        }
    }

    pub fn table_mut(&mut self, kind: WeightKind) -> &mut WeightTable {
        match kind {
            WeightKind::TravelTime => &mut self.travel_time,
            WeightKind::Effort => &mut self.effort,
        }
    }
}

