//! Shortest-path routers used by reroute and change-target commands.
//!
//! A router is generic over an [`EdgeCost`] (travel time or effort) and a
//! [`Prohibition`] policy. Routers keep no search state between calls; only
//! the statistics counters are shared, and those are atomics.

pub mod dijkstra;

use std::time::Duration;

use crate::sim::network::{EdgeId, Network};
use crate::sim::weights::{EdgeWeights, WeightKind};
use crate::sim::SimTime;

pub use dijkstra::DijkstraRouter;

/// What a router needs to know about the vehicle it routes.
#[derive(Debug, Clone, Copy)]
pub struct VehicleView<'a> {
    pub weights: &'a EdgeWeights,
    pub vclass: &'a str,
    pub max_speed: f64,
}

/// Cost of entering an edge at a given time, in seconds.
pub trait EdgeCost: Send + Sync {
    fn cost(&self, net: &Network, edge: EdgeId, veh: &VehicleView<'_>, time: SimTime) -> f64;
}

/// Travel time: per-vehicle override, else length over reachable speed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TravelTime;

impl EdgeCost for TravelTime {
    fn cost(&self, net: &Network, edge: EdgeId, veh: &VehicleView<'_>, time: SimTime) -> f64 {
        if let Some(v) = veh.weights.table(WeightKind::TravelTime).retrieve(edge, time) {
            return v;
        }
        let speed = net.edge_speed(edge).min(veh.max_speed);
        if speed <= 0.0 {
            return f64::MAX;
        }
        net.edge_length(edge) / speed
    }
}

/// Effort: per-vehicle override, else zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct Effort;

impl EdgeCost for Effort {
    fn cost(&self, _net: &Network, edge: EdgeId, veh: &VehicleView<'_>, time: SimTime) -> f64 {
        veh.weights
            .table(WeightKind::Effort)
            .retrieve(edge, time)
            .unwrap_or(0.0)
    }
}

pub trait Prohibition: Send + Sync {
    fn is_prohibited(&self, net: &Network, edge: EdgeId, veh: &VehicleView<'_>) -> bool;
}

/// Every edge is usable.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRestrictions;

impl Prohibition for NoRestrictions {
    fn is_prohibited(&self, _net: &Network, _edge: EdgeId, _veh: &VehicleView<'_>) -> bool {
        false
    }
}

/// Edges whose lanes all disallow the vehicle class are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct WithRestrictions;

impl Prohibition for WithRestrictions {
    fn is_prohibited(&self, net: &Network, edge: EdgeId, veh: &VehicleView<'_>) -> bool {
        net.prohibits(edge, veh.vclass)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RouterStats {
    pub queries: u64,
    pub visits: u64,
    pub query_time: Duration,
}

impl RouterStats {
    pub fn avg_visits(&self) -> f64 {
        if self.queries == 0 {
            0.0
        } else {
            self.visits as f64 / self.queries as f64
        }
    }
}

pub trait Router: Send + Sync {
    /// Cheapest edge sequence from `from` to `to` when departing at `time`.
    fn compute(
        &self,
        net: &Network,
        from: EdgeId,
        to: EdgeId,
        veh: &VehicleView<'_>,
        time: SimTime,
    ) -> Option<Vec<EdgeId>>;

    /// Total cost of driving `edges` in order, starting at `time`.
    fn recompute_costs(
        &self,
        net: &Network,
        edges: &[EdgeId],
        veh: &VehicleView<'_>,
        time: SimTime,
    ) -> f64;

    fn stats(&self) -> RouterStats;
}
