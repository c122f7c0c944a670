//! Time-dependent Dijkstra.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, Instant};

use crate::sim::network::{EdgeId, Network};
use crate::sim::SimTime;

use super::{EdgeCost, Prohibition, Router, RouterStats, TravelTime, VehicleView};

#[derive(Debug, Clone, Copy)]
struct QueueItem {
    cost: f64,
    edge: EdgeId,
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueItem {}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueItem {
    // reversed: BinaryHeap is a max-heap
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.edge.cmp(&self.edge))
    }
}

fn offset_time(start: SimTime, seconds: f64) -> SimTime {
    start.saturating_add((seconds * 1000.0) as SimTime)
}

/// Seconds spent on `edge` when entering it at `time`. Entry times follow
/// travel time whatever cost is minimized.
fn travel_time(net: &Network, edge: EdgeId, veh: &VehicleView<'_>, time: SimTime) -> f64 {
    TravelTime.cost(net, edge, veh, time)
}

pub struct DijkstraRouter<C, P> {
    name: &'static str,
    cost: C,
    prohibition: P,
    queries: AtomicU64,
    visits: AtomicU64,
    nanos: AtomicU64,
}

impl<C: EdgeCost, P: Prohibition> DijkstraRouter<C, P> {
    pub fn new(name: &'static str, cost: C, prohibition: P) -> Self {
        Self {
            name,
            cost,
            prohibition,
            queries: AtomicU64::new(0),
            visits: AtomicU64::new(0),
            nanos: AtomicU64::new(0),
        }
    }

    fn search(
        &self,
        net: &Network,
        from: EdgeId,
        to: EdgeId,
        veh: &VehicleView<'_>,
        time: SimTime,
    ) -> (Option<Vec<EdgeId>>, u64) {
        if self.prohibition.is_prohibited(net, from, veh)
            || self.prohibition.is_prohibited(net, to, veh)
        {
            return (None, 0);
        }
        let n = net.edge_count();
        let mut dist = vec![f64::INFINITY; n];
        // seconds from departure until the edge is entered
        let mut entered = vec![0.0; n];
        let mut prev: Vec<Option<EdgeId>> = vec![None; n];
        let mut done = vec![false; n];
        let mut heap = BinaryHeap::new();
        let mut visits = 0u64;

        dist[from.0] = 0.0;
        heap.push(QueueItem { cost: 0.0, edge: from });

        while let Some(QueueItem { cost, edge }) = heap.pop() {
            if done[edge.0] {
                continue;
            }
            done[edge.0] = true;
            visits += 1;
            if edge == to {
                let mut path = vec![to];
                let mut cur = to;
                while let Some(p) = prev[cur.0] {
                    path.push(p);
                    cur = p;
                }
                path.reverse();
                return (Some(path), visits);
            }
            let at = offset_time(time, entered[edge.0]);
            let leave = cost + self.cost.cost(net, edge, veh, at);
            let left_at = entered[edge.0] + travel_time(net, edge, veh, at);
            for next in net.successors(edge) {
                if done[next.0] || self.prohibition.is_prohibited(net, next, veh) {
                    continue;
                }
                if leave < dist[next.0] {
                    dist[next.0] = leave;
                    entered[next.0] = left_at;
                    prev[next.0] = Some(edge);
                    heap.push(QueueItem { cost: leave, edge: next });
                }
            }
        }
        (None, visits)
    }
}

impl<C: EdgeCost, P: Prohibition> Router for DijkstraRouter<C, P> {
    fn compute(
        &self,
        net: &Network,
        from: EdgeId,
        to: EdgeId,
        veh: &VehicleView<'_>,
        time: SimTime,
    ) -> Option<Vec<EdgeId>> {
        let started = Instant::now();
        let (path, visits) = self.search(net, from, to, veh, time);
        self.queries.fetch_add(1, AtomicOrdering::Relaxed);
        self.visits.fetch_add(visits, AtomicOrdering::Relaxed);
        self.nanos
            .fetch_add(started.elapsed().as_nanos() as u64, AtomicOrdering::Relaxed);
        if path.is_none() {
            tracing::debug!(
                router = self.name,
                from = %net.edge(from).id,
                to = %net.edge(to).id,
                "no connection"
            );
        }
        path
    }

    fn recompute_costs(
        &self,
        net: &Network,
        edges: &[EdgeId],
        veh: &VehicleView<'_>,
        time: SimTime,
    ) -> f64 {
        let (total, _) = edges.iter().fold((0.0, 0.0), |(acc, elapsed), e| {
            let at = offset_time(time, elapsed);
            (
                acc + self.cost.cost(net, *e, veh, at),
                elapsed + travel_time(net, *e, veh, at),
            )
        });
        total
    }

    fn stats(&self) -> RouterStats {
        RouterStats {
            queries: self.queries.load(AtomicOrdering::Relaxed),
            visits: self.visits.load(AtomicOrdering::Relaxed),
            query_time: Duration::from_nanos(self.nanos.load(AtomicOrdering::Relaxed)),
        }
    }
}

impl<C, P> Drop for DijkstraRouter<C, P> {
    fn drop(&mut self) {
        let queries = *self.queries.get_mut();
        if queries == 0 {
            return;
        }
        let visits = *self.visits.get_mut();
        let nanos = *self.nanos.get_mut();
        tracing::info!(
            router = self.name,
            queries,
            avg_visits = visits as f64 / queries as f64,
            time_ms = nanos as f64 / 1e6,
            "router statistics"
        );
    }
}
