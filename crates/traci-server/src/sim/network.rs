//! Road network: edges, lanes, junctions.
//!
//! Ids are dense indices into the owning `Network`. The origin-id index
//! (external lane ids supplied by an outside driving simulator) is built once
//! in `NetworkBuilder::build` and owned by the network.

use std::collections::HashMap;

use super::geom::{Position, Shape};
use super::SimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LaneId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JunctionId(pub usize);

/// Lane parameter holding the external (origin) id.
pub const ORIGIN_ID_PARAM: &str = "origId";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeFunction {
    Normal,
    /// Edge inside a junction connecting two normal edges.
    Internal,
}

#[derive(Debug, Clone)]
pub struct Lane {
    pub id: String,
    pub edge: EdgeId,
    pub index: usize,
    pub shape: Shape,
    pub length: f64,
    pub max_speed: f64,
    pub disallowed: Vec<String>,
    /// Outgoing connections, in definition order.
    pub links: Vec<LaneId>,
    pub predecessor: Option<LaneId>,
    pub params: HashMap<String, String>,
}

impl Lane {
    pub fn allows(&self, vclass: &str) -> bool {
        !self.disallowed.iter().any(|c| c == vclass)
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub id: String,
    pub function: EdgeFunction,
    pub lanes: Vec<LaneId>,
    pub from: JunctionId,
    pub to: JunctionId,
}

#[derive(Debug, Clone)]
pub struct Junction {
    pub id: String,
    pub outgoing: Vec<EdgeId>,
}

#[derive(Debug, Default)]
pub struct Network {
    edges: Vec<Edge>,
    lanes: Vec<Lane>,
    junctions: Vec<Junction>,
    edge_ids: HashMap<String, EdgeId>,
    lane_ids: HashMap<String, LaneId>,
    origin_index: HashMap<String, Vec<LaneId>>,
}

impl Network {
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0]
    }

    pub fn lane(&self, id: LaneId) -> &Lane {
        &self.lanes[id.0]
    }

    pub fn junction(&self, id: JunctionId) -> &Junction {
        &self.junctions[id.0]
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        (0..self.edges.len()).map(EdgeId)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_by_name(&self, id: &str) -> Option<EdgeId> {
        self.edge_ids.get(id).copied()
    }

    pub fn lane_by_name(&self, id: &str) -> Option<LaneId> {
        self.lane_ids.get(id).copied()
    }

    pub fn is_internal(&self, e: EdgeId) -> bool {
        self.edge(e).function == EdgeFunction::Internal
    }

    /// Length of an edge, taken from its first lane.
    pub fn edge_length(&self, e: EdgeId) -> f64 {
        self.first_lane(e).map_or(0.0, |l| self.lane(l).length)
    }

    pub fn first_lane(&self, e: EdgeId) -> Option<LaneId> {
        self.edge(e).lanes.first().copied()
    }

    /// Fastest lane speed on an edge.
    pub fn edge_speed(&self, e: EdgeId) -> f64 {
        self.edge(e)
            .lanes
            .iter()
            .map(|l| self.lane(*l).max_speed)
            .fold(0.0, f64::max)
    }

    /// True if no lane of `e` admits `vclass`.
    pub fn prohibits(&self, e: EdgeId, vclass: &str) -> bool {
        !self.edge(e).lanes.iter().any(|l| self.lane(*l).allows(vclass))
    }

    /// Normal edges reachable through one connection, looking through internal edges.
    pub fn successors(&self, e: EdgeId) -> Vec<EdgeId> {
        let mut out = Vec::new();
        let mut stack: Vec<LaneId> = self.edge(e).lanes.clone();
        let mut visited = Vec::new();
        while let Some(l) = stack.pop() {
            for next in &self.lane(l).links {
                let ne = self.lane(*next).edge;
                if self.is_internal(ne) {
                    if !visited.contains(next) {
                        visited.push(*next);
                        stack.push(*next);
                    }
                } else if !out.contains(&ne) {
                    out.push(ne);
                }
            }
        }
        out.sort();
        out
    }

    pub fn is_connected(&self, from: EdgeId, to: EdgeId) -> bool {
        self.successors(from).contains(&to)
    }

    /// Lanes carrying the given origin id.
    pub fn lanes_with_origin(&self, origin: &str) -> &[LaneId] {
        self.origin_index.get(origin).map_or(&[], Vec::as_slice)
    }

    /// Edges with any lane within `range` of `p`, ordered by edge id.
    pub fn edges_in_range(&self, p: &Position, range: f64) -> Vec<EdgeId> {
        let mut hits: Vec<EdgeId> = self
            .edges()
            .filter(|e| {
                self.edge(*e)
                    .lanes
                    .iter()
                    .any(|l| self.lane(*l).shape.distance_2d(p) <= range)
            })
            .collect();
        hits.sort_by(|a, b| self.edge(*a).id.cmp(&self.edge(*b).id));
        hits
    }

    /// Closest lane to a cartesian point and the offset on it.
    pub fn nearest_lane(&self, p: &Position) -> Option<(LaneId, f64)> {
        let mut best: Option<(f64, LaneId)> = None;
        for (i, lane) in self.lanes.iter().enumerate() {
            let d = lane.shape.distance_2d(p);
            if best.map_or(true, |(bd, _)| d < bd) {
                best = Some((d, LaneId(i)));
            }
        }
        best.map(|(_, l)| {
            let off = self.lane(l).shape.nearest_offset_to_point_2d(p).unwrap_or(0.0);
            (l, off)
        })
    }
}

/// Incremental network construction.
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    net: Network,
    junction_ids: HashMap<String, JunctionId>,
}

/// Lane definition handed to [`NetworkBuilder::add_lane`].
#[derive(Debug, Clone, Default)]
pub struct LaneSpec {
    pub shape: Vec<Position>,
    pub speed: f64,
    pub origin_id: Option<String>,
    pub disallow: Vec<String>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn junction(&mut self, name: &str) -> JunctionId {
        if let Some(j) = self.junction_ids.get(name) {
            return *j;
        }
        let id = JunctionId(self.net.junctions.len());
        self.net.junctions.push(Junction {
            id: name.to_string(),
            outgoing: Vec::new(),
        });
        self.junction_ids.insert(name.to_string(), id);
        id
    }

    pub fn add_edge(
        &mut self,
        id: &str,
        from: &str,
        to: &str,
        function: EdgeFunction,
    ) -> Result<EdgeId, SimError> {
        if self.net.edge_ids.contains_key(id) {
            return Err(SimError::Duplicate { kind: "edge", id: id.to_string() });
        }
        let from = self.junction(from);
        let to = self.junction(to);
        let eid = EdgeId(self.net.edges.len());
        self.net.edges.push(Edge {
            id: id.to_string(),
            function,
            lanes: Vec::new(),
            from,
            to,
        });
        self.net.junctions[from.0].outgoing.push(eid);
        self.net.edge_ids.insert(id.to_string(), eid);
        Ok(eid)
    }

    /// Append a lane; its id is `<edge>_<index>`.
    pub fn add_lane(&mut self, edge: EdgeId, spec: LaneSpec) -> Result<LaneId, SimError> {
        let index = self.net.edges[edge.0].lanes.len();
        let id = format!("{}_{}", self.net.edges[edge.0].id, index);
        if spec.shape.len() < 2 {
            return Err(SimError::InvalidShape(id));
        }
        if spec.speed.is_nan() || spec.speed <= 0.0 {
            return Err(SimError::InvalidSpeed(id));
        }
        let shape = Shape(spec.shape);
        let mut params = HashMap::new();
        if let Some(origin) = spec.origin_id {
            params.insert(ORIGIN_ID_PARAM.to_string(), origin);
        }
        let lid = LaneId(self.net.lanes.len());
        self.net.lanes.push(Lane {
            id: id.clone(),
            edge,
            index,
            length: shape.length_2d(),
            shape,
            max_speed: spec.speed,
            disallowed: spec.disallow,
            links: Vec::new(),
            predecessor: None,
            params,
        });
        self.net.edges[edge.0].lanes.push(lid);
        self.net.lane_ids.insert(id, lid);
        Ok(lid)
    }

    pub fn connect(&mut self, from: &str, to: &str) -> Result<(), SimError> {
        let f = self
            .net
            .lane_by_name(from)
            .ok_or_else(|| SimError::UnknownLane(from.to_string()))?;
        let t = self
            .net
            .lane_by_name(to)
            .ok_or_else(|| SimError::UnknownLane(to.to_string()))?;
        self.net.lanes[f.0].links.push(t);
        Ok(())
    }

    pub fn build(mut self) -> Network {
        for i in 0..self.net.lanes.len() {
            let links = self.net.lanes[i].links.clone();
            for t in links {
                let target = &mut self.net.lanes[t.0];
                if target.predecessor.is_none() {
                    target.predecessor = Some(LaneId(i));
                }
            }
        }
        for (i, lane) in self.net.lanes.iter().enumerate() {
            if let Some(origin) = lane.param(ORIGIN_ID_PARAM) {
                self.net
                    .origin_index
                    .entry(origin.to_string())
                    .or_default()
                    .push(LaneId(i));
            }
        }
        tracing::debug!(
            edges = self.net.edges.len(),
            lanes = self.net.lanes.len(),
            origin_ids = self.net.origin_index.len(),
            "network built"
        );
        self.net
    }
}
