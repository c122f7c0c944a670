//! Snapping of externally driven vehicles onto the lane network.
//!
//! [`map_position`] is a pure function: every call builds its own candidate
//! table and returns the winner. Candidates are evaluated in ascending lane
//! id order and the first one reaching the maximum score is kept.

use crate::sim::geom::{min_angle_diff, Position};
use crate::sim::network::{EdgeFunction, EdgeId, LaneId, Network, ORIGIN_ID_PARAM};
use crate::sim::vehicle::MicroVehicle;

/// Distance assigned to lanes the point cannot be projected onto.
const FAR_AWAY: f64 = 1000.0;

/// Distances above this count as "not on the lane".
const FAR_AWAY_THRESHOLD: f64 = 999.0;

/// Distance term used for lanes the point is not on.
const OFF_LANE_PENALTY: f64 = -10.0;

const DIST_WEIGHT: f64 = 0.5;
const ANGLE_WEIGHT: f64 = 0.0;
const ID_WEIGHT: f64 = 0.5;
const ON_ROUTE_WEIGHT: f64 = 0.5;
const SAME_EDGE_WEIGHT: f64 = 0.5;

/// Evaluation of one candidate lane.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneUtility {
    pub dist: f64,
    pub angle_diff: f64,
    pub id_match: bool,
    pub on_route: bool,
    pub same_edge: bool,
    pub prev_edge: Option<EdgeId>,
    pub next_edge: Option<EdgeId>,
}

impl LaneUtility {
    fn score(&self, max_dist: f64, same_edge_ratio: f64) -> f64 {
        let dist_n = if self.dist > FAR_AWAY_THRESHOLD {
            OFF_LANE_PENALTY
        } else if max_dist > 0.0 {
            1.0 - self.dist / max_dist
        } else {
            1.0
        };
        let angle_n = 1.0 - self.angle_diff / 180.0;
        let id_n = if self.id_match { 1.0 } else { 0.0 };
        let on_route_n = if self.on_route { 1.0 } else { 0.0 };
        let same_edge_n = if self.same_edge { same_edge_ratio } else { 0.0 };
        dist_n * DIST_WEIGHT
            + angle_n * ANGLE_WEIGHT
            + id_n * ID_WEIGHT
            + on_route_n * ON_ROUTE_WEIGHT
            + same_edge_n * SAME_EDGE_WEIGHT
    }
}

/// How the chosen lane relates to the vehicle's route.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteMatch {
    /// Lane is on the route this many edges ahead of the current one.
    Offset(usize),
    /// Lane is off the route; the vehicle needs this replacement fragment.
    Fragment(Vec<EdgeId>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaneMatch {
    pub lane: LaneId,
    pub lane_pos: f64,
    /// Distance from the query point to the chosen lane.
    pub distance: f64,
    pub route: RouteMatch,
    pub utility: f64,
    /// Lane edge lies on the remaining route.
    pub on_route: bool,
    /// Lane belongs to the edge the vehicle is on.
    pub same_edge: bool,
}

/// Where the remaining route is searched from. Behind an internal lane the
/// vehicle has already left the edge its route position points at.
fn route_search_start(net: &Network, v: &MicroVehicle, lane: LaneId) -> usize {
    if net.is_internal(net.lane(lane).edge) {
        v.route_position + 1
    } else {
        v.route_position
    }
}

fn find_from(edges: &[EdgeId], start: usize, e: EdgeId) -> Option<usize> {
    edges
        .iter()
        .skip(start)
        .position(|x| *x == e)
        .map(|p| p + start)
}

/// First normal edge reached by walking logical predecessors.
fn normal_predecessor(net: &Network, e: EdgeId) -> Option<EdgeId> {
    let mut cur = e;
    for _ in 0..=net.edge_count() {
        if net.edge(cur).function != EdgeFunction::Internal {
            return Some(cur);
        }
        let first = *net.edge(cur).lanes.first()?;
        let pred = net.lane(first).predecessor?;
        cur = net.lane(pred).edge;
    }
    None
}

/// Route context shared by all lanes of one candidate edge.
struct EdgeContext {
    on_route: bool,
    prev_edge: Option<EdgeId>,
    next_edge: Option<EdgeId>,
}

fn edge_context(net: &Network, v: &MicroVehicle, veh_lane: LaneId, e: EdgeId, moved: f64) -> EdgeContext {
    let route = &v.route.edges;
    if net.edge(e).function != EdgeFunction::Internal {
        let start = route_search_start(net, v, veh_lane);
        let found = find_from(route, start, e);
        let is_last = found.is_some_and(|i| i + 1 == route.len());
        let mut on_route = found.is_some();
        if is_last && v.current_edge() == Some(e) {
            on_route &= net.edge_length(e) > v.pos_on_lane + moved;
        }
        let next_edge = match found {
            Some(i) if on_route && !is_last => route.get(i + 1).copied(),
            _ => None,
        };
        return EdgeContext { on_route, prev_edge: Some(e), next_edge };
    }

    let prev_edge = normal_predecessor(net, e);
    let mut ctx = EdgeContext { on_route: false, prev_edge, next_edge: None };
    let Some(prev) = prev_edge else {
        return ctx;
    };
    let Some(prev_pos) = find_from(route, v.route_position, prev) else {
        return ctx;
    };
    if route.len() > 1 && prev_pos + 1 != route.len() {
        let wanted = route.get(v.route_position + 1).copied();
        let outgoing = &net.junction(net.edge(e).from).outgoing;
        if let Some(next) = wanted.filter(|w| outgoing.contains(w)) {
            ctx.next_edge = Some(next);
            ctx.on_route = true;
        }
    }
    ctx
}

/// Best lane for a vehicle that an outside process placed at `pos`.
///
/// `orig_id` is matched against the lanes' origin-id parameter and `angle`
/// is the heading in navigational degrees. Returns `None` if the vehicle is
/// off the road or no lane lies within reach.
pub fn map_position(
    net: &Network,
    v: &MicroVehicle,
    pos: &Position,
    orig_id: &str,
    angle: f64,
) -> Option<LaneMatch> {
    let veh_lane = v.lane?;
    let veh_edge = net.lane(veh_lane).edge;
    let moved = pos.distance_2d(&v.position);
    let current_len = v.current_edge().map_or(0.0, |e| net.edge_length(e));

    let mut candidates: Vec<(LaneId, LaneUtility)> = Vec::new();
    let mut max_dist: f64 = 0.0;
    for e in net.edges_in_range(pos, moved * 2.0) {
        let ctx = edge_context(net, v, veh_lane, e, moved);
        for lane_id in &net.edge(e).lanes {
            let lane = net.lane(*lane_id);
            let mut langle = 180.0;
            let mut dist = FAR_AWAY;
            if let Some(off) = lane.shape.nearest_offset_to_point_2d(pos) {
                dist = lane.shape.distance_2d(pos);
                if dist > lane.length {
                    dist = FAR_AWAY;
                } else {
                    langle = lane.shape.rotation_degree_at_offset(off);
                }
            }
            max_dist = max_dist.max(dist);
            let same_edge = lane.edge == veh_edge && current_len > v.pos_on_lane + moved;
            let next_edge = ctx.next_edge.or_else(|| {
                if net.is_internal(lane.edge) {
                    lane.links.first().map(|l| net.lane(*l).edge)
                } else {
                    None
                }
            });
            candidates.push((
                *lane_id,
                LaneUtility {
                    dist,
                    angle_diff: min_angle_diff(angle, langle),
                    id_match: lane.param(ORIGIN_ID_PARAM).unwrap_or("") == orig_id,
                    on_route: ctx.on_route,
                    same_edge,
                    prev_edge: ctx.prev_edge,
                    next_edge,
                },
            ));
        }
    }
    candidates.sort_by_key(|(l, _)| *l);

    let same_edge_ratio = (current_len / moved).min(1.0);
    let mut best: Option<(f64, LaneId, &LaneUtility)> = None;
    for (lane, u) in &candidates {
        let value = u.score(max_dist, same_edge_ratio);
        if best.map_or(true, |(b, _, _)| value > b) {
            best = Some((value, *lane, u));
        }
    }
    let (utility, lane, u) = best?;

    let lane_pos = net
        .lane(lane)
        .shape
        .nearest_offset_to_point_2d(pos)
        .unwrap_or(0.0);
    let route = if u.on_route {
        let found = u
            .prev_edge
            .and_then(|p| find_from(&v.route.edges, v.route_position, p));
        if found.is_none() {
            tracing::debug!(
                lane = %net.lane(lane).id,
                "predecessor edge not on the remaining route, keeping route position"
            );
        }
        RouteMatch::Offset(found.map_or(0, |i| i - v.route_position))
    } else {
        let mut fragment: Vec<EdgeId> = u.prev_edge.into_iter().collect();
        fragment.extend(u.next_edge);
        RouteMatch::Fragment(fragment)
    };
    tracing::trace!(lane = %net.lane(lane).id, utility, distance = u.dist, "position mapped");
    Some(LaneMatch {
        lane,
        lane_pos,
        distance: u.dist,
        route,
        utility,
        on_route: u.on_route,
        same_edge: u.same_edge,
    })
}
