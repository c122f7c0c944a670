//! In-memory simulation state the protocol engine operates on.
//!
//! Physics is not modelled here. Vehicles move only when inserted, placed by
//! the controller, or teleported by `moveTo`; kinematic fields are otherwise
//! plain data. What this module owns is the bookkeeping the command handlers
//! need: registries, the insertion queue, routes, stops and stepping.

pub mod geom;
pub mod network;
pub mod params;
pub mod route;
pub mod vehicle;
pub mod vtypes;
pub mod weights;

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use thiserror::Error;
use traci_core::error::TraciError;

use crate::routing::{DijkstraRouter, Effort, Router, TravelTime, VehicleView, WithRestrictions};

use geom::Position;
use network::{EdgeId, LaneId, Network};
use params::{DepartLane, DepartPos, DepartSpeed, DepartTime, VehicleParams};
use route::{Route, RouteDictionary};
use vehicle::{MesoVehicle, MicroVehicle, Notification, Placement, Stop, Vehicle};
use vtypes::VehicleTypes;
use weights::WeightKind;

/// Simulation time in milliseconds.
pub type SimTime = i64;

pub const SIMTIME_MAX: SimTime = i64::MAX;

/// Distance within which a vehicle counts as standing at its stop.
const STOP_TOLERANCE: f64 = 1.0;

/// Speed below which a vehicle accumulates waiting time.
const HALTING_SPEED: f64 = 0.1;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("duplicate {kind} id '{id}'")]
    Duplicate { kind: &'static str, id: String },

    #[error("unknown edge '{0}'")]
    UnknownEdge(String),

    #[error("unknown lane '{0}'")]
    UnknownLane(String),

    #[error("unknown route '{0}'")]
    UnknownRoute(String),

    #[error("unknown vehicle type '{0}'")]
    UnknownType(String),

    #[error("unknown vehicle '{0}'")]
    UnknownVehicle(String),

    #[error("route '{0}' has no edges")]
    EmptyRoute(String),

    #[error("lane '{0}' needs at least two shape points")]
    InvalidShape(String),

    #[error("lane '{0}' needs a positive speed")]
    InvalidSpeed(String),

    #[error("Vehicle '{0}' could not be built: {1}")]
    VehicleBuild(String, String),
}

impl From<SimError> for TraciError {
    fn from(e: SimError) -> Self {
        match e {
            SimError::VehicleBuild(..) | SimError::Duplicate { .. } => {
                TraciError::Validation(e.to_string())
            }
            _ => TraciError::Internal(e.to_string()),
        }
    }
}

/// Registry of all loaded vehicles, ordered by id.
#[derive(Debug, Default)]
pub struct VehicleControl {
    vehicles: BTreeMap<String, Vehicle>,
}

impl VehicleControl {
    pub fn get(&self, id: &str) -> Option<&Vehicle> {
        self.vehicles.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Vehicle> {
        self.vehicles.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.vehicles.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vehicle> + '_ {
        self.vehicles.values()
    }

    pub fn on_road_ids(&self) -> Vec<String> {
        self.vehicles
            .values()
            .filter(|v| v.is_on_road())
            .map(|v| v.id().to_string())
            .collect()
    }

    fn insert(&mut self, v: Vehicle) -> Result<(), SimError> {
        if self.vehicles.contains_key(v.id()) {
            return Err(SimError::Duplicate { kind: "vehicle", id: v.id().to_string() });
        }
        self.vehicles.insert(v.id().to_string(), v);
        Ok(())
    }
}

/// One entry of the best-lanes query.
#[derive(Debug, Clone, PartialEq)]
pub struct BestLane {
    pub lane: LaneId,
    /// Drivable length along the route without changing lanes.
    pub length: f64,
    /// Summed length of vehicles on that stretch.
    pub occupation: f64,
    /// Lane changes needed to reach the best lane (negative: to the right).
    pub offset: i8,
    pub allows_continuation: bool,
    pub continuations: Vec<LaneId>,
}

pub struct Simulation {
    pub net: Network,
    pub routes: RouteDictionary,
    pub types: VehicleTypes,
    pub vehicles: VehicleControl,
    insertion: VecDeque<String>,
    time: SimTime,
    delta_t: SimTime,
    router_tt: Box<dyn Router>,
    router_effort: Box<dyn Router>,
}

fn heading(rotation_deg: f64) -> f64 {
    (90.0 - rotation_deg).rem_euclid(360.0)
}

fn is_due(depart: DepartTime, now: SimTime) -> bool {
    match depart {
        DepartTime::At(t) => t <= now,
        DepartTime::Now => true,
        DepartTime::Triggered | DepartTime::ContainerTriggered => false,
    }
}

fn place(net: &Network, v: &mut MicroVehicle, lane: LaneId, pos: f64) {
    let l = net.lane(lane);
    let pos = pos.clamp(0.0, l.length);
    v.lane = Some(lane);
    v.pos_on_lane = pos;
    v.position = l.shape.position_at_offset(pos);
    v.angle = heading(l.shape.rotation_degree_at_offset(pos));
}

/// Id for the next replacement route of `v`.
fn next_route_id(v: &MicroVehicle) -> String {
    let base = match v.route.id.rfind("!var#") {
        Some(i) => v.route.id[..i].to_string(),
        None if v.id().starts_with('!') => v.id().to_string(),
        None => format!("!{}", v.id()),
    };
    format!("{base}!var#{}", v.reroutes + 1)
}

/// Index `v` would have on `route`, or `None` if its current edge is missing.
fn position_on(v: &MicroVehicle, route: &Route, on_init: bool, offset: usize) -> Option<usize> {
    if on_init {
        return Some(0);
    }
    let cur = v.current_edge()?;
    route
        .edges
        .iter()
        .skip(offset)
        .position(|e| *e == cur)
        .map(|p| p + offset)
}

fn adopt_route(v: &mut MicroVehicle, route: Arc<Route>, position: usize) {
    let remaining = route.edges.get(position..).unwrap_or(&[]).to_vec();
    v.stops.retain(|s| remaining.contains(&s.edge));
    v.route = route;
    v.route_position = position;
    v.reroutes += 1;
}

fn apply_placement(net: &Network, routes: &mut RouteDictionary, v: &mut MicroVehicle, p: Placement) {
    if p.edges.is_empty() {
        let last = v.route.edges.len().saturating_sub(1);
        v.route_position = (v.route_position + p.route_offset).min(last);
    } else {
        let route = Arc::new(Route::new(next_route_id(v), p.edges));
        if routes.add_shared(Arc::clone(&route)).is_ok() {
            adopt_route(v, route, 0);
        }
    }
    place(net, v, p.lane, p.lane_pos);
}

impl Simulation {
    pub fn new(net: Network, delta_t: SimTime, begin: SimTime) -> Self {
        Self {
            net,
            routes: RouteDictionary::default(),
            types: VehicleTypes::default(),
            vehicles: VehicleControl::default(),
            insertion: VecDeque::new(),
            time: begin,
            delta_t,
            router_tt: Box::new(DijkstraRouter::new("traveltime", TravelTime, WithRestrictions)),
            router_effort: Box::new(DijkstraRouter::new("effort", Effort, WithRestrictions)),
        }
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn delta_t(&self) -> SimTime {
        self.delta_t
    }

    pub fn router(&self, kind: WeightKind) -> &dyn Router {
        match kind {
            WeightKind::TravelTime => self.router_tt.as_ref(),
            WeightKind::Effort => self.router_effort.as_ref(),
        }
    }

    pub fn pending_insertions(&self) -> usize {
        self.insertion.len()
    }

    pub fn micro(&self, id: &str) -> Option<&MicroVehicle> {
        self.vehicles.get(id)?.as_micro()
    }

    pub fn micro_mut(&mut self, id: &str) -> Option<&mut MicroVehicle> {
        self.vehicles.get_mut(id)?.as_micro_mut()
    }

    pub fn view<'a>(&'a self, v: &'a MicroVehicle) -> VehicleView<'a> {
        let t = self.types.get(&v.type_id);
        VehicleView {
            weights: &v.weights,
            vclass: t.map_or("", |t| t.vclass.as_str()),
            max_speed: t.map_or(f64::MAX, |t| t.max_speed),
        }
    }

    pub fn on_internal(&self, v: &MicroVehicle) -> bool {
        v.lane
            .is_some_and(|l| self.net.is_internal(self.net.lane(l).edge))
    }

    /// Build a vehicle and queue it for insertion.
    pub fn build_vehicle(
        &mut self,
        params: VehicleParams,
        type_id: &str,
        route: Arc<Route>,
    ) -> Result<(), SimError> {
        let id = params.id.clone();
        if self.vehicles.contains(&id) {
            return Err(SimError::Duplicate { kind: "vehicle", id });
        }
        let vtype = self
            .types
            .get(type_id)
            .ok_or_else(|| SimError::UnknownType(type_id.to_string()))?;
        let first = route
            .edges
            .first()
            .copied()
            .ok_or_else(|| SimError::EmptyRoute(route.id.clone()))?;
        if let DepartLane::Given(i) = params.depart_lane {
            if i as usize >= self.net.edge(first).lanes.len() {
                return Err(SimError::VehicleBuild(
                    id,
                    format!("departLane {i} does not exist on edge '{}'", self.net.edge(first).id),
                ));
            }
        }
        self.check_route(&route.edges, &vtype.vclass)
            .map_err(|msg| SimError::VehicleBuild(id.clone(), msg))?;

        let mut v = MicroVehicle::new(params, type_id.to_string(), route);
        v.chosen_speed_factor = vtype.speed_factor;
        self.vehicles.insert(Vehicle::Micro(v))?;
        self.insertion.push_back(id.clone());
        tracing::debug!(vehicle = %id, "vehicle queued for insertion");
        Ok(())
    }

    /// Register a vehicle driven by the mesoscopic model.
    pub fn build_meso_vehicle(
        &mut self,
        params: VehicleParams,
        type_id: &str,
        route: Arc<Route>,
    ) -> Result<(), SimError> {
        if !self.types.contains(type_id) {
            return Err(SimError::UnknownType(type_id.to_string()));
        }
        let id = params.id.clone();
        self.vehicles.insert(Vehicle::Meso(MesoVehicle {
            params,
            type_id: type_id.to_string(),
            route,
            departed: false,
        }))?;
        self.insertion.push_back(id);
        Ok(())
    }

    /// Connectivity and class permissions along `edges`.
    pub fn check_route(&self, edges: &[EdgeId], vclass: &str) -> Result<(), String> {
        for w in edges.windows(2) {
            if !self.net.is_connected(w[0], w[1]) {
                return Err(format!(
                    "No connection between edge '{}' and edge '{}'.",
                    self.net.edge(w[0]).id,
                    self.net.edge(w[1]).id
                ));
            }
        }
        if let Some(e) = edges.iter().find(|e| self.net.prohibits(**e, vclass)) {
            return Err(format!(
                "Vehicle class '{vclass}' is not allowed on edge '{}'.",
                self.net.edge(*e).id
            ));
        }
        Ok(())
    }

    pub fn has_valid_route(&self, v: &MicroVehicle) -> bool {
        let vclass = self.types.get(&v.type_id).map_or("", |t| t.vclass.as_str());
        let remaining = v.route.edges.get(v.route_position..).unwrap_or(&[]);
        self.check_route(remaining, vclass).is_ok()
    }

    /// Speed limit for `v` on its lane.
    pub fn allowed_speed(&self, v: &MicroVehicle) -> Option<f64> {
        let lane = self.net.lane(v.lane?);
        let vmax = self.types.get(&v.type_id).map_or(f64::MAX, |t| t.max_speed);
        Some((lane.max_speed * v.chosen_speed_factor).min(vmax))
    }

    /// Closest vehicle ahead and the gap to it (`None`, -1 if nothing is found).
    pub fn leader(&self, v: &MicroVehicle, dist: f64) -> (Option<String>, f64) {
        let Some(lane) = v.lane else {
            return (None, -1.0);
        };
        let min_gap = self.types.get(&v.type_id).map_or(0.0, |t| t.min_gap);
        let length_of = |o: &MicroVehicle| self.types.get(&o.type_id).map_or(0.0, |t| t.length);
        let others: Vec<&MicroVehicle> = self
            .vehicles
            .iter()
            .filter_map(Vehicle::as_micro)
            .filter(|o| o.id() != v.id() && o.is_on_road())
            .collect();

        let nearest_on = |lanes: &[LaneId], after: f64| {
            others
                .iter()
                .filter(|o| o.lane.is_some_and(|l| lanes.contains(&l)) && o.pos_on_lane > after)
                .min_by(|a, b| a.pos_on_lane.total_cmp(&b.pos_on_lane))
                .copied()
        };

        if let Some(o) = nearest_on(&[lane], v.pos_on_lane) {
            let gap = o.pos_on_lane - length_of(o) - v.pos_on_lane - min_gap;
            return (Some(o.id().to_string()), gap);
        }
        let mut seen = self.net.lane(lane).length - v.pos_on_lane;
        for e in v.route.edges.iter().skip(v.route_position + 1) {
            if seen > dist {
                break;
            }
            if let Some(o) = nearest_on(&self.net.edge(*e).lanes, f64::MIN) {
                let gap = seen + o.pos_on_lane - length_of(o) - min_gap;
                return (Some(o.id().to_string()), gap);
            }
            seen += self.net.edge_length(*e);
        }
        (None, -1.0)
    }

    /// Normal lane of `to_edge` reachable from `from`, possibly through a
    /// junction-internal lane.
    fn follow(&self, from: LaneId, to_edge: EdgeId) -> Option<LaneId> {
        for l in &self.net.lane(from).links {
            let target = self.net.lane(*l);
            if target.edge == to_edge {
                return Some(*l);
            }
            if self.net.is_internal(target.edge) {
                if let Some(n) = target
                    .links
                    .iter()
                    .find(|n| self.net.lane(**n).edge == to_edge)
                {
                    return Some(*n);
                }
            }
        }
        None
    }

    fn occupation(&self, lanes: &[LaneId]) -> f64 {
        self.vehicles
            .iter()
            .filter_map(Vehicle::as_micro)
            .filter(|o| o.is_on_road() && o.lane.is_some_and(|l| lanes.contains(&l)))
            .map(|o| self.types.get(&o.type_id).map_or(0.0, |t| t.length))
            .sum()
    }

    pub fn best_lanes(&self, v: &MicroVehicle) -> Vec<BestLane> {
        let Some(cur) = v.lane else {
            return Vec::new();
        };
        let edge = self.net.lane(cur).edge;
        let ahead = v.route.edges.get(v.route_position + 1..).unwrap_or(&[]);

        let mut out: Vec<BestLane> = self
            .net
            .edge(edge)
            .lanes
            .iter()
            .map(|start| {
                let mut chain = vec![*start];
                let mut at = *start;
                let mut allows = true;
                for (i, next) in ahead.iter().enumerate() {
                    match self.follow(at, *next) {
                        Some(l) => {
                            chain.push(l);
                            at = l;
                        }
                        None => {
                            if i == 0 {
                                allows = false;
                            }
                            break;
                        }
                    }
                }
                BestLane {
                    lane: *start,
                    length: chain.iter().map(|l| self.net.lane(*l).length).sum(),
                    occupation: self.occupation(&chain[1..]),
                    offset: 0,
                    allows_continuation: allows,
                    continuations: chain,
                }
            })
            .collect();

        let best = out.iter().map(|b| b.length).fold(f64::MIN, f64::max);
        let best_idx: Vec<usize> = out
            .iter()
            .enumerate()
            .filter(|(_, b)| b.length >= best)
            .map(|(i, _)| i)
            .collect();
        for (i, b) in out.iter_mut().enumerate() {
            let nearest = best_idx
                .iter()
                .min_by_key(|j| (**j as i64 - i as i64).abs())
                .copied()
                .unwrap_or(i);
            b.offset = (nearest as i64 - i as i64).clamp(i8::MIN.into(), i8::MAX.into()) as i8;
        }
        out
    }

    /// Distance driven since the start of the route.
    pub fn route_distance(&self, v: &MicroVehicle) -> Option<f64> {
        let lane = v.lane?;
        let first = *v.route.edges.first()?;
        v.route.distance_between(
            &self.net,
            0,
            0.0,
            v.pos_on_lane,
            first,
            self.net.lane(lane).edge,
        )
    }

    /// Driving distance from `v` to `pos` on `lane` along its route.
    pub fn driving_distance(&self, v: &MicroVehicle, lane: LaneId, pos: f64) -> Option<f64> {
        let from = v.current_edge()?;
        v.route.distance_between(
            &self.net,
            v.route_position,
            v.pos_on_lane,
            pos,
            from,
            self.net.lane(lane).edge,
        )
    }

    pub fn convert_cartesian_to_roadmap(&self, p: &Position) -> Option<(LaneId, f64)> {
        self.net.nearest_lane(p)
    }

    /// Replace the route of `id` by `edges`. When the vehicle is on the road
    /// the driven prefix is kept and `edges` must contain the current edge.
    pub fn replace_route_edges(&mut self, id: &str, mut edges: Vec<EdgeId>, on_init: bool) -> bool {
        if edges.is_empty() {
            return false;
        }
        let on_internal = self.micro(id).is_some_and(|v| self.on_internal(v));
        let Some(v) = self.vehicles.get_mut(id).and_then(Vehicle::as_micro_mut) else {
            return false;
        };
        let mut offset = 0;
        if !on_init {
            let origin = v.reroute_origin(on_internal);
            let current = v.current_edge();
            if origin != current && edges.first().copied() == origin {
                if let Some(c) = current {
                    edges.insert(0, c);
                }
            }
            let prefix = v.route.edges.get(..v.route_position).unwrap_or(&[]);
            offset = prefix.len();
            edges.splice(0..0, prefix.iter().copied());
        }
        if edges == v.route.edges {
            return true;
        }
        let route = Arc::new(Route::new(next_route_id(v), edges));
        let Some(position) = position_on(v, &route, on_init, offset) else {
            return false;
        };
        if self.routes.add_shared(Arc::clone(&route)).is_err() {
            return false;
        }
        adopt_route(v, route, position);
        true
    }

    /// Switch `id` to an existing route.
    pub fn replace_route(&mut self, id: &str, route: Arc<Route>, on_init: bool) -> bool {
        let Some(v) = self.micro_mut(id) else {
            return false;
        };
        let Some(position) = position_on(v, &route, on_init, 0) else {
            return false;
        };
        adopt_route(v, route, position);
        true
    }

    /// Route `id` to `dest` by travel time.
    pub fn change_target(&mut self, id: &str, dest: EdgeId) -> bool {
        self.route_to(id, Some(dest), WeightKind::TravelTime)
    }

    /// Recompute the path to the current destination.
    pub fn reroute(&mut self, id: &str, kind: WeightKind) -> bool {
        self.route_to(id, None, kind)
    }

    fn route_to(&mut self, id: &str, dest: Option<EdgeId>, kind: WeightKind) -> bool {
        let Some(v) = self.micro(id) else {
            return false;
        };
        let Some(origin) = v.reroute_origin(self.on_internal(v)) else {
            return false;
        };
        let Some(dest) = dest.or_else(|| v.route.edges.last().copied()) else {
            return false;
        };
        let on_init = v.lane.is_none();
        let edges = self
            .router(kind)
            .compute(&self.net, origin, dest, &self.view(v), self.time)
            .unwrap_or_default();
        self.replace_route_edges(id, edges, on_init)
    }

    /// Add or update a stop. The message describes why it was refused.
    pub fn add_stop(
        &mut self,
        id: &str,
        lane: LaneId,
        pos: f64,
        duration: SimTime,
        parking: bool,
        triggered: bool,
    ) -> Result<(), String> {
        let l = self.net.lane(lane);
        let Some(v) = self.vehicles.get_mut(id).and_then(Vehicle::as_micro_mut) else {
            return Err(format!("Vehicle '{id}' is not known"));
        };
        if !v.will_pass(l.edge) {
            return Err(format!(
                "Stop for vehicle '{id}' on lane '{}' is not downstream the current route.",
                l.id
            ));
        }
        if pos > l.length {
            return Err(format!(
                "Stop position {pos} for vehicle '{id}' lies beyond the end of lane '{}'.",
                l.id
            ));
        }
        if let Some(s) = v.stops.iter_mut().find(|s| s.lane == lane && s.end_pos == pos) {
            s.duration = duration;
            s.parking = parking;
            s.triggered = triggered;
            return Ok(());
        }
        let route = Arc::clone(&v.route);
        let rank = |edge: EdgeId, pos: f64| {
            let idx = route
                .edges
                .iter()
                .skip(v.route_position)
                .position(|e| *e == edge)
                .unwrap_or(usize::MAX);
            (idx, pos)
        };
        let key = rank(l.edge, pos);
        let at = v
            .stops
            .iter()
            .position(|s| {
                let k = rank(s.edge, s.end_pos);
                k.0 > key.0 || (k.0 == key.0 && k.1 > key.1)
            })
            .unwrap_or(v.stops.len());
        v.stops.insert(
            at,
            Stop {
                lane,
                edge: l.edge,
                start_pos: pos,
                end_pos: pos,
                duration,
                parking,
                triggered,
                reached: false,
                until: None,
            },
        );
        Ok(())
    }

    /// Teleport `id` forward along its route onto `lane`.
    pub fn move_to(&mut self, id: &str, lane: LaneId, pos: f64) {
        let edge = self.net.lane(lane).edge;
        let net = &self.net;
        let Some(v) = self.vehicles.get_mut(id).and_then(Vehicle::as_micro_mut) else {
            return;
        };
        while v.current_edge() != Some(edge) {
            if v.route_position + 1 >= v.route.edges.len() {
                tracing::debug!(vehicle = %id, "moveTo ran past the route end");
                v.lane = None;
                v.removal = Some(Notification::TeleportArrived);
                return;
            }
            v.route_position += 1;
        }
        place(net, v, lane, pos);
        if !v.departed {
            // moved onto the road before its depart time counts as inserted
            v.departed = true;
            self.insertion.retain(|pending| pending != id);
            tracing::debug!(vehicle = %id, "vehicle inserted by moveTo");
        }
    }

    /// Mark `id` for removal at the end of the step. `false` if nothing was done.
    pub fn schedule_removal(&mut self, id: &str, reason: Notification) -> bool {
        let Some(v) = self.micro_mut(id) else {
            return false;
        };
        if !v.departed || v.removal.is_some() {
            return false;
        }
        v.removal = Some(reason);
        v.lane = None;
        true
    }

    /// Advance to `target` (ms). A target not after the current time runs one step.
    pub fn step(&mut self, target: SimTime) -> u32 {
        let mut steps = 0;
        loop {
            self.advance();
            steps += 1;
            if self.time >= target {
                break;
            }
        }
        tracing::debug!(time = self.time, steps, "simulation advanced");
        steps
    }

    fn advance(&mut self) {
        self.time = self.time.saturating_add(self.delta_t);
        self.insert_due();
        self.apply_influence();
        self.purge_removed();
    }

    fn insert_due(&mut self) {
        let now = self.time;
        let mut waiting = VecDeque::new();
        while let Some(id) = self.insertion.pop_front() {
            let due = match self.vehicles.get(&id) {
                Some(Vehicle::Micro(v)) => is_due(v.params.depart, now),
                Some(Vehicle::Meso(v)) => is_due(v.params.depart, now),
                None => continue,
            };
            if due {
                self.insert_vehicle(&id);
            } else {
                waiting.push_back(id);
            }
        }
        self.insertion = waiting;
    }

    fn insert_vehicle(&mut self, id: &str) {
        let net = &self.net;
        let types = &self.types;
        match self.vehicles.get_mut(id) {
            Some(Vehicle::Micro(v)) => {
                let Some(first) = v.route.edges.first().copied() else {
                    return;
                };
                let lanes = &net.edge(first).lanes;
                let idx = match v.params.depart_lane {
                    DepartLane::Given(i) => i as usize,
                    _ => 0,
                };
                let Some(lane) = lanes.get(idx).or(lanes.first()).copied() else {
                    return;
                };
                let l = net.lane(lane);
                let pos = match v.params.depart_pos {
                    DepartPos::Given(p) if p < 0.0 => l.length + p,
                    DepartPos::Given(p) => p,
                    _ => 0.0,
                };
                let vmax = types.get(&v.type_id).map_or(f64::MAX, |t| t.max_speed);
                let speed = match v.params.depart_speed {
                    DepartSpeed::Given(s) => s,
                    DepartSpeed::Max => l.max_speed.min(vmax),
                    _ => 0.0,
                };
                v.route_position = 0;
                place(net, v, lane, pos);
                v.speed = speed;
                v.speed_without_influence = speed;
                v.departed = true;
                tracing::debug!(vehicle = %id, lane = %l.id, "vehicle inserted");
            }
            Some(Vehicle::Meso(v)) => v.departed = true,
            None => {}
        }
    }

    fn apply_influence(&mut self) {
        let now = self.time;
        let dt_secs = self.delta_t as f64 / 1000.0;
        let net = &self.net;
        let routes = &mut self.routes;
        for vehicle in self.vehicles.vehicles.values_mut() {
            let Vehicle::Micro(v) = vehicle else {
                continue;
            };
            if v.removal.is_some() {
                continue;
            }
            if let Some(p) = v.influencer.placement.take() {
                apply_placement(net, routes, v, p);
            }
            if v.lane.is_none() {
                continue;
            }
            if let Some(s) = v.influencer.speed_at(now) {
                v.speed = s;
            }
            let (lane, pos) = (v.lane, v.pos_on_lane);
            let mut leave = false;
            if let Some(stop) = v.stops.front_mut() {
                if !stop.reached
                    && Some(stop.lane) == lane
                    && (pos - stop.end_pos).abs() <= STOP_TOLERANCE
                {
                    stop.reached = true;
                    stop.until = (!stop.triggered).then(|| now.saturating_add(stop.duration));
                } else if stop.reached && stop.until.is_some_and(|t| now >= t) {
                    leave = true;
                }
            }
            if leave {
                v.stops.pop_front();
            }
            if v.is_stopped() {
                v.speed = 0.0;
            }
            if v.speed < HALTING_SPEED {
                v.waiting_time += dt_secs;
            } else {
                v.waiting_time = 0.0;
            }
        }
    }

    fn purge_removed(&mut self) {
        let before = self.vehicles.len();
        self.vehicles
            .vehicles
            .retain(|_, v| !matches!(v, Vehicle::Micro(m) if m.removal.is_some()));
        let purged = before - self.vehicles.len();
        if purged > 0 {
            tracing::debug!(purged, "removed vehicles purged");
        }
    }

    /// Give `id` a type of its own so type changes do not leak to others.
    pub fn singular_type(&mut self, id: &str) -> Result<String, SimError> {
        let Some(v) = self.vehicles.get_mut(id).and_then(Vehicle::as_micro_mut) else {
            return Err(SimError::UnknownVehicle(id.to_string()));
        };
        let new_id = self.types.singular_for(&v.type_id, id)?;
        v.type_id = new_id.clone();
        Ok(new_id)
    }
}
