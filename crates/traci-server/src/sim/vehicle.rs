//! Vehicles as seen by the protocol layer.
//!
//! Kinematic and emission fields are plain data owned by the physics step;
//! the protocol only reads them or steers them through the [`Influencer`].

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use super::geom::Position;
use super::network::{EdgeId, LaneId};
use super::params::VehicleParams;
use super::route::Route;
use super::weights::EdgeWeights;
use super::SimTime;

/// Why a vehicle leaves the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    Arrived,
    Vaporized,
    TeleportArrived,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Emissions {
    pub co2: f64,
    pub co: f64,
    pub hc: f64,
    pub pmx: f64,
    pub nox: f64,
    pub fuel: f64,
    pub noise: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub lane: LaneId,
    pub edge: EdgeId,
    pub start_pos: f64,
    pub end_pos: f64,
    pub duration: SimTime,
    pub parking: bool,
    pub triggered: bool,
    pub reached: bool,
    /// Departure time once reached; `None` for triggered stops.
    pub until: Option<SimTime>,
}

/// Speed mode bits as sent by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedMode {
    pub consider_safe_velocity: bool,
    pub consider_max_accel: bool,
    pub consider_max_decel: bool,
    pub respect_junction_priority: bool,
    pub emergency_brake_red_light: bool,
}

impl SpeedMode {
    pub fn from_bits(bits: i32) -> Self {
        Self {
            consider_safe_velocity: bits & 1 != 0,
            consider_max_accel: bits & 2 != 0,
            consider_max_decel: bits & 4 != 0,
            respect_junction_priority: bits & 8 != 0,
            emergency_brake_red_light: bits & 16 != 0,
        }
    }

    pub fn bits(&self) -> i32 {
        i32::from(self.consider_safe_velocity)
            | i32::from(self.consider_max_accel) << 1
            | i32::from(self.consider_max_decel) << 2
            | i32::from(self.respect_junction_priority) << 3
            | i32::from(self.emergency_brake_red_light) << 4
    }
}

impl Default for SpeedMode {
    fn default() -> Self {
        Self::from_bits(31)
    }
}

/// Externally dictated position, applied on the next simulation step.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub lane: LaneId,
    pub lane_pos: f64,
    pub route_offset: usize,
    /// Replacement route fragment when the lane is off the current route.
    pub edges: Vec<EdgeId>,
    pub time: SimTime,
}

/// Overrides installed by the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct Influencer {
    pub speed_timeline: Vec<(SimTime, f64)>,
    pub lane_timeline: Vec<(SimTime, u32)>,
    pub speed_mode: SpeedMode,
    pub lane_change_mode: i32,
    pub placement: Option<Placement>,
}

pub const DEFAULT_LANE_CHANGE_MODE: i32 = 0b0110_0101_0101;

impl Default for Influencer {
    fn default() -> Self {
        Self {
            speed_timeline: Vec::new(),
            lane_timeline: Vec::new(),
            speed_mode: SpeedMode::default(),
            lane_change_mode: DEFAULT_LANE_CHANGE_MODE,
            placement: None,
        }
    }
}

impl Influencer {
    /// Value of the speed time-line active at `now`, if any.
    pub fn speed_at(&self, now: SimTime) -> Option<f64> {
        let (first, last) = (self.speed_timeline.first()?, self.speed_timeline.last()?);
        if now < first.0 || now > last.0 {
            return None;
        }
        let next = self.speed_timeline.iter().position(|(t, _)| *t >= now)?;
        if next == 0 {
            return Some(first.1);
        }
        let (t0, v0) = self.speed_timeline[next - 1];
        let (t1, v1) = self.speed_timeline[next];
        if t1 == t0 {
            return Some(v1);
        }
        Some(v0 + (v1 - v0) * (now - t0) as f64 / (t1 - t0) as f64)
    }
}

#[derive(Debug, Clone)]
pub struct MicroVehicle {
    pub params: VehicleParams,
    pub type_id: String,
    pub route: Arc<Route>,
    /// Index of the current edge within `route`.
    pub route_position: usize,
    /// `None` while not on the road.
    pub lane: Option<LaneId>,
    pub pos_on_lane: f64,
    pub speed: f64,
    pub speed_without_influence: f64,
    pub position: Position,
    pub angle: f64,
    pub signals: i32,
    /// Seconds spent standing.
    pub waiting_time: f64,
    pub chosen_speed_factor: f64,
    pub emissions: Emissions,
    pub stops: VecDeque<Stop>,
    pub influencer: Influencer,
    pub weights: EdgeWeights,
    pub departed: bool,
    pub reroutes: u32,
    pub removal: Option<Notification>,
    pub extra: BTreeMap<String, String>,
}

impl MicroVehicle {
    pub fn new(params: VehicleParams, type_id: String, route: Arc<Route>) -> Self {
        Self {
            params,
            type_id,
            route,
            route_position: 0,
            lane: None,
            pos_on_lane: 0.0,
            speed: 0.0,
            speed_without_influence: 0.0,
            position: Position::default(),
            angle: 0.0,
            signals: 0,
            waiting_time: 0.0,
            chosen_speed_factor: 1.0,
            emissions: Emissions::default(),
            stops: VecDeque::new(),
            influencer: Influencer::default(),
            weights: EdgeWeights::default(),
            departed: false,
            reroutes: 0,
            removal: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.params.id
    }

    pub fn is_on_road(&self) -> bool {
        self.lane.is_some() && self.removal.is_none()
    }

    /// Edge the vehicle's route currently points at.
    pub fn current_edge(&self) -> Option<EdgeId> {
        self.route.edges.get(self.route_position).copied()
    }

    /// First edge a new route may start from.
    pub fn reroute_origin(&self, on_internal: bool) -> Option<EdgeId> {
        if on_internal {
            if let Some(next) = self.route.edges.get(self.route_position + 1) {
                return Some(*next);
            }
        }
        self.current_edge()
    }

    /// True if `edge` lies on the remaining route.
    pub fn will_pass(&self, edge: EdgeId) -> bool {
        self.route
            .edges
            .iter()
            .skip(self.route_position)
            .any(|e| *e == edge)
    }

    pub fn is_stopped(&self) -> bool {
        self.stops.front().is_some_and(|s| s.reached)
    }

    pub fn is_parking(&self) -> bool {
        self.stops.front().is_some_and(|s| s.reached && s.parking)
    }

    pub fn is_stopped_triggered(&self) -> bool {
        self.stops.front().is_some_and(|s| s.reached && s.triggered)
    }

    /// Bits: 1 stopped, 2 parking, 4 triggered.
    pub fn stop_state(&self) -> u8 {
        u8::from(self.is_stopped())
            | u8::from(self.is_parking()) << 1
            | u8::from(self.is_stopped_triggered()) << 2
    }

    /// Leaves a reached stop. `false` if the next stop was not reached yet.
    pub fn resume_from_stopping(&mut self) -> bool {
        if self.is_stopped() {
            self.stops.pop_front();
            true
        } else {
            false
        }
    }

    pub fn switch_off_signal(&mut self, mask: i32) {
        self.signals &= !mask;
    }

    pub fn switch_on_signal(&mut self, mask: i32) {
        self.signals |= mask;
    }
}

/// Vehicle handled by the mesoscopic (queue based) model.
#[derive(Debug, Clone)]
pub struct MesoVehicle {
    pub params: VehicleParams,
    pub type_id: String,
    pub route: Arc<Route>,
    pub departed: bool,
}

#[derive(Debug, Clone)]
pub enum Vehicle {
    Micro(MicroVehicle),
    Meso(MesoVehicle),
}

impl Vehicle {
    pub fn id(&self) -> &str {
        match self {
            Vehicle::Micro(v) => &v.params.id,
            Vehicle::Meso(v) => &v.params.id,
        }
    }

    pub fn is_on_road(&self) -> bool {
        match self {
            Vehicle::Micro(v) => v.is_on_road(),
            Vehicle::Meso(v) => v.departed,
        }
    }

    pub fn as_micro(&self) -> Option<&MicroVehicle> {
        match self {
            Vehicle::Micro(v) => Some(v),
            Vehicle::Meso(_) => None,
        }
    }

    pub fn as_micro_mut(&mut self) -> Option<&mut MicroVehicle> {
        match self {
            Vehicle::Micro(v) => Some(v),
            Vehicle::Meso(_) => None,
        }
    }
}
