//! Vehicle domain (`0xa4` / `0xc4`).
//!
//! Variables are closed enumerations; anything the vehicle domain does not
//! know itself is forwarded to the vehicle type of the addressed vehicle.

mod get;
mod set;

use num_enum::TryFromPrimitive;

use traci_core::error::{Result, TraciError};
use traci_core::protocol::constants::*;
use traci_core::protocol::{Reader, TypedValue};

use crate::dispatch::DomainService;
use crate::services::vehicle_type::TypeVariable;
use crate::sim::vehicle::MicroVehicle;
use crate::sim::Simulation;

/// Placement tolerance used when none is configured.
pub const DEFAULT_MAX_ROUTE_DISTANCE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum GetVariable {
    IdList = ID_LIST,
    IdCount = ID_COUNT,
    Speed = VAR_SPEED,
    SpeedWithoutTraci = VAR_SPEED_WITHOUT_TRACI,
    Position = VAR_POSITION,
    Position3D = VAR_POSITION3D,
    Angle = VAR_ANGLE,
    RoadId = VAR_ROAD_ID,
    LaneId = VAR_LANE_ID,
    LaneIndex = VAR_LANE_INDEX,
    TypeId = VAR_TYPE,
    RouteId = VAR_ROUTE_ID,
    Color = VAR_COLOR,
    LanePosition = VAR_LANEPOSITION,
    Co2Emission = VAR_CO2EMISSION,
    CoEmission = VAR_COEMISSION,
    HcEmission = VAR_HCEMISSION,
    PmxEmission = VAR_PMXEMISSION,
    NoxEmission = VAR_NOXEMISSION,
    FuelConsumption = VAR_FUELCONSUMPTION,
    NoiseEmission = VAR_NOISEEMISSION,
    PersonNumber = VAR_PERSON_NUMBER,
    Leader = VAR_LEADER,
    WaitingTime = VAR_WAITING_TIME,
    EdgeTravelTime = VAR_EDGE_TRAVELTIME,
    EdgeEffort = VAR_EDGE_EFFORT,
    RouteValid = VAR_ROUTE_VALID,
    Edges = VAR_EDGES,
    Signals = VAR_SIGNALS,
    BestLanes = VAR_BEST_LANES,
    StopState = VAR_STOPSTATE,
    Distance = VAR_DISTANCE,
    DistanceRequest = DISTANCE_REQUEST,
    AllowedSpeed = VAR_ALLOWED_SPEED,
    SpeedFactor = VAR_SPEED_FACTOR,
    Parameter = VAR_PARAMETER,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum SetVariable {
    Stop = CMD_STOP,
    ChangeLane = CMD_CHANGELANE,
    SlowDown = CMD_SLOWDOWN,
    Resume = CMD_RESUME,
    ChangeTarget = CMD_CHANGETARGET,
    TypeId = VAR_TYPE,
    RouteId = VAR_ROUTE_ID,
    Route = VAR_ROUTE,
    EdgeTravelTime = VAR_EDGE_TRAVELTIME,
    EdgeEffort = VAR_EDGE_EFFORT,
    RerouteTravelTime = CMD_REROUTE_TRAVELTIME,
    RerouteEffort = CMD_REROUTE_EFFORT,
    Signals = VAR_SIGNALS,
    MoveTo = VAR_MOVE_TO,
    Speed = VAR_SPEED,
    SpeedMode = VAR_SPEEDSETMODE,
    LaneChangeMode = VAR_LANECHANGE_MODE,
    Color = VAR_COLOR,
    Add = ADD,
    AddFull = ADD_FULL,
    Remove = REMOVE,
    MoveToVtd = VAR_MOVE_TO_VTD,
    SpeedFactor = VAR_SPEED_FACTOR,
    Parameter = VAR_PARAMETER,
}

/// Resolve `id` to a vehicle the micro model drives.
pub(crate) fn lookup<'a>(sim: &'a Simulation, id: &str) -> Result<&'a MicroVehicle> {
    sim.vehicles
        .get(id)
        .ok_or_else(|| not_known(id))?
        .as_micro()
        .ok_or_else(|| not_micro(id))
}

pub(crate) fn lookup_mut<'a>(sim: &'a mut Simulation, id: &str) -> Result<&'a mut MicroVehicle> {
    sim.vehicles
        .get_mut(id)
        .ok_or_else(|| not_known(id))?
        .as_micro_mut()
        .ok_or_else(|| not_micro(id))
}

fn not_known(id: &str) -> TraciError {
    TraciError::validation(format!("Vehicle '{id}' is not known"))
}

fn not_micro(id: &str) -> TraciError {
    TraciError::domain(format!("Vehicle '{id}' is not a micro-simulation vehicle"))
}

#[derive(Debug, Clone)]
pub struct VehicleService {
    max_route_distance: f64,
}

impl Default for VehicleService {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ROUTE_DISTANCE)
    }
}

impl VehicleService {
    /// `max_route_distance` bounds how far a free-form placement may lie
    /// from the lane it is snapped onto.
    pub fn new(max_route_distance: f64) -> Self {
        Self { max_route_distance }
    }
}

impl DomainService for VehicleService {
    fn label(&self) -> &'static str {
        "Vehicle"
    }

    fn get_command(&self) -> u8 {
        CMD_GET_VEHICLE_VARIABLE
    }

    fn set_command(&self) -> u8 {
        CMD_SET_VEHICLE_VARIABLE
    }

    fn response_command(&self) -> u8 {
        RESPONSE_GET_VEHICLE_VARIABLE
    }

    fn supports_get(&self, variable: u8) -> bool {
        GetVariable::try_from(variable).is_ok() || TypeVariable::try_from(variable).is_ok()
    }

    fn supports_set(&self, variable: u8) -> bool {
        SetVariable::try_from(variable).is_ok() || TypeVariable::try_from(variable).is_ok()
    }

    fn process_get(
        &self,
        sim: &Simulation,
        variable: u8,
        id: &str,
        params: &mut Reader,
    ) -> Result<TypedValue> {
        match GetVariable::try_from(variable) {
            Ok(GetVariable::IdList) => return Ok(TypedValue::StringList(sim.vehicles.on_road_ids())),
            Ok(GetVariable::IdCount) => {
                return Ok(TypedValue::Int(sim.vehicles.on_road_ids().len() as i32))
            }
            _ => {}
        }
        let v = lookup(sim, id)?;
        if let Ok(var) = GetVariable::try_from(variable) {
            return get::get_variable(sim, v, var, params);
        }
        let var = TypeVariable::try_from(variable).map_err(|_| {
            TraciError::validation("Get Vehicle Variable: unsupported variable specified")
        })?;
        get::get_type_fallback(sim, v, var)
    }

    fn process_set(
        &self,
        sim: &mut Simulation,
        variable: u8,
        id: &str,
        params: &mut Reader,
    ) -> Result<()> {
        let var = SetVariable::try_from(variable).ok();
        match var {
            Some(SetVariable::Add) => return set::add(sim, id, params),
            Some(SetVariable::AddFull) => return set::add_full(sim, id, params),
            _ => {}
        }
        lookup(sim, id)?;
        match var {
            Some(var) => set::set_variable(sim, id, var, params, self.max_route_distance),
            None => {
                let var = TypeVariable::try_from(variable).map_err(|_| {
                    TraciError::validation("Change Vehicle State: unsupported variable specified")
                })?;
                set::set_type_fallback(sim, id, var, params)
            }
        }
    }
}
