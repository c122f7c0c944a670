use traci_core::error::{Result, ResultExt, TraciError};
use traci_core::protocol::constants::*;
use traci_core::protocol::{Reader, TypedValue, ValueType};

use super::GetVariable;
use crate::dispatch::{field, Schema};
use crate::services::vehicle_type::{get_type_variable, TypeVariable};
use crate::sim::geom::Position;
use crate::sim::network::LaneId;
use crate::sim::vehicle::MicroVehicle;
use crate::sim::weights::WeightKind;
use crate::sim::Simulation;

const TRAVEL_TIME_QUERY: Schema = Schema {
    not_compound: "Retrieval of travel time requires a compound object.",
    bad_arity: "Retrieval of travel time requires time, and edge as parameter.",
    forms: &[&[
        field(ValueType::Int, "Retrieval of travel time requires the referenced time as first parameter."),
        field(ValueType::String, "Retrieval of travel time requires the referenced edge as second parameter."),
    ]],
};

const EFFORT_QUERY: Schema = Schema {
    not_compound: "Retrieval of effort requires a compound object.",
    bad_arity: "Retrieval of effort requires time, and edge as parameter.",
    forms: &[&[
        field(ValueType::Int, "Retrieval of effort requires the referenced time as first parameter."),
        field(ValueType::String, "Retrieval of effort requires the referenced edge as second parameter."),
    ]],
};

fn on_road_double(v: &MicroVehicle, value: f64) -> TypedValue {
    TypedValue::Double(if v.is_on_road() { value } else { INVALID_DOUBLE_VALUE })
}

pub(super) fn get_variable(
    sim: &Simulation,
    v: &MicroVehicle,
    var: GetVariable,
    params: &mut Reader,
) -> Result<TypedValue> {
    let net = &sim.net;
    let lane = v.lane.filter(|_| v.is_on_road()).map(|l| net.lane(l));
    Ok(match var {
        GetVariable::IdList | GetVariable::IdCount => {
            return Err(TraciError::Internal("id queries are answered by the service".into()))
        }
        GetVariable::Speed => on_road_double(v, v.speed),
        GetVariable::SpeedWithoutTraci => on_road_double(v, v.speed_without_influence),
        GetVariable::Position => match lane {
            Some(_) => TypedValue::Position2D { x: v.position.x, y: v.position.y },
            None => TypedValue::Position2D { x: INVALID_DOUBLE_VALUE, y: INVALID_DOUBLE_VALUE },
        },
        GetVariable::Position3D => match lane {
            Some(_) => TypedValue::Position3D { x: v.position.x, y: v.position.y, z: v.position.z },
            None => TypedValue::Position3D {
                x: INVALID_DOUBLE_VALUE,
                y: INVALID_DOUBLE_VALUE,
                z: INVALID_DOUBLE_VALUE,
            },
        },
        GetVariable::Angle => on_road_double(v, v.angle),
        GetVariable::RoadId => {
            TypedValue::String(lane.map(|l| net.edge(l.edge).id.clone()).unwrap_or_default())
        }
        GetVariable::LaneId => TypedValue::String(lane.map(|l| l.id.clone()).unwrap_or_default()),
        GetVariable::LaneIndex => {
            TypedValue::Int(lane.map_or(INVALID_INT_VALUE, |l| l.index as i32))
        }
        GetVariable::TypeId => TypedValue::String(v.type_id.clone()),
        GetVariable::RouteId => TypedValue::String(v.route.id.clone()),
        GetVariable::Color => TypedValue::Color(v.params.color),
        GetVariable::LanePosition => on_road_double(v, v.pos_on_lane),
        GetVariable::Co2Emission => on_road_double(v, v.emissions.co2),
        GetVariable::CoEmission => on_road_double(v, v.emissions.co),
        GetVariable::HcEmission => on_road_double(v, v.emissions.hc),
        GetVariable::PmxEmission => on_road_double(v, v.emissions.pmx),
        GetVariable::NoxEmission => on_road_double(v, v.emissions.nox),
        GetVariable::FuelConsumption => on_road_double(v, v.emissions.fuel),
        GetVariable::NoiseEmission => on_road_double(v, v.emissions.noise),
        GetVariable::PersonNumber => TypedValue::Int(v.params.person_number),
        GetVariable::Leader => {
            let dist = params
                .read_typed_double()
                .or_invalid("Leader retrieval requires a double.")?;
            let (leader, gap) = sim.leader(v, dist);
            TypedValue::Compound(vec![
                TypedValue::String(leader.unwrap_or_default()),
                TypedValue::Double(gap),
            ])
        }
        GetVariable::WaitingTime => TypedValue::Double(v.waiting_time),
        GetVariable::EdgeTravelTime => edge_weight(sim, v, WeightKind::TravelTime, params)?,
        GetVariable::EdgeEffort => edge_weight(sim, v, WeightKind::Effort, params)?,
        GetVariable::RouteValid => TypedValue::UByte(u8::from(sim.has_valid_route(v))),
        GetVariable::Edges => TypedValue::StringList(
            v.route.edges.iter().map(|e| net.edge(*e).id.clone()).collect(),
        ),
        GetVariable::Signals => TypedValue::Int(v.signals),
        GetVariable::BestLanes => best_lanes(sim, v),
        GetVariable::StopState => TypedValue::UByte(v.stop_state()),
        GetVariable::Distance => TypedValue::Double(
            sim.route_distance(v)
                .filter(|_| v.is_on_road())
                .unwrap_or(INVALID_DOUBLE_VALUE),
        ),
        GetVariable::DistanceRequest => distance_request(sim, v, params)?,
        GetVariable::AllowedSpeed => TypedValue::Double(
            sim.allowed_speed(v)
                .filter(|_| v.is_on_road())
                .unwrap_or(INVALID_DOUBLE_VALUE),
        ),
        GetVariable::SpeedFactor => TypedValue::Double(v.chosen_speed_factor),
        GetVariable::Parameter => {
            let name = params
                .read_typed_string()
                .or_invalid("Retrieval of a parameter requires its name.")?;
            TypedValue::String(v.extra.get(&name).cloned().unwrap_or_default())
        }
    })
}

pub(super) fn get_type_fallback(
    sim: &Simulation,
    v: &MicroVehicle,
    var: TypeVariable,
) -> Result<TypedValue> {
    let t = sim.types.get(&v.type_id).ok_or_else(|| {
        TraciError::Internal(format!("type '{}' of vehicle '{}' is missing", v.type_id, v.id()))
    })?;
    Ok(get_type_variable(t, var))
}

fn edge_weight(
    sim: &Simulation,
    v: &MicroVehicle,
    kind: WeightKind,
    params: &mut Reader,
) -> Result<TypedValue> {
    let schema = match kind {
        WeightKind::TravelTime => &TRAVEL_TIME_QUERY,
        WeightKind::Effort => &EFFORT_QUERY,
    };
    let args = schema.read(params)?;
    let time = args.int(0)?;
    let name = args.string(1)?;
    let edge = sim
        .net
        .edge_by_name(name)
        .ok_or_else(|| TraciError::validation(format!("Referenced edge '{name}' is not known.")))?;
    let value = v
        .weights
        .table(kind)
        .retrieve(edge, i64::from(time))
        .unwrap_or(INVALID_DOUBLE_VALUE);
    Ok(TypedValue::Double(value))
}

fn best_lanes(sim: &Simulation, v: &MicroVehicle) -> TypedValue {
    let lanes = sim.best_lanes(v);
    let lane_id = |l: LaneId| sim.net.lane(l).id.clone();
    let mut items = Vec::with_capacity(1 + lanes.len() * 6);
    items.push(TypedValue::Int(lanes.len() as i32));
    for b in lanes {
        items.push(TypedValue::String(lane_id(b.lane)));
        items.push(TypedValue::Double(b.length));
        items.push(TypedValue::Double(b.occupation));
        items.push(TypedValue::Byte(b.offset));
        items.push(TypedValue::UByte(u8::from(b.allows_continuation)));
        items.push(TypedValue::StringList(
            b.continuations.into_iter().map(lane_id).collect(),
        ));
    }
    TypedValue::Compound(items)
}

/// Resolve a road map position to a lane, checking index and offset.
fn lane_checking(sim: &Simulation, edge_id: &str, index: u8, pos: f64) -> Result<LaneId> {
    let edge = sim
        .net
        .edge_by_name(edge_id)
        .ok_or_else(|| TraciError::validation(format!("Unknown edge {edge_id}")))?;
    let lane = sim
        .net
        .edge(edge)
        .lanes
        .get(usize::from(index))
        .copied()
        .ok_or_else(|| TraciError::validation(format!("Invalid lane index for {edge_id}")))?;
    if pos < 0.0 || pos > sim.net.lane(lane).length {
        return Err(TraciError::validation("Position on lane invalid"));
    }
    Ok(lane)
}

fn distance_request(sim: &Simulation, v: &MicroVehicle, params: &mut Reader) -> Result<TypedValue> {
    let count = params
        .read_compound_header()
        .or_invalid("Retrieval of distance requires a compound object.")?;
    if count != 2 {
        return Err(TraciError::validation(
            "Retrieval of distance requires position and distance type as parameter.",
        ));
    }
    const UNKNOWN_FORMAT: &str = "Unknown position format used for distance request";
    let target = TypedValue::decode(params).or_invalid(UNKNOWN_FORMAT)?;
    let (lane, lane_pos, pos) = match target {
        TypedValue::RoadMap { edge_id, pos, lane } => {
            let l = lane_checking(sim, &edge_id, lane, pos)?;
            (l, pos, sim.net.lane(l).shape.position_at_offset(pos))
        }
        TypedValue::Position2D { x, y } | TypedValue::Position3D { x, y, .. } => {
            let p = Position::new(x, y);
            let (l, off) = sim
                .convert_cartesian_to_roadmap(&p)
                .ok_or_else(|| TraciError::domain("No lane found for the given position"))?;
            (l, off, p)
        }
        _ => return Err(TraciError::validation(UNKNOWN_FORMAT)),
    };
    let dist_type = params.read_u8()?;

    if !v.is_on_road() {
        return Ok(TypedValue::Double(INVALID_DOUBLE_VALUE));
    }
    let distance = if dist_type == REQUEST_DRIVINGDIST {
        sim.driving_distance(v, lane, lane_pos)
            .unwrap_or(INVALID_DOUBLE_VALUE)
    } else {
        v.position.distance(&pos)
    };
    Ok(TypedValue::Double(distance))
}
