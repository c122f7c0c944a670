use traci_core::error::{Result, ResultExt, TraciError};
use traci_core::protocol::constants::*;
use traci_core::protocol::{Reader, ValueType};

use super::{lookup, lookup_mut, SetVariable};
use crate::dispatch::params::read_empty_compound;
use crate::dispatch::{field, Schema};
use crate::mapping::{map_position, RouteMatch};
use crate::services::vehicle_type::{read_type_change, TypeVariable};
use crate::sim::geom::Position;
use crate::sim::params::{
    ArrivalLane, ArrivalPos, ArrivalSpeed, DepartLane, DepartPos, DepartSpeed, DepartTime,
    VehicleParams,
};
use crate::sim::vehicle::{Notification, Placement, SpeedMode};
use crate::sim::weights::WeightKind;
use crate::sim::{SimTime, Simulation, SIMTIME_MAX};

const STOP: Schema = Schema {
    not_compound: "Stop needs a compound object description.",
    bad_arity: "Stop needs a compound object description of four of five items.",
    forms: &[
        &[
            field(ValueType::String, "The first stop parameter must be the edge id given as a string."),
            field(ValueType::Double, "The second stop parameter must be the position along the edge given as a double."),
            field(ValueType::Byte, "The third stop parameter must be the lane index given as a byte."),
            field(ValueType::Int, "The fourth stop parameter must be the waiting time given as an integer."),
        ],
        &[
            field(ValueType::String, "The first stop parameter must be the edge id given as a string."),
            field(ValueType::Double, "The second stop parameter must be the position along the edge given as a double."),
            field(ValueType::Byte, "The third stop parameter must be the lane index given as a byte."),
            field(ValueType::Int, "The fourth stop parameter must be the waiting time given as an integer."),
            field(ValueType::Byte, "The fifth stop parameter must be a byte indicating its parking/triggered status."),
        ],
    ],
};

const CHANGE_LANE: Schema = Schema {
    not_compound: "Lane change needs a compound object description.",
    bad_arity: "Lane change needs a compound object description of two items.",
    forms: &[&[
        field(ValueType::Byte, "The first lane change parameter must be the lane index given as a byte."),
        field(ValueType::Int, "The second lane change parameter must be the duration given as an integer."),
    ]],
};

const SLOW_DOWN: Schema = Schema {
    not_compound: "Slow down needs a compound object description.",
    bad_arity: "Slow down needs a compound object description of two items.",
    forms: &[&[
        field(ValueType::Double, "The first slow down parameter must be the speed given as a double."),
        field(ValueType::Int, "The second slow down parameter must be the duration given as an integer."),
    ]],
};

const SET_TRAVEL_TIME: Schema = Schema {
    not_compound: "Setting travel time requires a compound object.",
    bad_arity: "Setting travel time requires 1, 2, or 4 parameters.",
    forms: &[
        &[
            field(ValueType::Int, "Setting travel time using 4 parameters requires the begin time as first parameter."),
            field(ValueType::Int, "Setting travel time using 4 parameters requires the end time as second parameter."),
            field(ValueType::String, "Setting travel time using 4 parameters requires the referenced edge as third parameter."),
            field(ValueType::Double, "Setting travel time using 4 parameters requires the travel time as double as fourth parameter."),
        ],
        &[
            field(ValueType::String, "Setting travel time using 2 parameters requires the referenced edge as first parameter."),
            field(ValueType::Double, "Setting travel time using 2 parameters requires the travel time as second parameter."),
        ],
        &[field(ValueType::String, "Setting travel time using 1 parameter requires the referenced edge as first parameter.")],
    ],
};

const SET_EFFORT: Schema = Schema {
    not_compound: "Setting effort requires a compound object.",
    bad_arity: "Setting effort requires 1, 2, or 4 parameters.",
    forms: &[
        &[
            field(ValueType::Int, "Setting effort using 4 parameters requires the begin time as first parameter."),
            field(ValueType::Int, "Setting effort using 4 parameters requires the end time as second parameter."),
            field(ValueType::String, "Setting effort using 4 parameters requires the referenced edge as third parameter."),
            field(ValueType::Double, "Setting effort using 4 parameters requires the effort as double as fourth parameter."),
        ],
        &[
            field(ValueType::String, "Setting effort using 2 parameters requires the referenced edge as first parameter."),
            field(ValueType::Double, "Setting effort using 2 parameters requires the effort as second parameter."),
        ],
        &[field(ValueType::String, "Setting effort using 1 parameter requires the referenced edge as first parameter.")],
    ],
};

const MOVE_TO: Schema = Schema {
    not_compound: "Setting position requires a compound object.",
    bad_arity: "Setting position should obtain the lane id and the position.",
    forms: &[&[
        field(ValueType::String, "The first parameter for setting a position must be the lane ID given as a string."),
        field(ValueType::Double, "The second parameter for setting a position must be the position given as a double."),
    ]],
};

const MOVE_TO_VTD: Schema = Schema {
    not_compound: "Setting VTD vehicle requires a compound object.",
    bad_arity: "Setting VTD vehicle should obtain: edgeID, lane, x, y, angle.",
    forms: &[&[
        field(ValueType::String, "The first parameter for setting a VTD vehicle must be the edge ID given as a string."),
        field(ValueType::Int, "The second parameter for setting a VTD vehicle must be the lane given as an int."),
        field(ValueType::Double, "The third parameter for setting a VTD vehicle must be the x-position given as a double."),
        field(ValueType::Double, "The fourth parameter for setting a VTD vehicle must be the y-position given as a double."),
        field(ValueType::Double, "The fifth parameter for setting a VTD vehicle must be the angle given as a double."),
    ]],
};

const ADD: Schema = Schema {
    not_compound: "Adding a vehicle requires a compound object.",
    bad_arity: "Adding a vehicle needs six parameters.",
    forms: &[&[
        field(ValueType::String, "First parameter (type) requires a string."),
        field(ValueType::String, "Second parameter (route) requires a string."),
        field(ValueType::Int, "Third parameter (depart) requires an integer."),
        field(ValueType::Double, "Fourth parameter (position) requires a double."),
        field(ValueType::Double, "Fifth parameter (speed) requires a double."),
        field(ValueType::Byte, "Sixth parameter (lane) requires a byte."),
    ]],
};

const ADD_FULL: Schema = Schema {
    not_compound: "Adding a vehicle requires a compound object.",
    bad_arity: "Adding a fully specified vehicle needs fourteen parameters.",
    forms: &[&[
        field(ValueType::String, "Second parameter (route) requires a string."),
        field(ValueType::String, "First parameter (type) requires a string."),
        field(ValueType::String, "Third parameter (depart) requires an string."),
        field(ValueType::String, "Fourth parameter (depart lane) requires a string."),
        field(ValueType::String, "Fifth parameter (depart position) requires a string."),
        field(ValueType::String, "Sixth parameter (depart speed) requires a string."),
        field(ValueType::String, "Seventh parameter (arrival lane) requires a string."),
        field(ValueType::String, "Eighth parameter (arrival position) requires a string."),
        field(ValueType::String, "Ninth parameter (arrival speed) requires a string."),
        field(ValueType::String, "Tenth parameter (from taz) requires a string."),
        field(ValueType::String, "Eleventh parameter (to taz) requires a string."),
        field(ValueType::String, "Twelth parameter (line) requires a string."),
        field(ValueType::Int, "13th parameter (person capacity) requires an int."),
        field(ValueType::Int, "14th parameter (person number) requires an int."),
    ]],
};

fn route_replacement_failed(id: &str) -> TraciError {
    TraciError::domain(format!("Route replacement failed for {id}"))
}

pub(super) fn set_variable(
    sim: &mut Simulation,
    id: &str,
    var: SetVariable,
    r: &mut Reader,
    max_route_distance: f64,
) -> Result<()> {
    match var {
        SetVariable::Stop => stop(sim, id, r),
        SetVariable::Resume => resume(sim, id, r),
        SetVariable::ChangeLane => change_lane(sim, id, r),
        SetVariable::SlowDown => slow_down(sim, id, r),
        SetVariable::ChangeTarget => change_target(sim, id, r),
        SetVariable::TypeId => {
            let type_id = r
                .read_typed_string()
                .or_invalid("The vehicle type id must be given as a string.")?;
            if !sim.types.contains(&type_id) {
                return Err(TraciError::validation(format!(
                    "The vehicle type '{type_id}' is not known."
                )));
            }
            lookup_mut(sim, id)?.type_id = type_id;
            Ok(())
        }
        SetVariable::RouteId => {
            let route_id = r
                .read_typed_string()
                .or_invalid("The route id must be given as a string.")?;
            let route = sim.routes.get(&route_id).ok_or_else(|| {
                TraciError::validation(format!("The route '{route_id}' is not known."))
            })?;
            let on_init = lookup(sim, id)?.lane.is_none();
            if !sim.replace_route(id, route, on_init) {
                return Err(route_replacement_failed(id));
            }
            Ok(())
        }
        SetVariable::Route => {
            let names = r
                .read_typed_string_list()
                .or_invalid("A route must be defined as a list of edge ids.")?;
            let edges = names
                .iter()
                .map(|n| {
                    sim.net.edge_by_name(n).ok_or_else(|| {
                        TraciError::validation(format!(
                            "The edge '{n}' within the route for vehicle '{id}' is not known."
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let on_init = lookup(sim, id)?.lane.is_none();
            if !sim.replace_route_edges(id, edges, on_init) {
                return Err(route_replacement_failed(id));
            }
            Ok(())
        }
        SetVariable::EdgeTravelTime => set_edge_weight(sim, id, WeightKind::TravelTime, r),
        SetVariable::EdgeEffort => set_edge_weight(sim, id, WeightKind::Effort, r),
        SetVariable::RerouteTravelTime => reroute(sim, id, WeightKind::TravelTime, r),
        SetVariable::RerouteEffort => reroute(sim, id, WeightKind::Effort, r),
        SetVariable::Signals => {
            let signals = r
                .read_typed_int()
                .or_invalid("Setting signals requires an integer.")?;
            let v = lookup_mut(sim, id)?;
            v.switch_off_signal(0x0fff_ffff);
            v.switch_on_signal(signals);
            Ok(())
        }
        SetVariable::MoveTo => move_to(sim, id, r),
        SetVariable::Speed => {
            let speed = r
                .read_typed_double()
                .or_invalid("Setting speed requires a double.")?;
            let (now, end) = (sim.time(), SIMTIME_MAX - sim.delta_t());
            let v = lookup_mut(sim, id)?;
            v.influencer.speed_timeline = if speed >= 0.0 {
                vec![(now, speed), (end, speed)]
            } else {
                Vec::new()
            };
            Ok(())
        }
        SetVariable::SpeedMode => {
            let bits = r
                .read_typed_int()
                .or_invalid("Setting speed mode requires an integer.")?;
            lookup_mut(sim, id)?.influencer.speed_mode = SpeedMode::from_bits(bits);
            Ok(())
        }
        SetVariable::LaneChangeMode => {
            let mode = r
                .read_typed_int()
                .or_invalid("Setting lane change mode requires an integer.")?;
            lookup_mut(sim, id)?.influencer.lane_change_mode = mode;
            Ok(())
        }
        SetVariable::Color => {
            let color = r
                .read_typed_color()
                .or_invalid("The color must be given using the according type.")?;
            lookup_mut(sim, id)?.params.color = color;
            Ok(())
        }
        SetVariable::Remove => remove(sim, id, r),
        SetVariable::MoveToVtd => move_to_vtd(sim, id, r, max_route_distance),
        SetVariable::SpeedFactor => {
            let factor = r
                .read_typed_double()
                .or_invalid("Setting speed factor requires a double.")?;
            lookup_mut(sim, id)?.chosen_speed_factor = factor;
            Ok(())
        }
        SetVariable::Parameter => {
            r.read_compound_header()
                .or_invalid("A compound object is needed for setting a parameter.")?;
            let name = r
                .read_typed_string()
                .or_invalid("The name of the parameter must be given as a string.")?;
            let value = r
                .read_typed_string()
                .or_invalid("The value of the parameter must be given as a string.")?;
            lookup_mut(sim, id)?.extra.insert(name, value);
            Ok(())
        }
        SetVariable::Add => add(sim, id, r),
        SetVariable::AddFull => add_full(sim, id, r),
    }
}

/// Type attribute set through a vehicle: the change goes to a type of the
/// vehicle's own.
pub(super) fn set_type_fallback(
    sim: &mut Simulation,
    id: &str,
    var: TypeVariable,
    r: &mut Reader,
) -> Result<()> {
    let change = read_type_change(var, r)?;
    let type_id = sim.singular_type(id)?;
    let t = sim
        .types
        .get_mut(&type_id)
        .ok_or_else(|| TraciError::Internal(format!("singular type '{type_id}' vanished")))?;
    change.apply(t);
    Ok(())
}

fn stop(sim: &mut Simulation, id: &str, r: &mut Reader) -> Result<()> {
    let args = STOP.read(r)?;
    let (road, pos, lane_index, wait) = (args.string(0)?, args.double(1)?, args.byte(2)?, args.int(3)?);
    let flags = if args.len() == 5 { args.byte(4)? } else { 0 };
    if pos < 0.0 {
        return Err(TraciError::validation("Position on lane must not be negative."));
    }
    let edge = sim
        .net
        .edge_by_name(road)
        .ok_or_else(|| TraciError::validation("Unable to retrieve road with given id."))?;
    let lane = usize::try_from(lane_index)
        .ok()
        .and_then(|i| sim.net.edge(edge).lanes.get(i).copied())
        .ok_or_else(|| {
            TraciError::validation(format!("No lane with index '{lane_index}' on road '{road}'."))
        })?;
    sim.add_stop(
        id,
        lane,
        pos,
        SimTime::from(wait),
        flags & 1 != 0,
        flags & 2 != 0,
    )
    .map_err(TraciError::domain)
}

fn resume(sim: &mut Simulation, id: &str, r: &mut Reader) -> Result<()> {
    read_empty_compound(
        r,
        "Resuming requires a compound object.",
        "Resuming should obtain an empty compound object.",
    )?;
    let v = lookup_mut(sim, id)?;
    if v.stops.is_empty() {
        return Err(TraciError::domain(format!(
            "Failed to resume vehicle '{id}', it has no stops."
        )));
    }
    if v.resume_from_stopping() {
        return Ok(());
    }
    let Some(s) = v.stops.front().cloned() else {
        return Ok(());
    };
    Err(TraciError::domain(format!(
        "Failed to resume a non parking vehicle '{id}', reached: {}, duration:{}, edge:{}, startPos: {}",
        u8::from(s.reached),
        s.duration,
        sim.net.edge(s.edge).id,
        s.start_pos
    )))
}

fn change_lane(sim: &mut Simulation, id: &str, r: &mut Reader) -> Result<()> {
    let args = CHANGE_LANE.read(r)?;
    let (index, duration) = (args.byte(0)?, args.int(1)?);
    let now = sim.time();
    let edge = lookup(sim, id)?
        .current_edge()
        .ok_or_else(|| TraciError::Internal(format!("vehicle '{id}' has an empty route")))?;
    let lane_count = sim.net.edge(edge).lanes.len();
    let index = u32::try_from(index)
        .ok()
        .filter(|i| (*i as usize) < lane_count)
        .ok_or_else(|| {
            TraciError::validation(format!(
                "No lane with index '{index}' on road '{}'.",
                sim.net.edge(edge).id
            ))
        })?;
    let v = lookup_mut(sim, id)?;
    v.influencer.lane_timeline = vec![(now, index), (now.saturating_add(duration.into()), index)];
    Ok(())
}

fn slow_down(sim: &mut Simulation, id: &str, r: &mut Reader) -> Result<()> {
    let args = SLOW_DOWN.read(r)?;
    let speed = args.double(0)?;
    if speed < 0.0 {
        return Err(TraciError::validation("Speed must not be negative"));
    }
    let duration = SimTime::from(args.int(1)?);
    let now = sim.time();
    let latest = SIMTIME_MAX - sim.delta_t();
    let end = now
        .checked_add(duration)
        .filter(|end| duration >= 0 && *end <= latest)
        .ok_or_else(|| TraciError::validation("Invalid time interval"))?;
    let v = lookup_mut(sim, id)?;
    v.influencer.speed_timeline = vec![(now, v.speed), (end, speed)];
    Ok(())
}

fn change_target(sim: &mut Simulation, id: &str, r: &mut Reader) -> Result<()> {
    let name = r.read_typed_string().or_invalid(
        "Change target requires a string containing the id of the new destination edge as parameter.",
    )?;
    let dest = sim
        .net
        .edge_by_name(&name)
        .ok_or_else(|| TraciError::validation(format!("Can not retrieve road with ID {name}")))?;
    if !sim.change_target(id, dest) {
        return Err(route_replacement_failed(id));
    }
    Ok(())
}

fn set_edge_weight(sim: &mut Simulation, id: &str, kind: WeightKind, r: &mut Reader) -> Result<()> {
    let schema = match kind {
        WeightKind::TravelTime => &SET_TRAVEL_TIME,
        WeightKind::Effort => &SET_EFFORT,
    };
    let args = schema.read(r)?;
    let name_at = if args.len() == 4 { 2 } else { 0 };
    let name = args.string(name_at)?;
    let edge = sim
        .net
        .edge_by_name(name)
        .ok_or_else(|| TraciError::validation(format!("Referenced edge '{name}' is not known.")))?;
    let table = lookup_mut(sim, id)?.weights.table_mut(kind);
    match args.len() {
        4 => {
            let (begin, end) = (SimTime::from(args.int(0)?), SimTime::from(args.int(1)?));
            table.add(edge, begin, end, args.double(3)?);
        }
        2 => {
            table.remove(edge);
            table.add(edge, 0, SIMTIME_MAX, args.double(1)?);
        }
        _ => table.remove(edge),
    }
    Ok(())
}

fn reroute(sim: &mut Simulation, id: &str, kind: WeightKind, r: &mut Reader) -> Result<()> {
    read_empty_compound(
        r,
        "Rerouting requires a compound object.",
        "Rerouting should obtain an empty compound object.",
    )?;
    if !sim.reroute(id, kind) {
        tracing::debug!(vehicle = %id, weights = kind.as_str(), "reroute kept the current route");
    }
    Ok(())
}

fn move_to(sim: &mut Simulation, id: &str, r: &mut Reader) -> Result<()> {
    let args = MOVE_TO.read(r)?;
    let (lane_name, pos) = (args.string(0)?, args.double(1)?);
    let lane = sim
        .net
        .lane_by_name(lane_name)
        .ok_or_else(|| TraciError::validation(format!("Unknown lane '{lane_name}'.")))?;
    if !lookup(sim, id)?.will_pass(sim.net.lane(lane).edge) {
        return Err(TraciError::validation(format!(
            "Vehicle '{id}' may be set onto an edge to pass only."
        )));
    }
    sim.move_to(id, lane, pos);
    Ok(())
}

fn remove(sim: &mut Simulation, id: &str, r: &mut Reader) -> Result<()> {
    let reason = r
        .read_typed_byte()
        .or_invalid("Removing a vehicle requires a byte.")?;
    let notification = match u8::try_from(reason).ok() {
        Some(REMOVE_TELEPORT) | Some(REMOVE_TELEPORT_ARRIVED) => Notification::TeleportArrived,
        Some(REMOVE_PARKING) | Some(REMOVE_ARRIVED) => Notification::Arrived,
        Some(REMOVE_VAPORIZED) => Notification::Vaporized,
        _ => return Err(TraciError::validation("Unknown removal status.")),
    };
    if !sim.schedule_removal(id, notification) {
        tracing::debug!(vehicle = %id, "removal ignored, vehicle has not departed");
    }
    Ok(())
}

fn move_to_vtd(sim: &mut Simulation, id: &str, r: &mut Reader, max_route_distance: f64) -> Result<()> {
    let args = MOVE_TO_VTD.read(r)?;
    let (edge_id, lane_num) = (args.string(0)?, args.int(1)?);
    let (x, y, mut angle) = (args.double(2)?, args.double(3)?, args.double(4)?);

    let v = lookup(sim, id)?;
    if !v.is_on_road() {
        return Ok(());
    }
    let orig_id = format!("{edge_id} {lane_num}");
    angle = -angle;
    if angle.abs() > 180.0 {
        angle = 180.0 - angle;
    }
    let found = map_position(&sim.net, v, &Position::new(x, y), &orig_id, angle)
        .filter(|m| max_route_distance > m.distance)
        .ok_or_else(|| TraciError::domain(format!("Could not map vehicle '{id}'.")))?;

    let (route_offset, edges) = match found.route {
        RouteMatch::Offset(n) => (n, Vec::new()),
        RouteMatch::Fragment(f) => (0, f),
    };
    let now = sim.time();
    lookup_mut(sim, id)?.influencer.placement = Some(Placement {
        lane: found.lane,
        lane_pos: found.lane_pos,
        route_offset,
        edges,
        time: now,
    });
    Ok(())
}

pub(super) fn add(sim: &mut Simulation, id: &str, r: &mut Reader) -> Result<()> {
    if sim.vehicles.contains(id) {
        return Err(TraciError::validation(format!(
            "The vehicle {id} to add already exists."
        )));
    }
    let args = ADD.read(r)?;
    let type_id = args.string(0)?;
    if !sim.types.contains(type_id) {
        return Err(TraciError::validation(format!(
            "Invalid type '{type_id}' for vehicle '{id}'"
        )));
    }
    let route_id = args.string(1)?;
    let route = sim.routes.get(route_id).ok_or_else(|| {
        TraciError::validation(format!("Invalid route '{route_id}' for vehicle: '{id}'"))
    })?;
    let depart = DepartTime::from_sentinel(args.int(2)?)
        .ok_or_else(|| TraciError::validation("Invalid departure time."))?;
    if matches!(depart, DepartTime::At(t) if t < sim.time()) {
        return Err(TraciError::validation("Departure time in the past."));
    }
    let mut params = VehicleParams::new(id, depart);
    params.depart_pos = DepartPos::from_sentinel(args.double(3)?)
        .ok_or_else(|| TraciError::validation("Invalid departure position."))?;
    params.depart_speed = DepartSpeed::from_sentinel(args.double(4)?)
        .ok_or_else(|| TraciError::validation("Invalid departure speed."))?;
    params.depart_lane = DepartLane::from_sentinel(args.byte(5)?)
        .ok_or_else(|| TraciError::validation("Invalid departure lane."))?;

    let type_id = type_id.to_string();
    sim.build_vehicle(params, &type_id, route)?;
    Ok(())
}

fn invalid_definition(what: &str, value: &str, id: &str) -> TraciError {
    TraciError::validation(format!("Invalid {what} definition '{value}' for vehicle '{id}'."))
}

pub(super) fn add_full(sim: &mut Simulation, id: &str, r: &mut Reader) -> Result<()> {
    if sim.vehicles.contains(id) {
        return Err(TraciError::validation(format!(
            "The vehicle {id} to add already exists."
        )));
    }
    let args = ADD_FULL.read(r)?;
    let route_id = args.string(0)?;
    let route = sim.routes.get(route_id).ok_or_else(|| {
        TraciError::validation(format!("Invalid route '{route_id}' for vehicle: '{id}'"))
    })?;
    let type_id = args.string(1)?;
    if !sim.types.contains(type_id) {
        return Err(TraciError::validation(format!(
            "Invalid type '{type_id}' for vehicle '{id}'"
        )));
    }

    let text = args.string(2)?;
    let depart = DepartTime::parse(text).ok_or_else(|| invalid_definition("depart", text, id))?;
    if matches!(depart, DepartTime::At(t) if t < sim.time()) {
        return Err(TraciError::validation("Departure time in the past."));
    }
    let mut params = VehicleParams::new(id, depart);
    let text = args.string(3)?;
    params.depart_lane =
        DepartLane::parse(text).ok_or_else(|| invalid_definition("departLane", text, id))?;
    let text = args.string(4)?;
    params.depart_pos =
        DepartPos::parse(text).ok_or_else(|| invalid_definition("departPos", text, id))?;
    let text = args.string(5)?;
    params.depart_speed =
        DepartSpeed::parse(text).ok_or_else(|| invalid_definition("departSpeed", text, id))?;
    let text = args.string(6)?;
    params.arrival_lane =
        ArrivalLane::parse(text).ok_or_else(|| invalid_definition("arrivalLane", text, id))?;
    let text = args.string(7)?;
    params.arrival_pos =
        ArrivalPos::parse(text).ok_or_else(|| invalid_definition("arrivalPos", text, id))?;
    let text = args.string(8)?;
    params.arrival_speed =
        ArrivalSpeed::parse(text).ok_or_else(|| invalid_definition("arrivalSpeed", text, id))?;
    params.from_taz = args.string(9)?.to_string();
    params.to_taz = args.string(10)?.to_string();
    params.line = args.string(11)?.to_string();
    params.person_capacity = args.int(12)?;
    params.person_number = args.int(13)?;

    let type_id = type_id.to_string();
    sim.build_vehicle(params, &type_id, route)?;
    Ok(())
}
