#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use common::*;
use traci_core::protocol::constants::*;
use traci_core::protocol::{Color, TypedValue};
use traci_core::ResultCode;
use traci_server::engine::Engine;
use traci_server::sim::params::{DepartLane, DepartPos, DepartTime};

fn ok(status: traci_core::protocol::Status) {
    assert_eq!(status.result, ResultCode::Ok, "{}", status.description);
}

fn route_of(e: &Engine, id: &str) -> Vec<String> {
    let sim = e.sim();
    let v = sim.micro(id).expect("micro vehicle");
    v.route.edges.iter().map(|x| sim.net.edge(*x).id.clone()).collect()
}

fn add_params(vtype: &str, route: &str, depart: i32, pos: f64, speed: f64, lane: i8) -> TypedValue {
    compound(vec![
        s(vtype),
        s(route),
        TypedValue::Int(depart),
        d(pos),
        d(speed),
        TypedValue::Byte(lane),
    ])
}

fn add_full_params(depart_pos: &str) -> TypedValue {
    let mut items = vec![s("r1"), s("car"), s("now"), s("0"), s(depart_pos), s("max")];
    items.extend(["current", "max", "", "", "", "bus7"].map(s));
    items.push(TypedValue::Int(4));
    items.push(TypedValue::Int(1));
    compound(items)
}

#[test]
fn stop_with_three_items_is_rejected_before_any_change() {
    let mut e = running_engine();
    let st = set_vehicle(
        &mut e,
        CMD_STOP,
        "veh0",
        &compound(vec![s("B"), d(10.0), TypedValue::Byte(0)]),
    );
    assert_error(&st, "Stop needs a compound object description of four of five items.");
    assert!(e.sim().micro("veh0").unwrap().stops.is_empty());
}

#[test]
fn stop_at_negative_position_is_rejected() {
    let mut e = running_engine();
    let st = set_vehicle(
        &mut e,
        CMD_STOP,
        "veh0",
        &compound(vec![s("B"), d(-5.0), TypedValue::Byte(0), TypedValue::Int(0)]),
    );
    assert_error(&st, "must not be negative");
    assert!(e.sim().micro("veh0").unwrap().stops.is_empty());
}

#[test]
fn stop_field_types_are_checked_in_order() {
    let mut e = running_engine();
    let st = set_vehicle(
        &mut e,
        CMD_STOP,
        "veh0",
        &compound(vec![s("B"), TypedValue::Int(10), TypedValue::Byte(0), TypedValue::Int(0)]),
    );
    assert_error(
        &st,
        "The second stop parameter must be the position along the edge given as a double.",
    );
}

#[test]
fn stop_on_the_route_is_recorded_and_reached() {
    let mut e = running_engine();
    ok(set_vehicle(
        &mut e,
        CMD_STOP,
        "veh0",
        &compound(vec![s("B"), d(10.0), TypedValue::Byte(0), TypedValue::Int(2000)]),
    ));
    let v = e.sim().micro("veh0").unwrap();
    assert_eq!(v.stops.len(), 1);
    assert_eq!(v.stops[0].end_pos, 10.0);
    assert!(!v.stops[0].parking);

    ok(set_vehicle(
        &mut e,
        VAR_MOVE_TO,
        "veh0",
        &compound(vec![s("B_0"), d(10.0)]),
    ));
    step(&mut e, 2000);
    assert_eq!(get_vehicle(&mut e, VAR_STOPSTATE, "veh0").value(), TypedValue::UByte(1));
    assert_eq!(get_vehicle(&mut e, VAR_SPEED, "veh0").value(), d(0.0));

    ok(set_vehicle(&mut e, CMD_RESUME, "veh0", &compound(vec![])));
    assert!(e.sim().micro("veh0").unwrap().stops.is_empty());
}

#[test]
fn stop_off_the_route_is_a_domain_error() {
    let mut e = running_engine();
    let st = set_vehicle(
        &mut e,
        CMD_STOP,
        "veh0",
        &compound(vec![s("X"), d(10.0), TypedValue::Byte(0), TypedValue::Int(0)]),
    );
    assert_error(&st, "is not downstream the current route.");

    let st = set_vehicle(
        &mut e,
        CMD_STOP,
        "veh0",
        &compound(vec![s("B"), d(10.0), TypedValue::Byte(2), TypedValue::Int(0)]),
    );
    assert_error(&st, "No lane with index '2' on road 'B'.");
}

#[test]
fn resume_needs_a_pending_stop() {
    let mut e = running_engine();
    let st = set_vehicle(&mut e, CMD_RESUME, "veh0", &compound(vec![]));
    assert_error(&st, "Failed to resume vehicle 'veh0', it has no stops.");

    ok(set_vehicle(
        &mut e,
        CMD_STOP,
        "veh0",
        &compound(vec![s("C"), d(10.0), TypedValue::Byte(0), TypedValue::Int(0)]),
    ));
    let st = set_vehicle(&mut e, CMD_RESUME, "veh0", &compound(vec![]));
    assert_error(&st, "Failed to resume a non parking vehicle 'veh0'");

    let st = set_vehicle(&mut e, CMD_RESUME, "veh0", &compound(vec![d(1.0)]));
    assert_error(&st, "Resuming should obtain an empty compound object.");
}

#[test]
fn change_target_without_path_keeps_the_route() {
    let mut e = running_engine();
    let st = set_vehicle(&mut e, CMD_CHANGETARGET, "veh0", &s("X"));
    assert_error(&st, "Route replacement failed");
    assert_eq!(route_of(&e, "veh0"), ["A", "B", "C"]);
    assert_eq!(get_vehicle(&mut e, VAR_ROUTE_ID, "veh0").value(), s("r0"));

    let st = set_vehicle(&mut e, CMD_CHANGETARGET, "veh0", &s("nowhere"));
    assert_error(&st, "Can not retrieve road with ID nowhere");
}

#[test]
fn change_target_routes_to_the_new_destination() {
    let mut e = running_engine();
    ok(set_vehicle(&mut e, CMD_CHANGETARGET, "veh0", &s("B")));
    assert_eq!(route_of(&e, "veh0"), ["A", "B"]);
    assert_eq!(get_vehicle(&mut e, VAR_ROUTE_ID, "veh0").value(), s("!veh0!var#1"));
}

#[test]
fn reroute_by_travel_time_avoids_expensive_edge() {
    let mut e = running_engine();
    ok(set_vehicle(
        &mut e,
        VAR_EDGE_TRAVELTIME,
        "veh0",
        &compound(vec![s("B"), d(1000.0)]),
    ));
    ok(set_vehicle(&mut e, CMD_REROUTE_TRAVELTIME, "veh0", &compound(vec![])));
    assert_eq!(route_of(&e, "veh0"), ["A", "D", "C"]);

    // effort weights are all zero without overrides; any path is acceptable
    ok(set_vehicle(&mut e, CMD_REROUTE_EFFORT, "veh0", &compound(vec![])));
    assert_eq!(route_of(&e, "veh0").last().map(String::as_str), Some("C"));
}

#[test]
fn travel_time_accepts_one_two_or_four_items() {
    let mut e = running_engine();
    ok(set_vehicle(
        &mut e,
        VAR_EDGE_TRAVELTIME,
        "veh0",
        &compound(vec![TypedValue::Int(0), TypedValue::Int(10_000), s("B"), d(12.0)]),
    ));
    let sim = e.sim();
    let b = sim.net.edge_by_name("B").unwrap();
    let table = sim
        .micro("veh0")
        .unwrap()
        .weights
        .table(traci_server::sim::weights::WeightKind::TravelTime);
    assert_eq!(table.retrieve(b, 5_000), Some(12.0));
    assert_eq!(table.retrieve(b, 10_000), None);

    ok(set_vehicle(&mut e, VAR_EDGE_TRAVELTIME, "veh0", &compound(vec![s("B")])));
    let table = e
        .sim()
        .micro("veh0")
        .unwrap()
        .weights
        .table(traci_server::sim::weights::WeightKind::TravelTime);
    assert!(!table.knows(b));

    let st = set_vehicle(
        &mut e,
        VAR_EDGE_TRAVELTIME,
        "veh0",
        &compound(vec![s("B"), d(1.0), d(2.0)]),
    );
    assert_error(&st, "Setting travel time requires 1, 2, or 4 parameters.");

    let st = set_vehicle(&mut e, VAR_EDGE_EFFORT, "veh0", &compound(vec![s("Q"), d(1.0)]));
    assert_error(&st, "Referenced edge 'Q' is not known.");
}

#[test]
fn slow_down_installs_a_speed_timeline() {
    let mut e = running_engine();
    ok(set_vehicle(
        &mut e,
        CMD_SLOWDOWN,
        "veh0",
        &compound(vec![d(5.0), TypedValue::Int(3000)]),
    ));
    let v = e.sim().micro("veh0").unwrap();
    assert_eq!(v.influencer.speed_timeline, vec![(1000, 0.0), (4000, 5.0)]);

    let st = set_vehicle(
        &mut e,
        CMD_SLOWDOWN,
        "veh0",
        &compound(vec![d(-1.0), TypedValue::Int(3000)]),
    );
    assert_error(&st, "Speed must not be negative");

    let st = set_vehicle(
        &mut e,
        CMD_SLOWDOWN,
        "veh0",
        &compound(vec![d(1.0), TypedValue::Int(-10)]),
    );
    assert_error(&st, "Invalid time interval");
}

#[test]
fn set_speed_holds_until_released() {
    let mut e = running_engine();
    ok(set_vehicle(&mut e, VAR_SPEED, "veh0", &d(7.5)));
    step(&mut e, 2000);
    assert_eq!(get_vehicle(&mut e, VAR_SPEED, "veh0").value(), d(7.5));
    step(&mut e, 5000);
    assert_eq!(get_vehicle(&mut e, VAR_SPEED, "veh0").value(), d(7.5));

    ok(set_vehicle(&mut e, VAR_SPEED, "veh0", &d(-1.0)));
    assert!(e.sim().micro("veh0").unwrap().influencer.speed_timeline.is_empty());

    let st = set_vehicle(&mut e, VAR_SPEED, "veh0", &TypedValue::Int(3));
    assert_error(&st, "Setting speed requires a double.");
}

#[test]
fn change_lane_checks_the_index() {
    let mut e = running_engine();
    let st = set_vehicle(
        &mut e,
        CMD_CHANGELANE,
        "veh0",
        &compound(vec![TypedValue::Byte(3), TypedValue::Int(1000)]),
    );
    assert_error(&st, "No lane with index '3' on road 'A'.");

    ok(set_vehicle(
        &mut e,
        CMD_CHANGELANE,
        "veh0",
        &compound(vec![TypedValue::Byte(1), TypedValue::Int(2000)]),
    ));
    let v = e.sim().micro("veh0").unwrap();
    assert_eq!(v.influencer.lane_timeline, vec![(1000, 1), (3000, 1)]);
}

#[test]
fn add_rejects_an_existing_id() {
    let mut e = running_engine();
    let before = e.sim().vehicles.len();
    let st = set_vehicle(&mut e, ADD, "veh0", &add_params("car", "r1", -3, 0.0, 0.0, 0));
    assert_error(&st, "The vehicle veh0 to add already exists.");
    assert_eq!(e.sim().vehicles.len(), before);
    assert_eq!(route_of(&e, "veh0"), ["A", "B", "C"]);
}

#[test]
fn added_vehicle_departs_on_the_next_step() {
    let mut e = running_engine();
    ok(set_vehicle(&mut e, ADD, "newbie", &add_params("car", "r1", -3, 20.0, 3.0, 0)));
    assert_eq!(e.sim().pending_insertions(), 2);
    assert_eq!(get_vehicle(&mut e, VAR_SPEED, "newbie").value(), d(INVALID_DOUBLE_VALUE));

    step(&mut e, 2000);
    assert_eq!(get_vehicle(&mut e, VAR_LANE_ID, "newbie").value(), s("B_0"));
    assert_eq!(get_vehicle(&mut e, VAR_LANEPOSITION, "newbie").value(), d(20.0));
    assert_eq!(get_vehicle(&mut e, VAR_SPEED, "newbie").value(), d(3.0));
}

#[test]
fn add_validates_references_and_sentinels() {
    let mut e = running_engine();
    let st = set_vehicle(&mut e, ADD, "x", &add_params("bus", "r1", -3, 0.0, 0.0, 0));
    assert_error(&st, "Invalid type 'bus' for vehicle 'x'");

    let st = set_vehicle(&mut e, ADD, "x", &add_params("car", "nope", -3, 0.0, 0.0, 0));
    assert_error(&st, "Invalid route 'nope' for vehicle: 'x'");

    let st = set_vehicle(&mut e, ADD, "x", &add_params("car", "r1", 500, 0.0, 0.0, 0));
    assert_error(&st, "Departure time in the past.");

    // -1 would select the literal lane procedure, which only a value can
    let st = set_vehicle(&mut e, ADD, "x", &add_params("car", "r1", -3, 0.0, 0.0, -1));
    assert_error(&st, "Invalid departure lane.");

    let st = set_vehicle(&mut e, ADD, "x", &add_params("car", "r1", -3, -2.5, 0.0, 0));
    assert_error(&st, "Invalid departure position.");

    let st = set_vehicle(&mut e, ADD, "x", &compound(vec![s("car"), s("r1")]));
    assert_error(&st, "Adding a vehicle needs six parameters.");

    assert!(!e.sim().vehicles.contains("x"));
}

#[test]
fn add_with_a_disconnected_lane_index_fails_cleanly() {
    let mut e = running_engine();
    let st = set_vehicle(&mut e, ADD, "x", &add_params("car", "r1", -3, 0.0, 0.0, 4));
    assert_error(&st, "departLane 4 does not exist");
    assert!(!e.sim().vehicles.contains("x"));
}

#[test]
fn add_full_parses_every_definition() {
    let mut e = running_engine();
    ok(set_vehicle(&mut e, ADD_FULL, "full0", &add_full_params("base")));
    let v = e.sim().micro("full0").unwrap();
    assert_eq!(v.params.depart, DepartTime::Now);
    assert_eq!(v.params.depart_lane, DepartLane::Given(0));
    assert_eq!(v.params.depart_pos, DepartPos::Base);
    assert_eq!(v.params.line, "bus7");
    assert_eq!(v.params.person_capacity, 4);
    assert_eq!(get_vehicle(&mut e, VAR_PERSON_NUMBER, "full0").value(), TypedValue::Int(1));

    let st = set_vehicle(&mut e, ADD_FULL, "full1", &add_full_params("somewhere"));
    assert_error(&st, "Invalid departPos definition 'somewhere' for vehicle 'full1'.");
    assert!(!e.sim().vehicles.contains("full1"));
}

#[test]
fn remove_twice_never_fails() {
    let mut e = running_engine();
    ok(set_vehicle(&mut e, REMOVE, "veh0", &TypedValue::Byte(REMOVE_ARRIVED as i8)));
    ok(set_vehicle(&mut e, REMOVE, "veh0", &TypedValue::Byte(REMOVE_ARRIVED as i8)));
    assert_eq!(get_vehicle(&mut e, VAR_SPEED, "veh0").value(), d(INVALID_DOUBLE_VALUE));

    step(&mut e, 2000);
    let st = set_vehicle(&mut e, REMOVE, "veh0", &TypedValue::Byte(REMOVE_ARRIVED as i8));
    assert_error(&st, "Vehicle 'veh0' is not known");

    let st = set_vehicle(&mut e, REMOVE, "late", &TypedValue::Byte(9));
    assert_error(&st, "Unknown removal status.");
}

#[test]
fn type_attribute_on_a_vehicle_gets_a_private_type() {
    let mut e = running_engine();
    ok(set_vehicle(&mut e, VAR_LENGTH, "veh0", &d(7.0)));
    assert_eq!(get_vehicle(&mut e, VAR_TYPE, "veh0").value(), s("car@veh0"));
    assert_eq!(get_vehicle(&mut e, VAR_LENGTH, "veh0").value(), d(7.0));
    assert_eq!(e.sim().types.get("car").unwrap().length, 5.0);

    // a second change reuses the private type
    ok(set_vehicle(&mut e, VAR_MINGAP, "veh0", &d(1.0)));
    assert_eq!(get_vehicle(&mut e, VAR_TYPE, "veh0").value(), s("car@veh0"));
}

#[test]
fn invalid_type_attribute_leaves_the_type_shared() {
    let mut e = running_engine();
    let st = set_vehicle(&mut e, VAR_LENGTH, "veh0", &d(-1.0));
    assert_error(&st, "Invalid length.");
    assert_eq!(get_vehicle(&mut e, VAR_TYPE, "veh0").value(), s("car"));
    assert!(!e.sim().types.contains("car@veh0"));
}

#[test]
fn route_by_id_must_contain_the_current_edge() {
    let mut e = running_engine();
    let st = set_vehicle(&mut e, VAR_ROUTE_ID, "veh0", &s("r1"));
    assert_error(&st, "Route replacement failed for veh0");
    assert_eq!(route_of(&e, "veh0"), ["A", "B", "C"]);

    let st = set_vehicle(&mut e, VAR_ROUTE_ID, "veh0", &s("r9"));
    assert_error(&st, "The route 'r9' is not known.");
}

#[test]
fn explicit_route_keeps_the_driven_prefix() {
    let mut e = running_engine();
    ok(set_vehicle(
        &mut e,
        VAR_ROUTE,
        "veh0",
        &TypedValue::StringList(vec!["A".into(), "D".into(), "C".into()]),
    ));
    assert_eq!(route_of(&e, "veh0"), ["A", "D", "C"]);

    let st = set_vehicle(
        &mut e,
        VAR_ROUTE,
        "veh0",
        &TypedValue::StringList(vec!["A".into(), "Z".into()]),
    );
    assert_error(&st, "The edge 'Z' within the route for vehicle 'veh0' is not known.");
}

#[test]
fn plain_attributes_round_trip() {
    let mut e = running_engine();
    let red = Color::new(255, 0, 0, 255);
    ok(set_vehicle(&mut e, VAR_COLOR, "veh0", &TypedValue::Color(red)));
    assert_eq!(get_vehicle(&mut e, VAR_COLOR, "veh0").value(), TypedValue::Color(red));

    ok(set_vehicle(&mut e, VAR_SIGNALS, "veh0", &TypedValue::Int(0b1010)));
    assert_eq!(get_vehicle(&mut e, VAR_SIGNALS, "veh0").value(), TypedValue::Int(0b1010));

    ok(set_vehicle(&mut e, VAR_SPEED_FACTOR, "veh0", &d(1.2)));
    assert_eq!(get_vehicle(&mut e, VAR_SPEED_FACTOR, "veh0").value(), d(1.2));

    ok(set_vehicle(
        &mut e,
        VAR_PARAMETER,
        "veh0",
        &compound(vec![s("has.battery"), s("true")]),
    ));
    assert_eq!(
        get_vehicle_with(&mut e, VAR_PARAMETER, "veh0", &s("has.battery")).value(),
        s("true")
    );

    ok(set_vehicle(&mut e, VAR_SPEEDSETMODE, "veh0", &TypedValue::Int(0)));
    ok(set_vehicle(&mut e, VAR_LANECHANGE_MODE, "veh0", &TypedValue::Int(0)));
    let v = e.sim().micro("veh0").unwrap();
    assert_eq!(v.influencer.speed_mode.bits(), 0);
    assert_eq!(v.influencer.lane_change_mode, 0);
}

#[test]
fn vehicle_type_must_exist() {
    let mut e = running_engine();
    let st = set_vehicle(&mut e, VAR_TYPE, "veh0", &s("bus"));
    assert_error(&st, "The vehicle type 'bus' is not known.");
    ok(set_vehicle(&mut e, VAR_TYPE, "veh0", &s("DEFAULT_VEHTYPE")));
    assert_eq!(get_vehicle(&mut e, VAR_TYPE, "veh0").value(), s("DEFAULT_VEHTYPE"));
}

#[test]
fn move_to_advances_along_the_route() {
    let mut e = running_engine();
    let st = set_vehicle(&mut e, VAR_MOVE_TO, "veh0", &compound(vec![s("X_0"), d(5.0)]));
    assert_error(&st, "Vehicle 'veh0' may be set onto an edge to pass only.");

    let st = set_vehicle(&mut e, VAR_MOVE_TO, "veh0", &compound(vec![s("Q_0"), d(5.0)]));
    assert_error(&st, "Unknown lane 'Q_0'.");

    ok(set_vehicle(&mut e, VAR_MOVE_TO, "veh0", &compound(vec![s("C_0"), d(30.0)])));
    assert_eq!(get_vehicle(&mut e, VAR_ROAD_ID, "veh0").value(), s("C"));
    assert_eq!(get_vehicle(&mut e, VAR_LANEPOSITION, "veh0").value(), d(30.0));
    let TypedValue::Position2D { x, y } = get_vehicle(&mut e, VAR_POSITION, "veh0").value() else {
        panic!("position expected");
    };
    assert!((x - 230.0).abs() < 1e-9 && y.abs() < 1e-9);
}

#[test]
fn move_to_before_departure_inserts_the_vehicle() {
    let mut e = running_engine();
    ok(set_vehicle(&mut e, VAR_MOVE_TO, "late", &compound(vec![s("B_0"), d(10.0)])));
    assert!(e.sim().micro("late").unwrap().departed);
    assert_eq!(get_vehicle(&mut e, VAR_ROAD_ID, "late").value(), s("B"));

    // the original depart time passes without a second insertion
    step(&mut e, 61000);
    assert_eq!(get_vehicle(&mut e, VAR_LANE_ID, "late").value(), s("B_0"));
    assert_eq!(get_vehicle(&mut e, VAR_LANEPOSITION, "late").value(), d(10.0));

    ok(set_vehicle(&mut e, REMOVE, "late", &TypedValue::Byte(REMOVE_ARRIVED as i8)));
    step(&mut e, 62000);
    let st = set_vehicle(&mut e, REMOVE, "late", &TypedValue::Byte(REMOVE_ARRIVED as i8));
    assert_error(&st, "Vehicle 'late' is not known");
}

#[test]
fn move_to_vtd_places_the_vehicle_on_the_next_step() {
    let mut e = running_engine();
    ok(set_vehicle(
        &mut e,
        VAR_MOVE_TO_VTD,
        "veh0",
        &compound(vec![s("A"), TypedValue::Int(1), d(50.0), d(3.2), d(90.0)]),
    ));
    assert!(e.sim().micro("veh0").unwrap().influencer.placement.is_some());

    step(&mut e, 2000);
    assert_eq!(get_vehicle(&mut e, VAR_LANE_ID, "veh0").value(), s("A_1"));
    assert_eq!(get_vehicle(&mut e, VAR_LANEPOSITION, "veh0").value(), d(50.0));
    assert_eq!(route_of(&e, "veh0"), ["A", "B", "C"]);
}

#[test]
fn move_to_vtd_keeps_the_sign_of_a_negative_lane_number() {
    let mut e = engine_from(&SCENARIO.replace("origin_id: \"A 1\"", "origin_id: \"A -1\""));
    step(&mut e, 1000);
    // halfway between both lanes of A, only the origin id tells them apart
    ok(set_vehicle(
        &mut e,
        VAR_MOVE_TO_VTD,
        "veh0",
        &compound(vec![s("A"), TypedValue::Int(-1), d(50.0), d(1.6), d(90.0)]),
    ));
    step(&mut e, 2000);
    assert_eq!(get_vehicle(&mut e, VAR_LANE_ID, "veh0").value(), s("A_1"));
}

#[test]
fn move_to_vtd_far_from_any_lane_fails() {
    let mut e = running_engine();
    let st = set_vehicle(
        &mut e,
        VAR_MOVE_TO_VTD,
        "veh0",
        &compound(vec![s("A"), TypedValue::Int(0), d(5000.0), d(5000.0), d(0.0)]),
    );
    assert_error(&st, "Could not map vehicle 'veh0'.");
    assert!(e.sim().micro("veh0").unwrap().influencer.placement.is_none());

    let st = set_vehicle(
        &mut e,
        VAR_MOVE_TO_VTD,
        "veh0",
        &compound(vec![s("A"), d(1.0), d(50.0), d(3.2), d(90.0)]),
    );
    assert_error(
        &st,
        "The second parameter for setting a VTD vehicle must be the lane given as an int.",
    );
}

#[test]
fn unsupported_set_variable_is_rejected() {
    let mut e = running_engine();
    let st = set_vehicle(&mut e, VAR_LEADER, "veh0", &d(1.0));
    assert_error(&st, "Change Vehicle State: unsupported variable specified");
}

#[test]
fn meso_vehicle_cannot_be_steered() {
    let mut e = running_engine();
    let st = set_vehicle(&mut e, VAR_SPEED, "meso0", &d(3.0));
    assert_error(&st, "is not a micro-simulation vehicle");
}
