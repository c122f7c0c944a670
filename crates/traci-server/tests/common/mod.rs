//! Shared fixture: a small network and wire helpers for driving an engine.
//!
//! ```text
//!            A_0 ──► B ──► C
//!   A (2 lanes)  └─► D ─┘
//!   X: isolated
//! ```
//! Only `A_0` is connected downstream; `A_1` is a dead end.

#![allow(dead_code)]

use traci_core::protocol::constants::*;
use traci_core::protocol::{
    split_commands, write_command, RawCommand, Status, Storage, TypedValue, VariableResponse,
};
use traci_core::ResultCode;

use traci_server::app_state::AppState;
use traci_server::config::{self, ServerConfig};
use traci_server::engine::Engine;

pub const SCENARIO: &str = r#"
version: 1
simulation:
  step_length_ms: 1000
scenario:
  edges:
    - id: A
      from: n0
      to: n1
      lanes:
        - { shape: [[0.0, 0.0], [100.0, 0.0]], speed: 13.89, origin_id: "A 0" }
        - { shape: [[0.0, 3.2], [100.0, 3.2]], speed: 13.89, origin_id: "A 1" }
    - id: B
      from: n1
      to: n2
      lanes:
        - { shape: [[100.0, 0.0], [200.0, 0.0]], speed: 13.89, origin_id: "B 0" }
    - id: C
      from: n2
      to: n3
      lanes:
        - { shape: [[200.0, 0.0], [300.0, 0.0]], speed: 13.89 }
    - id: D
      from: n1
      to: n2
      lanes:
        - { shape: [[100.0, 0.0], [150.0, 50.0], [200.0, 0.0]], speed: 13.89 }
    - id: X
      from: n4
      to: n5
      lanes:
        - { shape: [[0.0, 100.0], [100.0, 100.0]], speed: 13.89 }
  connections:
    - { from: A_0, to: B_0 }
    - { from: A_0, to: D_0 }
    - { from: B_0, to: C_0 }
    - { from: D_0, to: C_0 }
  routes:
    - { id: r0, edges: [A, B, C] }
    - { id: r1, edges: [B, C] }
  vehicle_types:
    - { id: car, length: 5.0, max_speed: 50.0 }
  vehicles:
    - { id: veh0, type: car, route: r0 }
    - { id: late, type: car, route: r0, depart_ms: 60000 }
    - { id: meso0, type: car, route: r1, meso: true }
"#;

pub fn config() -> ServerConfig {
    config::load_from_str(SCENARIO).expect("fixture config")
}

/// Engine at time 0; nothing inserted yet.
pub fn engine() -> Engine {
    engine_from(SCENARIO)
}

pub fn engine_from(yaml: &str) -> Engine {
    let cfg = config::load_from_str(yaml).expect("fixture config");
    let state = AppState::new(cfg).expect("app state");
    state.build_engine().expect("engine")
}

/// Engine after one step: `veh0` stands on `A_0` at offset 0.
pub fn running_engine() -> Engine {
    let mut e = engine();
    let status = step(&mut e, 1000);
    assert_eq!(status.result, ResultCode::Ok);
    e
}

pub fn encode(v: &TypedValue) -> Vec<u8> {
    let mut s = Storage::new();
    v.encode(&mut s).unwrap();
    s.as_slice().to_vec()
}

/// Send one command and return every command of the reply.
pub fn request(engine: &mut Engine, cmd: u8, content: &[u8]) -> Vec<RawCommand> {
    let mut body = Storage::new();
    write_command(&mut body, cmd, content).unwrap();
    let reply = engine.handle_message(body.freeze());
    split_commands(reply.body)
        .collect::<Result<Vec<_>, _>>()
        .expect("well-formed reply")
}

#[derive(Debug)]
pub struct Answer {
    pub status: Status,
    pub response: Option<VariableResponse>,
}

impl Answer {
    /// Value of a successful get.
    pub fn value(self) -> TypedValue {
        assert_eq!(self.status.result, ResultCode::Ok, "{}", self.status.description);
        self.response.expect("variable response").value
    }
}

pub fn get(engine: &mut Engine, cmd: u8, var: u8, id: &str, params: &[u8]) -> Answer {
    let mut content = Storage::new();
    content.write_u8(var);
    content.write_string(id).unwrap();
    content.write_bytes(params);
    let cmds = request(engine, cmd, content.as_slice());
    let status = Status::parse(&cmds[0]).expect("status");
    let response = cmds
        .get(1)
        .map(|c| VariableResponse::parse(c).expect("variable response"));
    Answer { status, response }
}

pub fn set(engine: &mut Engine, cmd: u8, var: u8, id: &str, params: &[u8]) -> Status {
    let mut content = Storage::new();
    content.write_u8(var);
    content.write_string(id).unwrap();
    content.write_bytes(params);
    let cmds = request(engine, cmd, content.as_slice());
    assert_eq!(cmds.len(), 1, "a set answers with its status only");
    Status::parse(&cmds[0]).expect("status")
}

pub fn get_vehicle(engine: &mut Engine, var: u8, id: &str) -> Answer {
    get(engine, CMD_GET_VEHICLE_VARIABLE, var, id, &[])
}

pub fn get_vehicle_with(engine: &mut Engine, var: u8, id: &str, param: &TypedValue) -> Answer {
    get(engine, CMD_GET_VEHICLE_VARIABLE, var, id, &encode(param))
}

pub fn set_vehicle(engine: &mut Engine, var: u8, id: &str, value: &TypedValue) -> Status {
    set(engine, CMD_SET_VEHICLE_VARIABLE, var, id, &encode(value))
}

pub fn get_type(engine: &mut Engine, var: u8, id: &str) -> Answer {
    get(engine, CMD_GET_VEHICLETYPE_VARIABLE, var, id, &[])
}

pub fn set_type(engine: &mut Engine, var: u8, id: &str, value: &TypedValue) -> Status {
    set(engine, CMD_SET_VEHICLETYPE_VARIABLE, var, id, &encode(value))
}

/// Status of a simulation step. A successful step is followed by a raw
/// subscription count that is not a command, so only the first command is
/// parsed.
pub fn step(engine: &mut Engine, target: i32) -> Status {
    let mut body = Storage::new();
    write_command(&mut body, CMD_SIMSTEP, &target.to_be_bytes()).unwrap();
    let reply = engine.handle_message(body.freeze());
    let first = split_commands(reply.body)
        .next()
        .expect("status command")
        .expect("status framing");
    Status::parse(&first).expect("status")
}

pub fn assert_error(status: &Status, needle: &str) {
    assert_eq!(status.result, ResultCode::Error, "expected failure, got {status:?}");
    assert!(
        status.description.contains(needle),
        "'{}' does not mention '{needle}'",
        status.description
    );
}

pub fn s(v: &str) -> TypedValue {
    TypedValue::String(v.to_string())
}

pub fn d(v: f64) -> TypedValue {
    TypedValue::Double(v)
}

pub fn compound(items: Vec<TypedValue>) -> TypedValue {
    TypedValue::Compound(items)
}
