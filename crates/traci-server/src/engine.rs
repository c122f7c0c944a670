//! Session engine: runs every command of a message against the simulation.
//!
//! Control commands (version, step, close) are answered here; everything
//! else goes through the [`Dispatcher`]. Responses are concatenated in
//! arrival order into one reply body.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;

use traci_core::error::{Result, ResultCode, ResultExt, TraciError};
use traci_core::protocol::constants::*;
use traci_core::protocol::{split_commands, write_command, RawCommand, Status, Storage};

use crate::dispatch::dispatcher::write_error_status;
use crate::dispatch::Dispatcher;
use crate::obs::metrics::command_label;
use crate::obs::TraciMetrics;
use crate::sim::Simulation;

/// Identifier returned by `getVersion`.
pub const SERVER_IDENT: &str = concat!("traci-server ", env!("CARGO_PKG_VERSION"));

/// Command id used in the status of a command whose header could not be read.
pub const MALFORMED_COMMAND_ID: u8 = 0xff;

/// Body of one reply message.
#[derive(Debug, Clone)]
pub struct Reply {
    pub body: Bytes,
    /// The controller asked to close the session.
    pub close: bool,
}

pub struct Engine {
    sim: Simulation,
    dispatcher: Arc<Dispatcher>,
    metrics: Arc<TraciMetrics>,
}

impl Engine {
    pub fn new(sim: Simulation, dispatcher: Arc<Dispatcher>, metrics: Arc<TraciMetrics>) -> Self {
        Self {
            sim,
            dispatcher,
            metrics,
        }
    }

    pub fn sim(&self) -> &Simulation {
        &self.sim
    }

    pub fn sim_mut(&mut self) -> &mut Simulation {
        &mut self.sim
    }

    pub fn metrics(&self) -> &TraciMetrics {
        &self.metrics
    }

    /// Process one message body. Commands after a close request are ignored.
    pub fn handle_message(&mut self, body: Bytes) -> Reply {
        let mut out = Storage::new();
        let mut close = false;
        for cmd in split_commands(body) {
            match cmd {
                Ok(cmd) => {
                    if self.execute(&cmd, &mut out) {
                        close = true;
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "malformed command, dropping rest of message");
                    self.metrics.protocol_errors.inc(&[("reason", "command_framing")]);
                    write_error_status(&mut out, MALFORMED_COMMAND_ID, &e);
                }
            }
        }
        Reply {
            body: out.freeze(),
            close,
        }
    }

    /// Returns true if the session should end.
    fn execute(&mut self, cmd: &RawCommand, out: &mut Storage) -> bool {
        let started = Instant::now();
        let mut close = false;
        let code = match cmd.id {
            CMD_GETVERSION => self.get_version(out),
            CMD_SIMSTEP => self.sim_step(cmd, out),
            CMD_CLOSE => {
                close = true;
                write_ok(CMD_CLOSE, out)
            }
            _ => self.dispatcher.dispatch(&mut self.sim, cmd, out),
        };

        let label = command_label(cmd.id);
        self.metrics
            .commands
            .inc(&[("command", &label), ("result", code.as_str())]);
        self.metrics
            .command_duration
            .observe(&[("command", &label)], started.elapsed());
        tracing::debug!(
            command = %label,
            variable = cmd.body.first().copied(),
            result = code.as_str(),
            "command processed"
        );
        close
    }

    fn get_version(&self, out: &mut Storage) -> ResultCode {
        match version_reply() {
            Ok(reply) => {
                out.write_bytes(reply.as_slice());
                ResultCode::Ok
            }
            Err(e) => {
                write_error_status(out, CMD_GETVERSION, &e);
                e.result_code()
            }
        }
    }

    fn sim_step(&mut self, cmd: &RawCommand, out: &mut Storage) -> ResultCode {
        let target = cmd
            .reader()
            .read_i32()
            .or_invalid("Simulation step requires the target time as an integer.");
        match target {
            Ok(target) => {
                let steps = self.sim.step(i64::from(target));
                tracing::info!(time = self.sim.time(), steps, "simulation step");
                let code = write_ok(CMD_SIMSTEP, out);
                if code == ResultCode::Ok {
                    // no subscriptions
                    out.write_i32(0);
                }
                code
            }
            Err(e) => step_failed(&e, out),
        }
    }
}

fn step_failed(e: &TraciError, out: &mut Storage) -> ResultCode {
    tracing::warn!(error = %e, "simulation step rejected");
    write_error_status(out, CMD_SIMSTEP, e);
    e.result_code()
}

fn version_reply() -> Result<Storage> {
    let mut reply = Storage::new();
    Status::ok(CMD_GETVERSION).encode(&mut reply)?;
    let mut content = Storage::new();
    content.write_i32(API_VERSION);
    content.write_string(SERVER_IDENT)?;
    write_command(&mut reply, CMD_GETVERSION, content.as_slice())?;
    Ok(reply)
}

fn write_ok(command_id: u8, out: &mut Storage) -> ResultCode {
    match Status::ok(command_id).encode(out) {
        Ok(()) => ResultCode::Ok,
        Err(e) => {
            write_error_status(out, command_id, &e);
            e.result_code()
        }
    }
}
