use std::sync::Arc;

use dashmap::DashMap;

use traci_core::error::{Result, ResultCode, TraciError};
use traci_core::protocol::{RawCommand, Reader, Status, Storage, TypedValue, VariableResponse};

use crate::sim::Simulation;

/// A per-domain variable handler (vehicle, vehicle type, ...).
///
/// The dispatcher validates the variable against `supports_get` /
/// `supports_set` before the object id or any parameter is read.
pub trait DomainService: Send + Sync {
    /// Human readable domain name used in error messages ("Vehicle").
    fn label(&self) -> &'static str;
    fn get_command(&self) -> u8;
    fn set_command(&self) -> u8;
    fn response_command(&self) -> u8;

    fn supports_get(&self, variable: u8) -> bool;
    fn supports_set(&self, variable: u8) -> bool;

    fn process_get(
        &self,
        sim: &Simulation,
        variable: u8,
        id: &str,
        params: &mut Reader,
    ) -> Result<TypedValue>;

    fn process_set(
        &self,
        sim: &mut Simulation,
        variable: u8,
        id: &str,
        params: &mut Reader,
    ) -> Result<()>;
}

/// Registry mapping command ids onto domain services.
#[derive(Default)]
pub struct Dispatcher {
    services: DashMap<u8, Arc<dyn DomainService>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
        }
    }

    /// Register under both the get and the set command id.
    pub fn register(&self, svc: Arc<dyn DomainService>) {
        self.services.insert(svc.get_command(), Arc::clone(&svc));
        self.services.insert(svc.set_command(), svc);
    }

    pub fn registered_commands(&self) -> Vec<u8> {
        let mut ids: Vec<u8> = self.services.iter().map(|e| *e.key()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn handles(&self, command_id: u8) -> bool {
        self.services.contains_key(&command_id)
    }

    /// Run one domain command. `Ok(None)` is a successful set.
    pub fn handle(
        &self,
        sim: &mut Simulation,
        command_id: u8,
        r: &mut Reader,
    ) -> Result<Option<VariableResponse>> {
        let svc = self
            .services
            .get(&command_id)
            .ok_or(TraciError::NotImplemented(command_id))?
            .value()
            .clone();
        let variable = r.read_u8()?;

        if command_id == svc.get_command() {
            if !svc.supports_get(variable) {
                return Err(TraciError::validation(format!(
                    "Get {} Variable: unsupported variable specified",
                    svc.label()
                )));
            }
            let id = r.read_string()?;
            let value = svc.process_get(sim, variable, &id, r)?;
            return Ok(Some(VariableResponse {
                response_id: svc.response_command(),
                variable,
                object_id: id,
                value,
            }));
        }

        if !svc.supports_set(variable) {
            return Err(TraciError::validation(format!(
                "Change {} State: unsupported variable specified",
                svc.label()
            )));
        }
        let id = r.read_string()?;
        svc.process_set(sim, variable, &id, r)?;
        Ok(None)
    }

    /// Run `cmd` and append its status (and response) to `out`.
    pub fn dispatch(&self, sim: &mut Simulation, cmd: &RawCommand, out: &mut Storage) -> ResultCode {
        let mut r = cmd.reader();
        let reply = self.handle(sim, cmd.id, &mut r).and_then(|resp| {
            let mut reply = Storage::new();
            Status::ok(cmd.id).encode(&mut reply)?;
            if let Some(resp) = resp {
                resp.encode(&mut reply)?;
            }
            Ok(reply)
        });
        match reply {
            Ok(reply) => {
                out.write_bytes(reply.as_slice());
                ResultCode::Ok
            }
            Err(e) => {
                tracing::warn!(command = cmd.id, kind = e.kind().as_str(), error = %e, "command failed");
                write_error_status(out, cmd.id, &e);
                e.result_code()
            }
        }
    }
}

/// Append an error status for `command_id`. If even that cannot be encoded
/// the command gets no status and the failure is logged.
pub(crate) fn write_error_status(out: &mut Storage, command_id: u8, e: &TraciError) {
    if let Err(fail) = Status::error(command_id, e).encode(out) {
        tracing::error!(command = command_id, error = %fail, "could not encode error status");
    }
}
