//! Shared application state for the TraCI server.
//!
//! Wires config, dispatcher and metrics together and registers the
//! built-in domain services. Startup errors are returned, not panicked.

use std::sync::Arc;

use traci_core::error::Result;

use crate::config::{build_simulation, ServerConfig};
use crate::dispatch::Dispatcher;
use crate::engine::Engine;
use crate::obs::TraciMetrics;
use crate::services::{VehicleService, VehicleTypeService};

pub struct AppState {
    cfg: ServerConfig,
    dispatcher: Arc<Dispatcher>,
    metrics: Arc<TraciMetrics>,
}

impl AppState {
    pub fn new(cfg: ServerConfig) -> Result<Self> {
        let dispatcher = Dispatcher::new();
        dispatcher.register(Arc::new(VehicleService::new(
            cfg.simulation.max_route_distance,
        )));
        dispatcher.register(Arc::new(VehicleTypeService::new()));

        let commands: Vec<String> = dispatcher
            .registered_commands()
            .into_iter()
            .map(|c| format!("0x{c:02x}"))
            .collect();
        tracing::info!(commands = ?commands, "domain services registered");

        Ok(Self {
            cfg,
            dispatcher: Arc::new(dispatcher),
            metrics: Arc::new(TraciMetrics::default()),
        })
    }

    pub fn cfg(&self) -> &ServerConfig {
        &self.cfg
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn metrics(&self) -> Arc<TraciMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Fresh engine over the configured scenario.
    pub fn build_engine(&self) -> Result<Engine> {
        let sim = build_simulation(&self.cfg)?;
        Ok(Engine::new(sim, self.dispatcher(), self.metrics()))
    }
}
