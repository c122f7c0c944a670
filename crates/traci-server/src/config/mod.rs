//! Server config loader (strict parsing).

pub mod scenario;
pub mod schema;

use std::fs;

use traci_core::error::{Result, TraciError};

pub use scenario::build_simulation;
pub use schema::{
    ConnectionConfig, EdgeConfig, EdgeFunctionConfig, LaneConfig, LoggingSection, RouteConfig,
    ScenarioConfig, ServerConfig, ServerSection, SimulationSection, VehicleConfig,
    VehicleTypeConfig,
};

pub fn load_from_file(path: &str) -> Result<ServerConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| TraciError::Config(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ServerConfig> {
    let cfg: ServerConfig = serde_yaml::from_str(s)
        .map_err(|e| TraciError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
