use std::collections::HashSet;
use std::net::SocketAddr;

use serde::Deserialize;
use traci_core::error::{Result, TraciError};

fn invalid(msg: impl Into<String>) -> TraciError {
    TraciError::Config(msg.into())
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub simulation: SimulationSection,

    #[serde(default)]
    pub logging: LoggingSection,

    #[serde(default)]
    pub scenario: ScenarioConfig,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(invalid("unsupported config version"));
        }
        self.server.validate()?;
        self.simulation.validate()?;
        self.scenario.validate()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,

    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            max_message_bytes: default_max_message_bytes(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if !(64..=256 * 1024 * 1024).contains(&self.max_message_bytes) {
            return Err(invalid(
                "server.max_message_bytes must be between 64 and 268435456",
            ));
        }
        if !(100..=3_600_000).contains(&self.read_timeout_ms) {
            return Err(invalid(
                "server.read_timeout_ms must be between 100 and 3600000",
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen
            .parse()
            .map_err(|e| invalid(format!("server.listen must be a socket address: {e}")))
    }
}

fn default_listen() -> String {
    "127.0.0.1:8813".into()
}
fn default_max_message_bytes() -> usize {
    16 * 1024 * 1024
}
fn default_read_timeout_ms() -> u64 {
    60_000
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationSection {
    #[serde(default = "default_step_length_ms")]
    pub step_length_ms: i64,

    #[serde(default)]
    pub begin_ms: i64,

    #[serde(default = "default_max_route_distance")]
    pub max_route_distance: f64,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            step_length_ms: default_step_length_ms(),
            begin_ms: 0,
            max_route_distance: default_max_route_distance(),
        }
    }
}

impl SimulationSection {
    pub fn validate(&self) -> Result<()> {
        if self.step_length_ms <= 0 {
            return Err(invalid("simulation.step_length_ms must be positive"));
        }
        if self.begin_ms < 0 {
            return Err(invalid("simulation.begin_ms must not be negative"));
        }
        if !(self.max_route_distance.is_finite() && self.max_route_distance > 0.0) {
            return Err(invalid("simulation.max_route_distance must be positive"));
        }
        Ok(())
    }
}

fn default_step_length_ms() -> i64 {
    1000
}
fn default_max_route_distance() -> f64 {
    100.0
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_filter() -> String {
    "info".into()
}

/// Network and demand the server starts with.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub edges: Vec<EdgeConfig>,

    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,

    #[serde(default)]
    pub routes: Vec<RouteConfig>,

    #[serde(default)]
    pub vehicle_types: Vec<VehicleTypeConfig>,

    #[serde(default)]
    pub vehicles: Vec<VehicleConfig>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeFunctionConfig {
    #[default]
    Normal,
    Internal,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeConfig {
    pub id: String,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub function: EdgeFunctionConfig,
    pub lanes: Vec<LaneConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LaneConfig {
    /// Polyline as `[x, y]` pairs.
    pub shape: Vec<[f64; 2]>,
    pub speed: f64,
    #[serde(default)]
    pub origin_id: Option<String>,
    #[serde(default)]
    pub disallow: Vec<String>,
}

/// Lane to lane connection, lanes named `<edge>_<index>`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    pub id: String,
    pub edges: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VehicleTypeConfig {
    pub id: String,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub max_speed: Option<f64>,
    #[serde(default)]
    pub vclass: Option<String>,
    #[serde(default)]
    pub speed_factor: Option<f64>,
    #[serde(default)]
    pub min_gap: Option<f64>,
    #[serde(default)]
    pub accel: Option<f64>,
    #[serde(default)]
    pub decel: Option<f64>,
    #[serde(default)]
    pub tau: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VehicleConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub vtype: String,
    pub route: String,
    #[serde(default)]
    pub depart_ms: i64,
    /// Drive with the queue model instead of the micro model.
    #[serde(default)]
    pub meso: bool,
}

fn check_unique<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> Result<HashSet<&'a str>> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(invalid(format!("scenario: duplicate {kind} id '{id}'")));
        }
    }
    Ok(seen)
}

impl ScenarioConfig {
    pub fn validate(&self) -> Result<()> {
        let edges = check_unique("edge", self.edges.iter().map(|e| e.id.as_str()))?;
        let mut lanes = HashSet::new();
        for e in &self.edges {
            if e.lanes.is_empty() {
                return Err(invalid(format!("scenario: edge '{}' has no lanes", e.id)));
            }
            for (i, l) in e.lanes.iter().enumerate() {
                if l.shape.len() < 2 {
                    return Err(invalid(format!(
                        "scenario: lane {i} of edge '{}' needs at least two shape points",
                        e.id
                    )));
                }
                if !(l.speed.is_finite() && l.speed > 0.0) {
                    return Err(invalid(format!(
                        "scenario: lane {i} of edge '{}' needs a positive speed",
                        e.id
                    )));
                }
                lanes.insert(format!("{}_{i}", e.id));
            }
        }
        for c in &self.connections {
            for lane in [&c.from, &c.to] {
                if !lanes.contains(lane) {
                    return Err(invalid(format!(
                        "scenario: connection references unknown lane '{lane}'"
                    )));
                }
            }
        }

        let routes = check_unique("route", self.routes.iter().map(|r| r.id.as_str()))?;
        for r in &self.routes {
            if r.edges.is_empty() {
                return Err(invalid(format!("scenario: route '{}' has no edges", r.id)));
            }
            if let Some(e) = r.edges.iter().find(|e| !edges.contains(e.as_str())) {
                return Err(invalid(format!(
                    "scenario: route '{}' references unknown edge '{e}'",
                    r.id
                )));
            }
        }

        let types = check_unique("vehicle type", self.vehicle_types.iter().map(|t| t.id.as_str()))?;
        check_unique("vehicle", self.vehicles.iter().map(|v| v.id.as_str()))?;
        for v in &self.vehicles {
            if !routes.contains(v.route.as_str()) {
                return Err(invalid(format!(
                    "scenario: vehicle '{}' references unknown route '{}'",
                    v.id, v.route
                )));
            }
            let builtin = v.vtype == crate::sim::vtypes::DEFAULT_VTYPE_ID;
            if !builtin && !types.contains(v.vtype.as_str()) {
                return Err(invalid(format!(
                    "scenario: vehicle '{}' references unknown type '{}'",
                    v.id, v.vtype
                )));
            }
            if v.depart_ms < 0 {
                return Err(invalid(format!(
                    "scenario: vehicle '{}' has a negative departure time",
                    v.id
                )));
            }
        }
        Ok(())
    }
}
