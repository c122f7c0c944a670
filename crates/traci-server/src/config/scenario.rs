//! Turns a validated config into a ready simulation.

use traci_core::error::{Result, TraciError};

use super::schema::{EdgeFunctionConfig, ServerConfig, VehicleTypeConfig};
use crate::sim::geom::Position;
use crate::sim::network::{EdgeFunction, NetworkBuilder, LaneSpec};
use crate::sim::params::{DepartTime, VehicleParams};
use crate::sim::route::Route;
use crate::sim::vtypes::VehicleType;
use crate::sim::Simulation;

fn vehicle_type(cfg: &VehicleTypeConfig) -> VehicleType {
    let mut t = VehicleType::new(cfg.id.clone());
    if let Some(v) = cfg.length {
        t.length = v;
    }
    if let Some(v) = cfg.max_speed {
        t.max_speed = v;
    }
    if let Some(v) = &cfg.vclass {
        t.vclass = v.clone();
    }
    if let Some(v) = cfg.speed_factor {
        t.speed_factor = v;
    }
    if let Some(v) = cfg.min_gap {
        t.min_gap = v;
    }
    if let Some(v) = cfg.accel {
        t.accel = v;
    }
    if let Some(v) = cfg.decel {
        t.decel = v;
    }
    if let Some(v) = cfg.tau {
        t.tau = v;
    }
    t
}

/// Build the network, routes, types and initial demand described by `cfg`.
pub fn build_simulation(cfg: &ServerConfig) -> Result<Simulation> {
    let sc = &cfg.scenario;
    let mut b = NetworkBuilder::new();
    for e in &sc.edges {
        let function = match e.function {
            EdgeFunctionConfig::Normal => EdgeFunction::Normal,
            EdgeFunctionConfig::Internal => EdgeFunction::Internal,
        };
        let eid = b.add_edge(&e.id, &e.from, &e.to, function)?;
        for l in &e.lanes {
            b.add_lane(
                eid,
                LaneSpec {
                    shape: l.shape.iter().map(|[x, y]| Position::new(*x, *y)).collect(),
                    speed: l.speed,
                    origin_id: l.origin_id.clone(),
                    disallow: l.disallow.clone(),
                },
            )?;
        }
    }
    for c in &sc.connections {
        b.connect(&c.from, &c.to)?;
    }

    let mut sim = Simulation::new(b.build(), cfg.simulation.step_length_ms, cfg.simulation.begin_ms);
    for r in &sc.routes {
        let edges = r
            .edges
            .iter()
            .map(|e| {
                sim.net
                    .edge_by_name(e)
                    .ok_or_else(|| TraciError::Config(format!("route '{}': unknown edge '{e}'", r.id)))
            })
            .collect::<Result<Vec<_>>>()?;
        sim.routes.add(Route::new(r.id.clone(), edges))?;
    }
    for t in &sc.vehicle_types {
        sim.types.add(vehicle_type(t))?;
    }
    for v in &sc.vehicles {
        let route = sim
            .routes
            .get(&v.route)
            .ok_or_else(|| TraciError::Config(format!("vehicle '{}': unknown route '{}'", v.id, v.route)))?;
        let params = VehicleParams::new(v.id.clone(), DepartTime::At(v.depart_ms));
        if v.meso {
            sim.build_meso_vehicle(params, &v.vtype, route)?;
        } else {
            sim.build_vehicle(params, &v.vtype, route)?;
        }
    }
    tracing::info!(
        edges = sim.net.edge_count(),
        routes = sim.routes.len(),
        vehicles = sim.vehicles.len(),
        "scenario loaded"
    );
    Ok(sim)
}
