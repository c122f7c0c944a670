#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use traci_server::config::build_simulation;
use traci_server::routing::{
    DijkstraRouter, NoRestrictions, Router, TravelTime, VehicleView, WithRestrictions,
};
use traci_server::sim::geom::Position;
use traci_server::sim::network::{EdgeFunction, EdgeId, LaneSpec, Network, NetworkBuilder};
use traci_server::sim::weights::{EdgeWeights, WeightKind};
use traci_server::sim::Simulation;

fn sim() -> Simulation {
    build_simulation(&common::config()).unwrap()
}

fn edges(net: &Network, names: &[&str]) -> Vec<EdgeId> {
    names.iter().map(|n| net.edge_by_name(n).unwrap()).collect()
}

fn view<'a>(weights: &'a EdgeWeights, vclass: &'a str) -> VehicleView<'a> {
    VehicleView { weights, vclass, max_speed: 50.0 }
}

#[test]
fn shortest_travel_time_path() {
    let sim = sim();
    let w = EdgeWeights::default();
    let [a, c] = [sim.net.edge_by_name("A").unwrap(), sim.net.edge_by_name("C").unwrap()];
    let path = sim
        .router(WeightKind::TravelTime)
        .compute(&sim.net, a, c, &view(&w, "passenger"), 0)
        .unwrap();
    assert_eq!(path, edges(&sim.net, &["A", "B", "C"]));

    let same = sim
        .router(WeightKind::TravelTime)
        .compute(&sim.net, a, a, &view(&w, "passenger"), 0)
        .unwrap();
    assert_eq!(same, vec![a]);
}

#[test]
fn travel_time_override_diverts_the_path() {
    let sim = sim();
    let mut w = EdgeWeights::default();
    let b = sim.net.edge_by_name("B").unwrap();
    w.table_mut(WeightKind::TravelTime).add(b, 0, 1_000_000, 1000.0);

    let [a, c] = [sim.net.edge_by_name("A").unwrap(), sim.net.edge_by_name("C").unwrap()];
    let path = sim
        .router(WeightKind::TravelTime)
        .compute(&sim.net, a, c, &view(&w, "passenger"), 0)
        .unwrap();
    assert_eq!(path, edges(&sim.net, &["A", "D", "C"]));

    // outside the window the override does not apply
    let later = sim
        .router(WeightKind::TravelTime)
        .compute(&sim.net, a, c, &view(&w, "passenger"), 2_000_000)
        .unwrap();
    assert_eq!(later, edges(&sim.net, &["A", "B", "C"]));
}

/// Effort on A is large enough to skip past a window that starts at
/// departure; B's window still covers the moment B is actually entered.
fn effort_weights(sim: &Simulation) -> EdgeWeights {
    let mut w = EdgeWeights::default();
    let [a, b, d] = [
        sim.net.edge_by_name("A").unwrap(),
        sim.net.edge_by_name("B").unwrap(),
        sim.net.edge_by_name("D").unwrap(),
    ];
    let table = w.table_mut(WeightKind::Effort);
    table.add(a, 0, 1_000_000_000, 1000.0);
    table.add(b, 0, 10_000, 100.0);
    table.add(d, 0, 1_000_000_000, 50.0);
    w
}

#[test]
fn effort_is_looked_up_at_the_travel_time_arrival() {
    let sim = sim();
    let w = effort_weights(&sim);
    let router = sim.router(WeightKind::Effort);
    // A takes 100 m / 13.89 m/s, so B is entered around 7.2 s
    let cost = router.recompute_costs(&sim.net, &edges(&sim.net, &["A", "B"]), &view(&w, "passenger"), 0);
    assert!((cost - 1100.0).abs() < 1e-9, "got {cost}");

    // entered after its window closes, B costs nothing
    let late = router.recompute_costs(&sim.net, &edges(&sim.net, &["A", "B"]), &view(&w, "passenger"), 5_000);
    assert!((late - 1000.0).abs() < 1e-9, "got {late}");
}

#[test]
fn effort_route_avoids_an_edge_expensive_on_arrival() {
    let sim = sim();
    let w = effort_weights(&sim);
    let [a, c] = [sim.net.edge_by_name("A").unwrap(), sim.net.edge_by_name("C").unwrap()];
    let path = sim
        .router(WeightKind::Effort)
        .compute(&sim.net, a, c, &view(&w, "passenger"), 0)
        .unwrap();
    assert_eq!(path, edges(&sim.net, &["A", "D", "C"]));
}

#[test]
fn disconnected_target_has_no_route() {
    let sim = sim();
    let w = EdgeWeights::default();
    let [a, x] = [sim.net.edge_by_name("A").unwrap(), sim.net.edge_by_name("X").unwrap()];
    assert!(sim
        .router(WeightKind::TravelTime)
        .compute(&sim.net, a, x, &view(&w, "passenger"), 0)
        .is_none());
}

fn lane(shape: &[(f64, f64)], disallow: &[&str]) -> LaneSpec {
    LaneSpec {
        shape: shape.iter().map(|(x, y)| Position::new(*x, *y)).collect(),
        speed: 10.0,
        origin_id: None,
        disallow: disallow.iter().map(|s| s.to_string()).collect(),
    }
}

/// P then either a short Q (no trucks) or a long R, then S.
fn restricted_net() -> Network {
    let mut b = NetworkBuilder::new();
    let p = b.add_edge("P", "j0", "j1", EdgeFunction::Normal).unwrap();
    b.add_lane(p, lane(&[(0.0, 0.0), (10.0, 0.0)], &[])).unwrap();
    let q = b.add_edge("Q", "j1", "j2", EdgeFunction::Normal).unwrap();
    b.add_lane(q, lane(&[(10.0, 0.0), (20.0, 0.0)], &["truck"])).unwrap();
    let r = b.add_edge("R", "j1", "j2", EdgeFunction::Normal).unwrap();
    b.add_lane(r, lane(&[(10.0, 0.0), (15.0, 40.0), (20.0, 0.0)], &[])).unwrap();
    let s = b.add_edge("S", "j2", "j3", EdgeFunction::Normal).unwrap();
    b.add_lane(s, lane(&[(20.0, 0.0), (30.0, 0.0)], &[])).unwrap();
    b.connect("P_0", "Q_0").unwrap();
    b.connect("P_0", "R_0").unwrap();
    b.connect("Q_0", "S_0").unwrap();
    b.connect("R_0", "S_0").unwrap();
    b.build()
}

#[test]
fn restrictions_keep_a_class_off_disallowed_edges() {
    let net = restricted_net();
    let w = EdgeWeights::default();
    let [p, s] = [net.edge_by_name("P").unwrap(), net.edge_by_name("S").unwrap()];

    let strict = DijkstraRouter::new("strict", TravelTime, WithRestrictions);
    assert_eq!(
        strict.compute(&net, p, s, &view(&w, "truck"), 0).unwrap(),
        edges(&net, &["P", "R", "S"])
    );
    assert_eq!(
        strict.compute(&net, p, s, &view(&w, "passenger"), 0).unwrap(),
        edges(&net, &["P", "Q", "S"])
    );

    let lax = DijkstraRouter::new("lax", TravelTime, NoRestrictions);
    assert_eq!(
        lax.compute(&net, p, s, &view(&w, "truck"), 0).unwrap(),
        edges(&net, &["P", "Q", "S"])
    );

    let q = net.edge_by_name("Q").unwrap();
    assert!(strict.compute(&net, p, q, &view(&w, "truck"), 0).is_none());
}

#[test]
fn recomputed_cost_sums_edge_travel_times() {
    let net = restricted_net();
    let w = EdgeWeights::default();
    let router = DijkstraRouter::new("tt", TravelTime, WithRestrictions);
    let cost = router.recompute_costs(&net, &edges(&net, &["P", "Q", "S"]), &view(&w, "passenger"), 0);
    assert!((cost - 3.0).abs() < 1e-9, "got {cost}");
}

#[test]
fn statistics_count_queries_and_visits() {
    let net = restricted_net();
    let w = EdgeWeights::default();
    let router = DijkstraRouter::new("tt", TravelTime, WithRestrictions);
    assert_eq!(router.stats().queries, 0);
    assert_eq!(router.stats().avg_visits(), 0.0);

    let [p, s] = [net.edge_by_name("P").unwrap(), net.edge_by_name("S").unwrap()];
    router.compute(&net, p, s, &view(&w, "passenger"), 0);
    router.compute(&net, p, p, &view(&w, "passenger"), 0);
    let stats = router.stats();
    assert_eq!(stats.queries, 2);
    assert!(stats.visits >= 4);
    assert!(stats.avg_visits() >= 2.0);
}
