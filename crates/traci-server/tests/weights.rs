#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use traci_server::sim::network::EdgeId;
use traci_server::sim::weights::{EdgeWeights, WeightKind, WeightTable};

#[test]
fn window_is_end_exclusive() {
    let mut t = WeightTable::default();
    t.add(EdgeId(0), 1000, 5000, 7.0);
    assert_eq!(t.retrieve(EdgeId(0), 999), None);
    assert_eq!(t.retrieve(EdgeId(0), 1000), Some(7.0));
    assert_eq!(t.retrieve(EdgeId(0), 4999), Some(7.0));
    assert_eq!(t.retrieve(EdgeId(0), 5000), None);
    assert_eq!(t.retrieve(EdgeId(1), 2000), None);
}

#[test]
fn later_entries_shadow_earlier_ones() {
    let mut t = WeightTable::default();
    t.add(EdgeId(3), 0, 10_000, 1.0);
    t.add(EdgeId(3), 2000, 4000, 9.0);
    assert_eq!(t.retrieve(EdgeId(3), 1000), Some(1.0));
    assert_eq!(t.retrieve(EdgeId(3), 3000), Some(9.0));
    assert_eq!(t.retrieve(EdgeId(3), 5000), Some(1.0));
}

#[test]
fn remove_forgets_every_interval() {
    let mut t = WeightTable::default();
    t.add(EdgeId(2), 0, 10, 1.0);
    t.add(EdgeId(2), 10, 20, 2.0);
    assert!(t.knows(EdgeId(2)));
    t.remove(EdgeId(2));
    assert!(!t.knows(EdgeId(2)));
    assert_eq!(t.retrieve(EdgeId(2), 5), None);
}

#[test]
fn travel_time_and_effort_are_separate() {
    let mut w = EdgeWeights::default();
    w.table_mut(WeightKind::Effort).add(EdgeId(0), 0, 100, 4.0);
    assert!(w.table(WeightKind::Effort).knows(EdgeId(0)));
    assert!(!w.table(WeightKind::TravelTime).knows(EdgeId(0)));
    assert_eq!(WeightKind::TravelTime.as_str(), "travel time");
    assert_eq!(WeightKind::Effort.as_str(), "effort");
}
