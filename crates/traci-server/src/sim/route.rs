//! Routes and the route dictionary.

use std::collections::HashMap;
use std::sync::Arc;

use super::network::{EdgeId, Network};
use super::SimError;

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub id: String,
    pub edges: Vec<EdgeId>,
}

impl Route {
    pub fn new(id: impl Into<String>, edges: Vec<EdgeId>) -> Self {
        Self { id: id.into(), edges }
    }

    pub fn contains(&self, e: EdgeId) -> bool {
        self.edges.contains(&e)
    }

    /// Driving distance from `from_pos` on `from_edge` to `to_pos` on
    /// `to_edge`, searching from route index `start`. `None` if `to_edge`
    /// is not reached along the route.
    pub fn distance_between(
        &self,
        net: &Network,
        start: usize,
        from_pos: f64,
        to_pos: f64,
        from_edge: EdgeId,
        to_edge: EdgeId,
    ) -> Option<f64> {
        if from_edge == to_edge && from_pos <= to_pos {
            return Some(to_pos - from_pos);
        }
        let from_idx = self
            .edges
            .iter()
            .skip(start)
            .position(|e| *e == from_edge)?
            + start;
        let mut distance = net.edge_length(from_edge) - from_pos;
        for e in self.edges.iter().skip(from_idx + 1) {
            if *e == to_edge {
                return Some(distance + to_pos);
            }
            distance += net.edge_length(*e);
        }
        None
    }
}

#[derive(Debug, Default)]
pub struct RouteDictionary {
    routes: HashMap<String, Arc<Route>>,
}

impl RouteDictionary {
    pub fn add(&mut self, route: Route) -> Result<Arc<Route>, SimError> {
        let r = Arc::new(route);
        self.add_shared(Arc::clone(&r))?;
        Ok(r)
    }

    /// Register a route that vehicles may already hold.
    pub fn add_shared(&mut self, route: Arc<Route>) -> Result<(), SimError> {
        if route.edges.is_empty() {
            return Err(SimError::EmptyRoute(route.id.clone()));
        }
        if self.routes.contains_key(&route.id) {
            return Err(SimError::Duplicate { kind: "route", id: route.id.clone() });
        }
        self.routes.insert(route.id.clone(), route);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<Route>> {
        self.routes.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.routes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
