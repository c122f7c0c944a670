//! Vehicle types and their registry.

use std::collections::BTreeMap;

use traci_core::protocol::Color;

use super::SimError;

/// Separator used for per-vehicle copies of a type (`<type>@<vehicle>`).
pub const SINGULAR_SEPARATOR: char = '@';

/// Type every registry starts with.
pub const DEFAULT_VTYPE_ID: &str = "DEFAULT_VEHTYPE";

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleType {
    pub id: String,
    pub length: f64,
    pub max_speed: f64,
    pub vclass: String,
    pub speed_factor: f64,
    pub speed_deviation: f64,
    pub emission_class: String,
    pub width: f64,
    pub min_gap: f64,
    pub shape_class: String,
    pub accel: f64,
    pub decel: f64,
    pub imperfection: f64,
    pub tau: f64,
    pub color: Color,
}

impl VehicleType {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            length: 5.0,
            max_speed: 55.55,
            vclass: "passenger".into(),
            speed_factor: 1.0,
            speed_deviation: 0.0,
            emission_class: "P_7_7".into(),
            width: 1.8,
            min_gap: 2.5,
            shape_class: "passenger".into(),
            accel: 2.6,
            decel: 4.5,
            imperfection: 0.5,
            tau: 1.0,
            color: Color::YELLOW,
        }
    }
}

#[derive(Debug)]
pub struct VehicleTypes {
    types: BTreeMap<String, VehicleType>,
}

impl Default for VehicleTypes {
    fn default() -> Self {
        let mut types = BTreeMap::new();
        types.insert(DEFAULT_VTYPE_ID.to_string(), VehicleType::new(DEFAULT_VTYPE_ID));
        Self { types }
    }
}

impl VehicleTypes {
    pub fn add(&mut self, t: VehicleType) -> Result<(), SimError> {
        if self.types.contains_key(&t.id) {
            return Err(SimError::Duplicate { kind: "vehicle type", id: t.id });
        }
        self.types.insert(t.id.clone(), t);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&VehicleType> {
        self.types.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut VehicleType> {
        self.types.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.types.contains_key(id)
    }

    /// Ids in lexical order.
    pub fn ids(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }

    /// Id of a type private to `vehicle`, cloning `type_id` if needed.
    pub fn singular_for(&mut self, type_id: &str, vehicle: &str) -> Result<String, SimError> {
        if type_id.contains(SINGULAR_SEPARATOR) {
            return Ok(type_id.to_string());
        }
        let new_id = format!("{type_id}{SINGULAR_SEPARATOR}{vehicle}");
        if !self.types.contains_key(&new_id) {
            let mut t = self
                .types
                .get(type_id)
                .cloned()
                .ok_or_else(|| SimError::UnknownType(type_id.to_string()))?;
            t.id = new_id.clone();
            self.types.insert(new_id.clone(), t);
        }
        Ok(new_id)
    }
}
