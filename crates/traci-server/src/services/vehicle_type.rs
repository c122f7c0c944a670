//! Vehicle type domain (`0xa5` / `0xc5`).
//!
//! Attribute reads and writes live in free functions so the vehicle domain
//! can fall back to them for variables it does not handle itself.

use num_enum::TryFromPrimitive;

use traci_core::error::{Result, ResultExt, TraciError};
use traci_core::protocol::constants::*;
use traci_core::protocol::{Color, Reader, TypedValue};

use crate::dispatch::DomainService;
use crate::sim::vtypes::VehicleType;
use crate::sim::Simulation;

const VEHICLE_CLASSES: &[&str] = &[
    "ignoring", "private", "emergency", "authority", "army", "vip", "passenger", "hov", "taxi",
    "bus", "coach", "delivery", "truck", "trailer", "tram", "rail_urban", "rail", "rail_electric",
    "motorcycle", "moped", "bicycle", "pedestrian", "evehicle", "custom1", "custom2",
];

/// Attributes shared by the vehicle type and vehicle domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum TypeVariable {
    Length = VAR_LENGTH,
    MaxSpeed = VAR_MAXSPEED,
    VehicleClass = VAR_VEHICLECLASS,
    SpeedFactor = VAR_SPEED_FACTOR,
    SpeedDeviation = VAR_SPEED_DEVIATION,
    EmissionClass = VAR_EMISSIONCLASS,
    Width = VAR_WIDTH,
    MinGap = VAR_MINGAP,
    ShapeClass = VAR_SHAPECLASS,
    Accel = VAR_ACCEL,
    Decel = VAR_DECEL,
    Imperfection = VAR_IMPERFECTION,
    Tau = VAR_TAU,
    Color = VAR_COLOR,
}

/// A validated attribute write, not yet applied.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeChange {
    Length(f64),
    MaxSpeed(f64),
    VehicleClass(String),
    SpeedFactor(f64),
    SpeedDeviation(f64),
    EmissionClass(String),
    Width(f64),
    MinGap(f64),
    ShapeClass(String),
    Accel(f64),
    Decel(f64),
    Imperfection(f64),
    Tau(f64),
    Color(Color),
}

impl TypeChange {
    pub fn apply(self, t: &mut VehicleType) {
        match self {
            TypeChange::Length(v) => t.length = v,
            TypeChange::MaxSpeed(v) => t.max_speed = v,
            TypeChange::VehicleClass(v) => t.vclass = v,
            TypeChange::SpeedFactor(v) => t.speed_factor = v,
            TypeChange::SpeedDeviation(v) => t.speed_deviation = v,
            TypeChange::EmissionClass(v) => t.emission_class = v,
            TypeChange::Width(v) => t.width = v,
            TypeChange::MinGap(v) => t.min_gap = v,
            TypeChange::ShapeClass(v) => t.shape_class = v,
            TypeChange::Accel(v) => t.accel = v,
            TypeChange::Decel(v) => t.decel = v,
            TypeChange::Imperfection(v) => t.imperfection = v,
            TypeChange::Tau(v) => t.tau = v,
            TypeChange::Color(c) => t.color = c,
        }
    }
}

pub fn get_type_variable(t: &VehicleType, var: TypeVariable) -> TypedValue {
    match var {
        TypeVariable::Length => TypedValue::Double(t.length),
        TypeVariable::MaxSpeed => TypedValue::Double(t.max_speed),
        TypeVariable::VehicleClass => TypedValue::String(t.vclass.clone()),
        TypeVariable::SpeedFactor => TypedValue::Double(t.speed_factor),
        TypeVariable::SpeedDeviation => TypedValue::Double(t.speed_deviation),
        TypeVariable::EmissionClass => TypedValue::String(t.emission_class.clone()),
        TypeVariable::Width => TypedValue::Double(t.width),
        TypeVariable::MinGap => TypedValue::Double(t.min_gap),
        TypeVariable::ShapeClass => TypedValue::String(t.shape_class.clone()),
        TypeVariable::Accel => TypedValue::Double(t.accel),
        TypeVariable::Decel => TypedValue::Double(t.decel),
        TypeVariable::Imperfection => TypedValue::Double(t.imperfection),
        TypeVariable::Tau => TypedValue::Double(t.tau),
        TypeVariable::Color => TypedValue::Color(t.color),
    }
}

fn positive(v: f64, msg: &str) -> Result<f64> {
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err(TraciError::validation(msg))
    }
}

/// Decode and check the new value of `var` without touching any type.
pub fn read_type_change(var: TypeVariable, r: &mut Reader) -> Result<TypeChange> {
    Ok(match var {
        TypeVariable::Length => {
            let v = r.read_typed_double().or_invalid("Setting length requires a double.")?;
            TypeChange::Length(positive(v, "Invalid length.")?)
        }
        TypeVariable::MaxSpeed => {
            let v = r.read_typed_double().or_invalid("Setting maximum speed requires a double.")?;
            TypeChange::MaxSpeed(positive(v, "Invalid maximum speed.")?)
        }
        TypeVariable::VehicleClass => {
            let v = r.read_typed_string().or_invalid("Setting vehicle class requires a string.")?;
            if !VEHICLE_CLASSES.contains(&v.as_str()) {
                return Err(TraciError::validation(format!("Unknown vehicle class '{v}'.")));
            }
            TypeChange::VehicleClass(v)
        }
        TypeVariable::SpeedFactor => TypeChange::SpeedFactor(
            r.read_typed_double().or_invalid("Setting speed factor requires a double.")?,
        ),
        TypeVariable::SpeedDeviation => TypeChange::SpeedDeviation(
            r.read_typed_double().or_invalid("Setting speed deviation requires a double.")?,
        ),
        TypeVariable::EmissionClass => TypeChange::EmissionClass(
            r.read_typed_string().or_invalid("Setting emission class requires a string.")?,
        ),
        TypeVariable::Width => {
            let v = r.read_typed_double().or_invalid("Setting width requires a double.")?;
            TypeChange::Width(positive(v, "Invalid width.")?)
        }
        TypeVariable::MinGap => TypeChange::MinGap(
            r.read_typed_double().or_invalid("Setting minimum gap requires a double.")?,
        ),
        TypeVariable::ShapeClass => TypeChange::ShapeClass(
            r.read_typed_string().or_invalid("Setting vehicle shape requires a string.")?,
        ),
        TypeVariable::Accel => TypeChange::Accel(
            r.read_typed_double().or_invalid("Setting acceleration requires a double.")?,
        ),
        TypeVariable::Decel => TypeChange::Decel(
            r.read_typed_double().or_invalid("Setting deceleration requires a double.")?,
        ),
        TypeVariable::Imperfection => TypeChange::Imperfection(
            r.read_typed_double().or_invalid("Setting driver imperfection requires a double.")?,
        ),
        TypeVariable::Tau => TypeChange::Tau(
            r.read_typed_double().or_invalid("Setting headway time requires a double.")?,
        ),
        TypeVariable::Color => TypeChange::Color(
            r.read_typed_color().or_invalid("The color must be given using the according type.")?,
        ),
    })
}

#[derive(Debug, Default)]
pub struct VehicleTypeService;

impl VehicleTypeService {
    pub fn new() -> Self {
        Self
    }
}

impl DomainService for VehicleTypeService {
    fn label(&self) -> &'static str {
        "Vehicle Type"
    }

    fn get_command(&self) -> u8 {
        CMD_GET_VEHICLETYPE_VARIABLE
    }

    fn set_command(&self) -> u8 {
        CMD_SET_VEHICLETYPE_VARIABLE
    }

    fn response_command(&self) -> u8 {
        RESPONSE_GET_VEHICLETYPE_VARIABLE
    }

    fn supports_get(&self, variable: u8) -> bool {
        variable == ID_LIST || variable == ID_COUNT || TypeVariable::try_from(variable).is_ok()
    }

    fn supports_set(&self, variable: u8) -> bool {
        TypeVariable::try_from(variable).is_ok()
    }

    fn process_get(
        &self,
        sim: &Simulation,
        variable: u8,
        id: &str,
        _params: &mut Reader,
    ) -> Result<TypedValue> {
        match variable {
            ID_LIST => return Ok(TypedValue::StringList(sim.types.ids())),
            ID_COUNT => return Ok(TypedValue::Int(sim.types.ids().len() as i32)),
            _ => {}
        }
        let var = TypeVariable::try_from(variable).map_err(|_| {
            TraciError::validation("Get Vehicle Type Variable: unsupported variable specified")
        })?;
        let t = sim
            .types
            .get(id)
            .ok_or_else(|| TraciError::validation(format!("Vehicle type '{id}' is not known")))?;
        Ok(get_type_variable(t, var))
    }

    fn process_set(
        &self,
        sim: &mut Simulation,
        variable: u8,
        id: &str,
        params: &mut Reader,
    ) -> Result<()> {
        let var = TypeVariable::try_from(variable).map_err(|_| {
            TraciError::validation("Change Vehicle Type State: unsupported variable specified")
        })?;
        if !sim.types.contains(id) {
            return Err(TraciError::validation(format!("Vehicle type '{id}' is not known")));
        }
        let change = read_type_change(var, params)?;
        if let Some(t) = sim.types.get_mut(id) {
            change.apply(t);
        }
        Ok(())
    }
}
