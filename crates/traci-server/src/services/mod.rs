//! Domain services registered with the dispatcher.

pub mod vehicle;
pub mod vehicle_type;

pub use vehicle::VehicleService;
pub use vehicle_type::VehicleTypeService;
