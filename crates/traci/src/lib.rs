//! Top-level facade crate for the TraCI server.
//!
//! Re-exports the wire primitives and the server library so users can depend
//! on a single crate.

pub mod core {
    pub use traci_core::*;
}

pub mod server {
    pub use traci_server::*;
}
