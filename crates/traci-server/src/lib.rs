//! TraCI server library entry.
//!
//! Wires the TCP transport, session engine, command dispatcher and the
//! vehicle domain services over an in-memory simulation. Consumed by the
//! binary (`main.rs`) and by integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod mapping;
pub mod obs;
pub mod routing;
pub mod services;
pub mod sim;
pub mod transport;
