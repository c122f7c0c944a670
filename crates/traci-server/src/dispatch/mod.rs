//! Command dispatch.
//!
//! Re-exports the dispatcher and the domain service trait so services and
//! the session engine can depend on this module directly.

pub mod dispatcher;
pub mod params;

pub use dispatcher::{Dispatcher, DomainService};
pub use params::{field, Args, Field, Schema};
