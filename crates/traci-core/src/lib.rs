//! traci core: transport-agnostic wire primitives and the shared error type.
//!
//! This crate defines the byte-level contracts of the remote-control
//! protocol: typed values, message and command framing, and status
//! responses. It carries no transport or runtime dependencies so servers,
//! clients and test tooling can share it.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Every fallible
//! path surfaces as `TraciError`/`Result` so malformed input from a
//! controller never crashes the simulation process.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{ErrorKind, Result, ResultCode, ResultExt, TraciError};
