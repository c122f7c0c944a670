//! Transport layer (TCP).
//!
//! One controller is served at a time; the codec reassembles messages from
//! the byte stream before they reach the engine.

pub mod codec;
pub mod tcp;

use thiserror::Error;
use traci_core::error::TraciError;

pub use codec::TraciCodec;
pub use tcp::{serve, run_session, SessionEnd};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] TraciError),

    #[error("no message within {0} ms")]
    Timeout(u64),

    #[error("reply of {0} bytes does not fit the length prefix")]
    TooLarge(usize),
}

impl TransportError {
    /// Metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            TransportError::Io(_) => "io",
            TransportError::Protocol(_) => "message_framing",
            TransportError::Timeout(_) => "timeout",
            TransportError::TooLarge(_) => "reply_too_large",
        }
    }
}
