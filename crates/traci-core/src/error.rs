//! Shared error type across traci crates.

use thiserror::Error;

/// Result byte carried in every status section (stable wire API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    /// Command executed.
    Ok,
    /// Command id not handled by this server.
    NotImplemented,
    /// Recoverable, command-scoped failure.
    Error,
}

impl ResultCode {
    /// Wire representation.
    pub fn as_u8(self) -> u8 {
        match self {
            ResultCode::Ok => 0x00,
            ResultCode::NotImplemented => 0x01,
            ResultCode::Error => 0xFF,
        }
    }

    /// Parse a result byte as sent by a server.
    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            0x00 => Some(ResultCode::Ok),
            0x01 => Some(ResultCode::NotImplemented),
            0xFF => Some(ResultCode::Error),
            _ => None,
        }
    }

    /// String representation used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ResultCode::Ok => "OK",
            ResultCode::NotImplemented => "NOT_IMPLEMENTED",
            ResultCode::Error => "ERR",
        }
    }
}

/// Error classes of the protocol engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed framing, truncated buffer, unknown command.
    Protocol,
    /// Unsupported variable, wrong arity or type, out-of-range or unknown ids.
    Validation,
    /// Valid request the simulation cannot satisfy.
    Domain,
    /// Collaborator failure caught at the handler boundary.
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Protocol => "PROTOCOL",
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::Domain => "DOMAIN",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, TraciError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum TraciError {
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("buffer truncated: needed {needed} byte(s), {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },
    #[error("type mismatch: expected tag 0x{expected:02x}, found 0x{found:02x}")]
    TypeMismatch { expected: u8, found: u8 },
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Domain(String),
    #[error("command 0x{0:02x} not implemented")]
    NotImplemented(u8),
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl TraciError {
    pub fn validation(msg: impl Into<String>) -> Self {
        TraciError::Validation(msg.into())
    }

    pub fn domain(msg: impl Into<String>) -> Self {
        TraciError::Domain(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        TraciError::Internal(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TraciError::Protocol(_) | TraciError::Truncated { .. } | TraciError::NotImplemented(_) => {
                ErrorKind::Protocol
            }
            TraciError::TypeMismatch { .. } | TraciError::Validation(_) | TraciError::Config(_) => {
                ErrorKind::Validation
            }
            TraciError::Domain(_) => ErrorKind::Domain,
            TraciError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Map an error to the result byte written into the status section.
    pub fn result_code(&self) -> ResultCode {
        match self {
            TraciError::NotImplemented(_) => ResultCode::NotImplemented,
            _ => ResultCode::Error,
        }
    }
}

/// Turns low-level decode failures into descriptive validation errors.
pub trait ResultExt<T> {
    fn or_invalid(self, msg: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn or_invalid(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|_| TraciError::Validation(msg.into()))
    }
}
