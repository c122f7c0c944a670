//! Protocol modules.
//!
//! - `storage`: big-endian read cursor / write buffer.
//! - `value`: tagged values with strict, tag-checked decoding.
//! - `frame`: message length prefix and command headers.
//! - `response`: status sections and variable responses.
//!
//! All parsers are panic-free: malformed input is reported as `TraciError`
//! instead of panicking or indexing raw buffers.

pub mod constants;
pub mod frame;
pub mod response;
pub mod storage;
pub mod value;

pub use frame::{encode_message, split_commands, try_split_message, write_command, RawCommand};
pub use response::{Status, VariableResponse};
pub use storage::{Reader, Storage};
pub use value::{Color, TypedValue, ValueType};
