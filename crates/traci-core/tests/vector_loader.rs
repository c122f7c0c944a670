//! Typed value vectors: hex-encoded wire bytes plus the expected decode
//! result or error kind.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValueVector {
    pub description: String,
    /// Tag byte followed by the payload, hex encoded.
    pub wire: String,
    #[serde(default)]
    pub expect: Option<serde_json::Value>,
    #[serde(default)]
    pub expect_error: Option<ExpectedError>,
}

#[derive(Debug, Deserialize)]
pub struct ExpectedError {
    /// `ErrorKind::as_str` of the decode failure.
    pub kind: String,
}

impl ValueVector {
    pub fn bytes(&self) -> Vec<u8> {
        hex::decode(&self.wire)
            .unwrap_or_else(|e| panic!("{}: bad hex in vector: {e}", self.description))
    }
}

pub fn load(name: &str) -> ValueVector {
    let path = format!("{}/tests/vectors/{name}", env!("CARGO_MANIFEST_DIR"));
    let s = std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("{path}: {e}"));
    serde_json::from_str(&s).unwrap_or_else(|e| panic!("{path}: {e}"))
}
