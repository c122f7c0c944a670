//! Read cursor and write storage for the big-endian wire layout (panic-free).
//!
//! Parsing rules:
//! - Never index (`buf[0]`) — always check `remaining()` before a `Buf` read.
//! - Never `unwrap()` / `expect()` / `panic!()` in production paths.
//! - Lengths and counts read off the wire are validated against the bytes
//!   actually left before anything is allocated.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Result, TraciError};

/// Immutable view over a command body with an explicit read position.
#[derive(Debug, Clone)]
pub struct Reader {
    buf: Bytes,
    start_len: usize,
}

impl Reader {
    pub fn new(buf: Bytes) -> Self {
        let start_len = buf.len();
        Self { buf, start_len }
    }

    /// Bytes consumed since construction.
    pub fn consumed(&self) -> usize {
        self.start_len - self.buf.remaining()
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub fn is_empty(&self) -> bool {
        !self.buf.has_remaining()
    }

    fn need(&self, n: usize) -> Result<()> {
        if self.buf.remaining() < n {
            return Err(TraciError::Truncated {
                needed: n,
                remaining: self.buf.remaining(),
            });
        }
        Ok(())
    }

    /// Look at the next byte without consuming it.
    pub fn peek_u8(&self) -> Result<u8> {
        self.buf.chunk().first().copied().ok_or(TraciError::Truncated {
            needed: 1,
            remaining: 0,
        })
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.need(1)?;
        Ok(self.buf.get_i8())
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.need(4)?;
        Ok(self.buf.get_i32())
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.need(8)?;
        Ok(self.buf.get_f64())
    }

    fn read_len(&mut self, what: &str) -> Result<usize> {
        let n = self.read_i32()?;
        usize::try_from(n).map_err(|_| TraciError::Protocol(format!("negative {what} length {n}")))
    }

    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_len("string")?;
        self.need(len)?;
        let raw = self.buf.copy_to_bytes(len);
        String::from_utf8(raw.to_vec())
            .map_err(|e| TraciError::Protocol(format!("string is not valid utf-8: {e}")))
    }

    pub fn read_string_list(&mut self) -> Result<Vec<String>> {
        let count = self.read_len("string list")?;
        // every entry carries at least its 4-byte length
        self.need(count.saturating_mul(4))?;
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(self.read_string()?);
        }
        Ok(out)
    }

    /// Split off the next `n` bytes as their own reader.
    pub fn take(&mut self, n: usize) -> Result<Reader> {
        self.need(n)?;
        Ok(Reader::new(self.buf.copy_to_bytes(n)))
    }

    /// Everything not read yet.
    pub fn rest(&mut self) -> Bytes {
        self.buf.copy_to_bytes(self.buf.remaining())
    }
}

/// Growable output buffer using the same layout as [`Reader`].
#[derive(Debug, Default, Clone)]
pub struct Storage {
    buf: BytesMut,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.put_u8(v);
    }

    pub fn write_i8(&mut self, v: i8) {
        self.buf.put_i8(v);
    }

    pub fn write_i32(&mut self, v: i32) {
        self.buf.put_i32(v);
    }

    pub fn write_f64(&mut self, v: f64) {
        self.buf.put_f64(v);
    }

    /// Length or count prefix. Nothing is written if `n` exceeds `i32::MAX`.
    pub fn write_len(&mut self, n: usize) -> Result<()> {
        let n = i32::try_from(n)
            .map_err(|_| TraciError::internal(format!("length {n} does not fit an i32 prefix")))?;
        self.buf.put_i32(n);
        Ok(())
    }

    pub fn write_string(&mut self, s: &str) -> Result<()> {
        self.write_len(s.len())?;
        self.buf.put_slice(s.as_bytes());
        Ok(())
    }

    pub fn write_string_list<S: AsRef<str>>(&mut self, items: &[S]) -> Result<()> {
        self.write_len(items.len())?;
        for s in items {
            self.write_string(s.as_ref())?;
        }
        Ok(())
    }

    pub fn write_bytes(&mut self, b: &[u8]) {
        self.buf.put_slice(b);
    }

    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}
