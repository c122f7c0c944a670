//! Message and command framing.
//!
//! Message: `[length:i32][command]+` where `length` counts itself.
//! Command: `[length:u8][id:u8][body]`, or `[0x00][length:i32][id:u8][body]`
//! when the command does not fit in 255 bytes. Both lengths count the header.

use bytes::{Buf, Bytes, BytesMut};

use super::storage::{Reader, Storage};
use crate::error::{Result, TraciError};

/// Size of the message length prefix.
pub const MESSAGE_HEADER_LEN: usize = 4;

/// One command cut out of a message.
#[derive(Debug, Clone)]
pub struct RawCommand {
    pub id: u8,
    pub body: Bytes,
}

impl RawCommand {
    pub fn reader(&self) -> Reader {
        Reader::new(self.body.clone())
    }
}

/// Try to cut one complete message body out of `buf`.
///
/// Returns `Ok(None)` until enough bytes have arrived; bytes of a following
/// message stay in `buf`.
pub fn try_split_message(buf: &mut BytesMut, max_len: usize) -> Result<Option<Bytes>> {
    let Some(prefix) = buf.get(..MESSAGE_HEADER_LEN) else {
        return Ok(None);
    };
    let mut prefix = prefix;
    let declared = prefix.get_i32();

    let total = usize::try_from(declared)
        .ok()
        .filter(|n| *n >= MESSAGE_HEADER_LEN)
        .ok_or_else(|| TraciError::Protocol(format!("invalid message length {declared}")))?;
    if total > max_len {
        return Err(TraciError::Protocol(format!(
            "message length {total} exceeds limit {max_len}"
        )));
    }

    if buf.len() < total {
        buf.reserve(total - buf.len());
        return Ok(None);
    }

    let mut msg = buf.split_to(total);
    msg.advance(MESSAGE_HEADER_LEN);
    Ok(Some(msg.freeze()))
}

/// Prefix a message body with its length.
pub fn encode_message(body: &[u8]) -> Result<Bytes> {
    let mut out = Storage::new();
    out.write_len(body.len() + MESSAGE_HEADER_LEN)?;
    out.write_bytes(body);
    Ok(out.freeze())
}

/// Iterate the commands of one message body in arrival order.
///
/// After the first framing error the iterator is exhausted: once a length is
/// wrong no later command boundary can be trusted.
pub fn split_commands(body: Bytes) -> CommandIter {
    CommandIter {
        reader: Reader::new(body),
        failed: false,
    }
}

pub struct CommandIter {
    reader: Reader,
    failed: bool,
}

impl CommandIter {
    fn next_command(&mut self) -> Result<RawCommand> {
        let short = self.reader.read_u8()? as usize;
        let (total, header) = if short == 0 {
            let n = self.reader.read_i32()?;
            let n = usize::try_from(n)
                .map_err(|_| TraciError::Protocol(format!("invalid command length {n}")))?;
            (n, 5)
        } else {
            (short, 1)
        };
        if total < header + 1 {
            return Err(TraciError::Protocol(format!("command length {total} too short")));
        }
        let mut cmd = self.reader.take(total - header)?;
        let id = cmd.read_u8()?;
        if header == 5 {
            tracing::trace!(cmd = id, len = total, "extended-length command");
        }
        Ok(RawCommand { id, body: cmd.rest() })
    }
}

impl Iterator for CommandIter {
    type Item = Result<RawCommand>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.reader.is_empty() {
            return None;
        }
        let res = self.next_command();
        if res.is_err() {
            self.failed = true;
        }
        Some(res)
    }
}

/// Append a command (header + id + content) to `out`.
pub fn write_command(out: &mut Storage, id: u8, content: &[u8]) -> Result<()> {
    let short = 1 + 1 + content.len();
    if let Ok(short) = u8::try_from(short) {
        out.write_u8(short);
    } else {
        let mut len = Storage::new();
        len.write_len(1 + 4 + 1 + content.len())?;
        out.write_u8(0);
        out.write_bytes(len.as_slice());
    }
    out.write_u8(id);
    out.write_bytes(content);
    Ok(())
}
