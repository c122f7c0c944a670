//! Length-prefixed message codec for the controller socket.
//!
//! - Decoding yields complete message bodies (length prefix stripped), no
//!   matter how the stream was fragmented.
//! - Encoding prefixes a reply body with its length.

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use traci_core::protocol::frame::MESSAGE_HEADER_LEN;
use traci_core::protocol::try_split_message;

use super::TransportError;

#[derive(Debug, Clone)]
pub struct TraciCodec {
    max_message_bytes: usize,
}

impl TraciCodec {
    pub fn new(max_message_bytes: usize) -> Self {
        Self { max_message_bytes }
    }
}

impl Decoder for TraciCodec {
    type Item = Bytes;
    type Error = TransportError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>, TransportError> {
        Ok(try_split_message(src, self.max_message_bytes)?)
    }
}

impl Encoder<Bytes> for TraciCodec {
    type Error = TransportError;

    fn encode(&mut self, body: Bytes, dst: &mut BytesMut) -> Result<(), TransportError> {
        let total = body.len() + MESSAGE_HEADER_LEN;
        let len = i32::try_from(total).map_err(|_| TransportError::TooLarge(total))?;
        dst.reserve(total);
        dst.put_i32(len);
        dst.extend_from_slice(&body);
        Ok(())
    }
}
