use std::fmt::Display;

use bytes::Bytes;

use super::{
    error::{ProtoError, Result, debug_log_error},
    varint::{read_varint, read_varint_partial, varint_len, write_varint},
};

/// Maximum packet length in bytes (protocol limit).
pub const MAX_PACKET_SIZE: usize = 2_097_152;

/// UUID stored as 16 raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uuid([u8; 16]);

impl Uuid {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn from_u64s(msb: u64, lsb: u64) -> Self {
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&msb.to_be_bytes());
        bytes[8..].copy_from_slice(&lsb.to_be_bytes());
        Self(bytes)
    }

    /// Random version 4 UUID.
    #[must_use]
    pub fn new_v4() -> Self {
        let mut bytes: [u8; 16] = rand::random();
        bytes[6] = (bytes[6] & 0x0f) | 0x40;
        bytes[8] = (bytes[8] & 0x3f) | 0x80;
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    #[must_use]
    pub fn as_u64s(&self) -> (u64, u64) {
        let mut msb = [0u8; 8];
        let mut lsb = [0u8; 8];
        msb.copy_from_slice(&self.0[..8]);
        lsb.copy_from_slice(&self.0[8..]);
        (u64::from_be_bytes(msb), u64::from_be_bytes(lsb))
    }
}

impl Display for Uuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let b = &self.0;
        for (i, byte) in b.iter().enumerate() {
            if matches!(i, 4 | 6 | 8 | 10) {
                f.write_str("-")?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Decoded packet frame with the raw body (without ID).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketFrame {
    pub id: i32,
    pub body: Bytes,
}

impl PacketFrame {
    pub fn new(id: i32, body: impl Into<Bytes>) -> Self {
        Self {
            id,
            body: body.into(),
        }
    }
}

/// Packet decoder for length-prefixed frames.
pub struct PacketDecoder {
    buf: Vec<u8>,
    pos: usize,
}

/// Packet encoder for length-prefixed frames.
pub struct PacketEncoder {
    buf: Vec<u8>,
}

impl Default for PacketDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketDecoder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            pos: 0,
        }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            pos: 0,
        }
    }

    pub fn queue_slice(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn try_next_packet(&mut self) -> Result<Option<PacketFrame>> {
        let data = &self.buf[self.pos..];
        let (packet_len, len_len) = match read_varint_partial(data) {
            Ok(Some(value)) => value,
            Ok(None) => return Ok(None),
            Err(err) => {
                debug_log_error("packet length varint decode failed", &err);
                return Err(err);
            }
        };

        if packet_len < 0 {
            let err = ProtoError::NegativeLength(packet_len);
            debug_log_error("negative packet length", &err);
            return Err(err);
        }

        let packet_len = packet_len as usize;
        if packet_len > MAX_PACKET_SIZE {
            let err = ProtoError::PacketTooLarge { len: packet_len };
            debug_log_error("packet too large", &err);
            return Err(err);
        }

        let total_len = len_len + packet_len;
        if data.len() < total_len {
            return Ok(None);
        }

        let mut body = &data[len_len..total_len];
        let id = match read_varint(&mut body) {
            Ok(value) => value,
            Err(err) => {
                debug_log_error("packet id varint decode failed", &err);
                return Err(err);
            }
        };
        let body = Bytes::copy_from_slice(body);

        self.pos += total_len;
        self.compact_if_needed();

        Ok(Some(PacketFrame { id, body }))
    }

    fn compact_if_needed(&mut self) {
        if self.pos == 0 {
            return;
        }

        if self.pos >= self.buf.len() / 2 {
            self.buf.drain(..self.pos);
            self.pos = 0;
        }
    }
}

impl Default for PacketEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketEncoder {
    #[must_use]
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn write_frame(&mut self, frame: &PacketFrame) -> Result<()> {
        encode_raw_packet(&mut self.buf, frame.id, &frame.body)
    }

    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

pub fn encode_raw_packet(out: &mut Vec<u8>, id: i32, body: &[u8]) -> Result<()> {
    let packet_len = varint_len(id) + body.len();
    if packet_len > MAX_PACKET_SIZE {
        return Err(ProtoError::PacketTooLarge { len: packet_len });
    }

    write_varint(out, packet_len as i32);
    write_varint(out, id);
    out.extend_from_slice(body);
    Ok(())
}
