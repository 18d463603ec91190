use super::{DecodeContext, PacketBody, PacketContext};
use crate::proto::{
    error::Result,
    io::{read_i64_be, read_string_bounded, write_i64_be, write_string_bounded},
};

const MAX_STATUS_JSON: usize = 32_767;

/// Status request (C2S) packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRequest;

/// Status ping (C2S) packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPing {
    pub payload: i64,
}

/// Status response (S2C) packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusResponse {
    pub json: String,
}

/// Status pong (S2C) packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPong {
    pub payload: i64,
}

impl PacketBody for StatusRequest {
    fn decode_body(_input: &mut &[u8], _ctx: &DecodeContext<'_>) -> Result<Self> {
        Ok(Self)
    }

    fn encode_body(&self, _out: &mut Vec<u8>, _ctx: &PacketContext) -> Result<()> {
        Ok(())
    }
}

impl PacketBody for StatusPing {
    fn decode_body(input: &mut &[u8], _ctx: &DecodeContext<'_>) -> Result<Self> {
        Ok(Self {
            payload: read_i64_be(input)?,
        })
    }

    fn encode_body(&self, out: &mut Vec<u8>, _ctx: &PacketContext) -> Result<()> {
        write_i64_be(out, self.payload);
        Ok(())
    }
}

impl PacketBody for StatusResponse {
    fn decode_body(input: &mut &[u8], _ctx: &DecodeContext<'_>) -> Result<Self> {
        Ok(Self {
            json: read_string_bounded(input, MAX_STATUS_JSON)?.to_owned(),
        })
    }

    fn encode_body(&self, out: &mut Vec<u8>, _ctx: &PacketContext) -> Result<()> {
        write_string_bounded(out, &self.json, MAX_STATUS_JSON)
    }
}

impl PacketBody for StatusPong {
    fn decode_body(input: &mut &[u8], _ctx: &DecodeContext<'_>) -> Result<Self> {
        Ok(Self {
            payload: read_i64_be(input)?,
        })
    }

    fn encode_body(&self, out: &mut Vec<u8>, _ctx: &PacketContext) -> Result<()> {
        write_i64_be(out, self.payload);
        Ok(())
    }
}
