use super::{DecodeContext, PacketBody, PacketContext};
use crate::proto::error::Result;

/// Start configuration (S2C, play), 1.20.2+. Sent when the client is moved to a new backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartConfiguration;

/// Acknowledge configuration (C2S, play), 1.20.2+. Moves the connection back into configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcknowledgeConfiguration;

impl PacketBody for StartConfiguration {
    fn decode_body(_input: &mut &[u8], _ctx: &DecodeContext<'_>) -> Result<Self> {
        Ok(Self)
    }

    fn encode_body(&self, _out: &mut Vec<u8>, _ctx: &PacketContext) -> Result<()> {
        Ok(())
    }
}

impl PacketBody for AcknowledgeConfiguration {
    fn decode_body(_input: &mut &[u8], _ctx: &DecodeContext<'_>) -> Result<Self> {
        Ok(Self)
    }

    fn encode_body(&self, _out: &mut Vec<u8>, _ctx: &PacketContext) -> Result<()> {
        Ok(())
    }
}
