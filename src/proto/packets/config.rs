use bytes::Bytes;

use super::{DecodeContext, PacketBody, PacketContext};
use crate::proto::{error::Result, io::read_remaining};

/// Finish configuration (S2C), 1.20.2+.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishConfiguration;

/// Acknowledge finish configuration (C2S), 1.20.2+. Moves the connection into play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcknowledgeFinishConfiguration;

/// Server code of conduct (S2C, configuration), 1.21.9+.
///
/// The proxy never interprets it: the body is retained as-is and re-emitted verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeOfConduct {
    pub content: Bytes,
}

impl PacketBody for FinishConfiguration {
    fn decode_body(_input: &mut &[u8], _ctx: &DecodeContext<'_>) -> Result<Self> {
        Ok(Self)
    }

    fn encode_body(&self, _out: &mut Vec<u8>, _ctx: &PacketContext) -> Result<()> {
        Ok(())
    }
}

impl PacketBody for AcknowledgeFinishConfiguration {
    fn decode_body(_input: &mut &[u8], _ctx: &DecodeContext<'_>) -> Result<Self> {
        Ok(Self)
    }

    fn encode_body(&self, _out: &mut Vec<u8>, _ctx: &PacketContext) -> Result<()> {
        Ok(())
    }
}

impl PacketBody for CodeOfConduct {
    fn decode_body(input: &mut &[u8], ctx: &DecodeContext<'_>) -> Result<Self> {
        Ok(Self {
            content: read_remaining(input, ctx.body),
        })
    }

    fn encode_body(&self, out: &mut Vec<u8>, _ctx: &PacketContext) -> Result<()> {
        out.extend_from_slice(&self.content);
        Ok(())
    }

    fn size_hint(&self, _ctx: &PacketContext) -> Option<usize> {
        Some(self.content.len())
    }
}
