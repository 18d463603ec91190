use super::{DecodeContext, PacketBody, PacketContext};
use crate::proto::{
    error::{ProtoError, Result},
    nbt::{Compound, read_network_compound, write_network_compound},
    state::ProtocolPhase,
    varint::{read_varint, write_holder_id, write_varint},
};

#[derive(Debug, Clone, PartialEq)]
pub enum DialogContent {
    /// Dialog from the client's registry. Only expressible in play; written as `id + 1`.
    Registered(i32),
    /// Dialog definition sent inline.
    Inline(Compound),
}

/// Show dialog (S2C), 1.21.6+.
///
/// In configuration the body is a bare tag tree; in play it is a holder id
/// followed by the tag tree only when the id is zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ShowDialog {
    pub content: DialogContent,
}

impl PacketBody for ShowDialog {
    fn decode_body(input: &mut &[u8], ctx: &DecodeContext<'_>) -> Result<Self> {
        let content = match ctx.phase {
            ProtocolPhase::Configuration => {
                DialogContent::Inline(read_network_compound(input, ctx.version)?)
            }
            _ => match read_varint(input)? {
                0 => DialogContent::Inline(read_network_compound(input, ctx.version)?),
                id if id > 0 => DialogContent::Registered(id - 1),
                other => {
                    return Err(ProtoError::InvalidEnum {
                        kind: "dialog holder",
                        value: other,
                    });
                }
            },
        };
        Ok(Self { content })
    }

    fn encode_body(&self, out: &mut Vec<u8>, ctx: &PacketContext) -> Result<()> {
        match (ctx.phase, &self.content) {
            (ProtocolPhase::Configuration, DialogContent::Inline(dialog)) => {
                write_network_compound(out, dialog, ctx.version)
            }
            (ProtocolPhase::Configuration, DialogContent::Registered(_)) => {
                Err(ProtoError::WrongPhase("registered dialog"))
            }
            (_, DialogContent::Inline(dialog)) => {
                write_varint(out, 0);
                write_network_compound(out, dialog, ctx.version)
            }
            (_, DialogContent::Registered(id)) => write_holder_id(out, *id, "dialog holder"),
        }
    }
}
