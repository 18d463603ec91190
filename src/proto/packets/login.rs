use bytes::Bytes;

use super::{DecodeContext, PacketBody, PacketContext};
use crate::proto::{
    component::Component,
    error::{ProtoError, Result},
    io::{
        read_bool, read_byte_array, read_i64_be, read_remaining, read_string_bounded, read_uuid,
        retain, write_bool, write_byte_array, write_i64_be, write_string_bounded, write_uuid,
    },
    types::Uuid,
    varint::{read_varint, varint_len, write_varint},
    version::ProtocolVersion,
};

const MAX_USERNAME: usize = 16;
const MAX_CHANNEL: usize = 32_767;
const MAX_PUBLIC_KEY: usize = 512;
const MAX_KEY_SIGNATURE: usize = 4096;

/// Login start (C2S) packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginStart {
    pub username: String,
    pub profile_id: Option<Uuid>,
    pub sig_data: Option<LoginStartSigData>,
}

/// Signed public key sent by 1.19 clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginStartSigData {
    pub timestamp: i64,
    pub public_key: Bytes,
    pub signature: Bytes,
}

/// Login disconnect (S2C). The reason stays JSON on every version.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginDisconnect {
    pub reason: Component,
}

/// Login plugin request (S2C), 1.13+.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginPluginMessage {
    pub id: i32,
    pub channel: String,
    pub data: Bytes,
}

/// Login plugin response (C2S), 1.13+.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginPluginResponse {
    pub id: i32,
    pub success: bool,
    pub data: Bytes,
}

/// Login acknowledged (C2S), 1.20.2+. Moves the connection into configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginAcknowledged;

impl PacketBody for LoginStart {
    fn decode_body(input: &mut &[u8], ctx: &DecodeContext<'_>) -> Result<Self> {
        let version = ctx.version;
        let username = read_string_bounded(input, MAX_USERNAME)?.to_owned();
        let mut profile_id = None;
        let mut sig_data = None;

        if version >= ProtocolVersion::MINECRAFT_1_20_2 {
            profile_id = Some(read_uuid(input)?);
        } else if version >= ProtocolVersion::MINECRAFT_1_19_3 {
            if read_bool(input)? {
                profile_id = Some(read_uuid(input)?);
            }
        } else if version >= ProtocolVersion::MINECRAFT_1_19 && read_bool(input)? {
            let timestamp = read_i64_be(input)?;
            let public_key = retain(ctx.body, read_byte_array(input, MAX_PUBLIC_KEY)?);
            let signature = retain(ctx.body, read_byte_array(input, MAX_KEY_SIGNATURE)?);
            sig_data = Some(LoginStartSigData {
                timestamp,
                public_key,
                signature,
            });
        }

        Ok(Self {
            username,
            profile_id,
            sig_data,
        })
    }

    fn encode_body(&self, out: &mut Vec<u8>, ctx: &PacketContext) -> Result<()> {
        let version = ctx.version;
        write_string_bounded(out, &self.username, MAX_USERNAME)?;
        if version >= ProtocolVersion::MINECRAFT_1_20_2 {
            let uuid = self
                .profile_id
                .ok_or(ProtoError::MissingField("login_start.uuid"))?;
            write_uuid(out, &uuid);
        } else if version >= ProtocolVersion::MINECRAFT_1_19_3 {
            write_bool(out, self.profile_id.is_some());
            if let Some(uuid) = &self.profile_id {
                write_uuid(out, uuid);
            }
        } else if version >= ProtocolVersion::MINECRAFT_1_19 {
            write_bool(out, self.sig_data.is_some());
            if let Some(sig_data) = &self.sig_data {
                write_i64_be(out, sig_data.timestamp);
                write_byte_array(out, &sig_data.public_key)?;
                write_byte_array(out, &sig_data.signature)?;
            }
        }
        Ok(())
    }
}

impl PacketBody for LoginDisconnect {
    fn decode_body(input: &mut &[u8], _ctx: &DecodeContext<'_>) -> Result<Self> {
        Ok(Self {
            reason: Component::read_json(input)?,
        })
    }

    fn encode_body(&self, out: &mut Vec<u8>, _ctx: &PacketContext) -> Result<()> {
        self.reason.write_json(out)
    }
}

impl PacketBody for LoginPluginMessage {
    fn decode_body(input: &mut &[u8], ctx: &DecodeContext<'_>) -> Result<Self> {
        let id = read_varint(input)?;
        let channel = read_string_bounded(input, MAX_CHANNEL)?.to_owned();
        let data = read_remaining(input, ctx.body);
        Ok(Self { id, channel, data })
    }

    fn encode_body(&self, out: &mut Vec<u8>, _ctx: &PacketContext) -> Result<()> {
        write_varint(out, self.id);
        write_string_bounded(out, &self.channel, MAX_CHANNEL)?;
        out.extend_from_slice(&self.data);
        Ok(())
    }

    fn size_hint(&self, _ctx: &PacketContext) -> Option<usize> {
        Some(
            varint_len(self.id)
                + varint_len(self.channel.len() as i32)
                + self.channel.len()
                + self.data.len(),
        )
    }
}

impl PacketBody for LoginPluginResponse {
    fn decode_body(input: &mut &[u8], ctx: &DecodeContext<'_>) -> Result<Self> {
        let id = read_varint(input)?;
        let success = read_bool(input)?;
        let data = read_remaining(input, ctx.body);
        Ok(Self { id, success, data })
    }

    fn encode_body(&self, out: &mut Vec<u8>, _ctx: &PacketContext) -> Result<()> {
        write_varint(out, self.id);
        write_bool(out, self.success);
        out.extend_from_slice(&self.data);
        Ok(())
    }

    fn size_hint(&self, _ctx: &PacketContext) -> Option<usize> {
        Some(varint_len(self.id) + 1 + self.data.len())
    }
}

impl PacketBody for LoginAcknowledged {
    fn decode_body(_input: &mut &[u8], _ctx: &DecodeContext<'_>) -> Result<Self> {
        Ok(Self)
    }

    fn encode_body(&self, _out: &mut Vec<u8>, _ctx: &PacketContext) -> Result<()> {
        Ok(())
    }
}
