use super::{DecodeContext, PacketBody, PacketContext};
use crate::proto::{
    error::{ProtoError, Result},
    io::{read_string_bounded, read_u16_be, write_string_bounded, write_u16_be},
    state::HandshakeNextState,
    varint::{read_varint, write_varint},
    version::ProtocolVersion,
};

const MAX_ADDRESS_LEN: usize = 255;

/// Handshake (C2S) packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub protocol_version: i32,
    pub server_address: String,
    pub server_port: u16,
    pub next_state: HandshakeNextState,
}

impl Handshake {
    pub fn protocol_version(&self) -> ProtocolVersion {
        ProtocolVersion(self.protocol_version)
    }

    /// Virtual host with any Forge-style `\0` suffix stripped.
    pub fn stripped_hostname(&self) -> &str {
        self.server_address
            .split('\0')
            .next()
            .unwrap_or_default()
            .trim_end_matches('.')
    }
}

impl PacketBody for Handshake {
    fn decode_body(input: &mut &[u8], _ctx: &DecodeContext<'_>) -> Result<Self> {
        let protocol_version = read_varint(input)?;
        let server_address = read_string_bounded(input, MAX_ADDRESS_LEN)?.to_owned();
        let server_port = read_u16_be(input)?;
        let next_state_raw = read_varint(input)?;
        let next_state = match HandshakeNextState::from_raw(next_state_raw) {
            Some(HandshakeNextState::Transfer)
                if ProtocolVersion(protocol_version) < ProtocolVersion::MINECRAFT_1_20_5 =>
            {
                return Err(ProtoError::InvalidHandshakeState(next_state_raw));
            }
            Some(state) => state,
            None => return Err(ProtoError::InvalidHandshakeState(next_state_raw)),
        };

        Ok(Self {
            protocol_version,
            server_address,
            server_port,
            next_state,
        })
    }

    fn encode_body(&self, out: &mut Vec<u8>, _ctx: &PacketContext) -> Result<()> {
        write_varint(out, self.protocol_version);
        write_string_bounded(out, &self.server_address, MAX_ADDRESS_LEN)?;
        write_u16_be(out, self.server_port);
        write_varint(out, self.next_state.as_raw());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handshake_with_addr(addr: &str) -> Handshake {
        Handshake {
            protocol_version: 767,
            server_address: addr.to_string(),
            server_port: 25565,
            next_state: HandshakeNextState::Login,
        }
    }

    #[test]
    fn stripped_hostname_stops_at_first_nul() {
        let hs = handshake_with_addr("example.com\0FML2\0");
        assert_eq!(hs.stripped_hostname(), "example.com");

        let hs = handshake_with_addr("example.com.");
        assert_eq!(hs.stripped_hostname(), "example.com");
    }
}
