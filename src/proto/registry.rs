//! Versioned packet id tables.
//!
//! Every (phase, direction, version) triple resolves to a [`CodecTable`]
//! built once at startup. Tables are data: a list of registrations mapping
//! version ranges to packet ids, with an explicit policy for ids that are not
//! registered.

use std::{
    collections::HashMap,
    sync::LazyLock,
};

use super::{
    error::{ProtoError, Result, debug_log_error},
    packets::{
        AcknowledgeConfiguration, AcknowledgeFinishConfiguration, BossBarPacket, CodeOfConduct,
        DecodeContext, DecodeFn, FinishConfiguration, Handshake, LoginAcknowledged,
        LoginDisconnect, LoginPluginMessage, LoginPluginResponse, LoginStart, Packet,
        PacketContext, PacketKind, ShowDialog, SoundEntity, StartConfiguration, StatusPing,
        StatusPong, StatusRequest, StatusResponse, StopSound, decoder,
    },
    state::{Direction, ProtocolPhase},
    types::PacketFrame,
    version::ProtocolVersion,
};

/// What a table does with a frame whose id it does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownPacketPolicy {
    /// The frame is a protocol violation.
    Error,
    /// The frame is handed back untouched for raw forwarding.
    Ignore,
}

impl UnknownPacketPolicy {
    /// Default policy: strict until configuration, forwarding afterwards.
    pub fn for_table(phase: ProtocolPhase, direction: Direction) -> Self {
        match (phase, direction) {
            (ProtocolPhase::Handshake, Direction::Serverbound) => Self::Error,
            (ProtocolPhase::Handshake, Direction::Clientbound) => Self::Error,
            (ProtocolPhase::Status, Direction::Serverbound) => Self::Error,
            (ProtocolPhase::Status, Direction::Clientbound) => Self::Error,
            (ProtocolPhase::Login, Direction::Serverbound) => Self::Error,
            (ProtocolPhase::Login, Direction::Clientbound) => Self::Error,
            (ProtocolPhase::Configuration, Direction::Serverbound) => Self::Ignore,
            (ProtocolPhase::Configuration, Direction::Clientbound) => Self::Ignore,
            (ProtocolPhase::Play, Direction::Serverbound) => Self::Ignore,
            (ProtocolPhase::Play, Direction::Clientbound) => Self::Ignore,
        }
    }
}

/// Outcome of decoding one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Packet(Packet),
    /// Unknown id in a table that forwards what it does not understand.
    Unhandled(PacketFrame),
}

struct Registration {
    kind: PacketKind,
    phase: ProtocolPhase,
    direction: Direction,
    decode: DecodeFn,
    /// `(first version, id)` pairs, ascending.
    ids: &'static [(ProtocolVersion, i32)],
    /// First version the packet no longer exists in.
    until: Option<ProtocolVersion>,
}

impl Registration {
    fn id_for(&self, version: ProtocolVersion) -> Option<i32> {
        if self.until.is_some_and(|until| version >= until) {
            return None;
        }
        self.ids
            .iter()
            .rev()
            .find(|(since, _)| *since <= version)
            .map(|(_, id)| *id)
    }
}

type V = ProtocolVersion;

fn registrations() -> Vec<Registration> {
    use Direction::{Clientbound as S2C, Serverbound as C2S};
    use ProtocolPhase::{Configuration, Handshake as Hs, Login, Play, Status};

    macro_rules! reg {
        ($kind:ident, $ty:ty, $phase:expr, $dir:expr, [$(($v:expr, $id:expr)),+ $(,)?]) => {
            reg!($kind, $ty, $phase, $dir, [$(($v, $id)),+], None)
        };
        ($kind:ident, $ty:ty, $phase:expr, $dir:expr, [$(($v:expr, $id:expr)),+ $(,)?], $until:expr) => {
            Registration {
                kind: PacketKind::$kind,
                phase: $phase,
                direction: $dir,
                decode: decoder::<$ty>(),
                ids: &[$(($v, $id)),+],
                until: $until,
            }
        };
    }

    vec![
        reg!(Handshake, Handshake, Hs, C2S, [(V::MINIMUM, 0x00)]),
        reg!(StatusRequest, StatusRequest, Status, C2S, [(V::MINIMUM, 0x00)]),
        reg!(StatusPing, StatusPing, Status, C2S, [(V::MINIMUM, 0x01)]),
        reg!(StatusResponse, StatusResponse, Status, S2C, [(V::MINIMUM, 0x00)]),
        reg!(StatusPong, StatusPong, Status, S2C, [(V::MINIMUM, 0x01)]),
        reg!(LoginStart, LoginStart, Login, C2S, [(V::MINIMUM, 0x00)]),
        reg!(
            LoginPluginResponse,
            LoginPluginResponse,
            Login,
            C2S,
            [(V::MINECRAFT_1_13, 0x02)]
        ),
        reg!(
            LoginAcknowledged,
            LoginAcknowledged,
            Login,
            C2S,
            [(V::MINECRAFT_1_20_2, 0x03)]
        ),
        reg!(LoginDisconnect, LoginDisconnect, Login, S2C, [(V::MINIMUM, 0x00)]),
        reg!(
            LoginPluginMessage,
            LoginPluginMessage,
            Login,
            S2C,
            [(V::MINECRAFT_1_13, 0x04)]
        ),
        reg!(
            FinishConfiguration,
            FinishConfiguration,
            Configuration,
            S2C,
            [(V::MINECRAFT_1_20_2, 0x02), (V::MINECRAFT_1_20_5, 0x03)]
        ),
        reg!(
            ShowDialog,
            ShowDialog,
            Configuration,
            S2C,
            [(V::MINECRAFT_1_21_6, 0x12)]
        ),
        reg!(
            CodeOfConduct,
            CodeOfConduct,
            Configuration,
            S2C,
            [(V::MINECRAFT_1_21_9, 0x13)]
        ),
        reg!(
            AcknowledgeFinishConfiguration,
            AcknowledgeFinishConfiguration,
            Configuration,
            C2S,
            [(V::MINECRAFT_1_20_2, 0x02), (V::MINECRAFT_1_20_5, 0x03)]
        ),
        reg!(
            BossBar,
            BossBarPacket,
            Play,
            S2C,
            [
                (V::MINECRAFT_1_12_2, 0x0C),
                (V::MINECRAFT_1_19, 0x0A),
                (V::MINECRAFT_1_21_5, 0x09),
            ]
        ),
        reg!(
            StopSound,
            StopSound,
            Play,
            S2C,
            [
                (V::MINECRAFT_1_19_3, 0x5F),
                (V::MINECRAFT_1_20_2, 0x66),
                (V::MINECRAFT_1_20_3, 0x68),
                (V::MINECRAFT_1_20_5, 0x6A),
                (V::MINECRAFT_1_21_2, 0x71),
                (V::MINECRAFT_1_21_5, 0x70),
            ]
        ),
        reg!(
            SoundEntity,
            SoundEntity,
            Play,
            S2C,
            [
                (V::MINECRAFT_1_19_3, 0x5D),
                (V::MINECRAFT_1_20_2, 0x64),
                (V::MINECRAFT_1_20_3, 0x66),
                (V::MINECRAFT_1_20_5, 0x67),
                (V::MINECRAFT_1_21_2, 0x6E),
                (V::MINECRAFT_1_21_5, 0x6D),
            ]
        ),
        reg!(
            StartConfiguration,
            StartConfiguration,
            Play,
            S2C,
            [
                (V::MINECRAFT_1_20_2, 0x65),
                (V::MINECRAFT_1_20_3, 0x67),
                (V::MINECRAFT_1_20_5, 0x69),
                (V::MINECRAFT_1_21_2, 0x70),
                (V::MINECRAFT_1_21_5, 0x6F),
            ]
        ),
        reg!(ShowDialog, ShowDialog, Play, S2C, [(V::MINECRAFT_1_21_6, 0x85)]),
        reg!(
            AcknowledgeConfiguration,
            AcknowledgeConfiguration,
            Play,
            C2S,
            [
                (V::MINECRAFT_1_20_2, 0x0B),
                (V::MINECRAFT_1_20_5, 0x0C),
                (V::MINECRAFT_1_21_2, 0x0E),
            ]
        ),
    ]
}

/// Packet ids of one phase and direction for one protocol version.
#[derive(Debug)]
pub struct CodecTable {
    phase: ProtocolPhase,
    direction: Direction,
    version: ProtocolVersion,
    unknown: UnknownPacketPolicy,
    by_id: HashMap<i32, (PacketKind, DecodeFn)>,
    by_kind: HashMap<PacketKind, i32>,
}

impl CodecTable {
    fn build(
        phase: ProtocolPhase,
        direction: Direction,
        version: ProtocolVersion,
        unknown: UnknownPacketPolicy,
        all: &[Registration],
    ) -> Self {
        let mut by_id = HashMap::new();
        let mut by_kind = HashMap::new();
        for reg in all
            .iter()
            .filter(|reg| reg.phase == phase && reg.direction == direction)
        {
            if let Some(id) = reg.id_for(version) {
                by_id.insert(id, (reg.kind, reg.decode));
                by_kind.insert(reg.kind, id);
            }
        }
        Self {
            phase,
            direction,
            version,
            unknown,
            by_id,
            by_kind,
        }
    }

    pub fn context(&self) -> PacketContext {
        PacketContext {
            phase: self.phase,
            direction: self.direction,
            version: self.version,
        }
    }

    pub fn unknown_policy(&self) -> UnknownPacketPolicy {
        self.unknown
    }

    pub fn id_of(&self, kind: PacketKind) -> Option<i32> {
        self.by_kind.get(&kind).copied()
    }

    pub fn kind_of(&self, id: i32) -> Option<PacketKind> {
        self.by_id.get(&id).map(|(kind, _)| *kind)
    }

    /// Decodes a frame. The body must be consumed exactly.
    pub fn decode(&self, frame: &PacketFrame) -> Result<Decoded> {
        let Some((_, decode)) = self.by_id.get(&frame.id) else {
            return match self.unknown {
                UnknownPacketPolicy::Ignore => Ok(Decoded::Unhandled(frame.clone())),
                UnknownPacketPolicy::Error => {
                    let err = ProtoError::InvalidPacketId {
                        phase: self.phase,
                        direction: self.direction,
                        id: frame.id,
                    };
                    debug_log_error("unknown packet id", &err);
                    Err(err)
                }
            };
        };

        let ctx = DecodeContext {
            phase: self.phase,
            direction: self.direction,
            version: self.version,
            body: &frame.body,
        };
        let mut input = &frame.body[..];
        let packet = decode(&mut input, &ctx)?;
        if !input.is_empty() {
            let err = ProtoError::TrailingBytes(input.len());
            debug_log_error("packet body not fully consumed", &err);
            return Err(err);
        }
        Ok(Decoded::Packet(packet))
    }

    pub fn encode(&self, packet: &Packet) -> Result<PacketFrame> {
        let kind = packet.kind();
        let id = self
            .id_of(kind)
            .ok_or(ProtoError::UnregisteredPacket {
                kind: kind.name(),
                phase: self.phase,
                direction: self.direction,
                version: self.version,
            })?;
        let ctx = self.context();
        let mut body = Vec::with_capacity(packet.size_hint(&ctx).unwrap_or(64));
        packet.encode_body(&mut body, &ctx)?;
        Ok(PacketFrame::new(id, body))
    }
}

/// All codec tables for every supported version.
#[derive(Debug)]
pub struct PacketRegistry {
    tables: HashMap<(ProtocolPhase, Direction, ProtocolVersion), CodecTable>,
}

static SHARED: LazyLock<PacketRegistry> = LazyLock::new(PacketRegistry::new);

impl Default for PacketRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketRegistry {
    pub fn new() -> Self {
        Self::with_policy(UnknownPacketPolicy::for_table)
    }

    /// Builds every table, asking `policy` how each (phase, direction) treats
    /// ids it does not know.
    pub fn with_policy(policy: impl Fn(ProtocolPhase, Direction) -> UnknownPacketPolicy) -> Self {
        let all = registrations();
        let mut tables = HashMap::new();
        for version in ProtocolVersion::SUPPORTED {
            for phase in ProtocolPhase::ALL {
                for direction in [Direction::Serverbound, Direction::Clientbound] {
                    tables.insert(
                        (phase, direction, version),
                        CodecTable::build(phase, direction, version, policy(phase, direction), &all),
                    );
                }
            }
        }
        Self { tables }
    }

    /// Process-wide registry, built on first use.
    pub fn shared() -> &'static PacketRegistry {
        &SHARED
    }

    pub fn resolve(
        &self,
        phase: ProtocolPhase,
        direction: Direction,
        version: ProtocolVersion,
    ) -> Result<&CodecTable> {
        self.tables
            .get(&(phase, direction, version))
            .ok_or(ProtoError::UnsupportedVersion(version))
    }

    pub fn is_registered(
        &self,
        kind: PacketKind,
        phase: ProtocolPhase,
        direction: Direction,
        version: ProtocolVersion,
    ) -> bool {
        self.resolve(phase, direction, version)
            .is_ok_and(|table| table.id_of(kind).is_some())
    }
}
