//! Typed packets and the sum type the dispatcher matches on.

mod bossbar;
mod config;
mod dialog;
mod handshake;
mod login;
mod play;
mod sound;
mod status;

use bytes::Bytes;

use super::{
    error::Result,
    state::{Direction, ProtocolPhase},
    version::ProtocolVersion,
};

pub use bossbar::{BossBarAction, BossBarColor, BossBarOverlay, BossBarPacket};
pub use config::{AcknowledgeFinishConfiguration, CodeOfConduct, FinishConfiguration};
pub use dialog::{DialogContent, ShowDialog};
pub use handshake::Handshake;
pub use login::{
    LoginAcknowledged, LoginDisconnect, LoginPluginMessage, LoginPluginResponse, LoginStart,
    LoginStartSigData,
};
pub use play::{AcknowledgeConfiguration, StartConfiguration};
pub use sound::{SoundEntity, SoundEvent, SoundSource, StopSound};
pub use status::{StatusPing, StatusPong, StatusRequest, StatusResponse};

/// Phase, direction and version a packet body is encoded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PacketContext {
    pub phase: ProtocolPhase,
    pub direction: Direction,
    pub version: ProtocolVersion,
}

/// Decode-side context; also carries the owning frame body so raw payloads
/// can be retained without copying.
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext<'a> {
    pub phase: ProtocolPhase,
    pub direction: Direction,
    pub version: ProtocolVersion,
    pub body: &'a Bytes,
}

impl DecodeContext<'_> {
    pub fn context(&self) -> PacketContext {
        PacketContext {
            phase: self.phase,
            direction: self.direction,
            version: self.version,
        }
    }
}

/// Body codec of a single packet type. Packet IDs live in the registry.
pub trait PacketBody: Sized {
    fn decode_body(input: &mut &[u8], ctx: &DecodeContext<'_>) -> Result<Self>;

    fn encode_body(&self, out: &mut Vec<u8>, ctx: &PacketContext) -> Result<()>;

    /// Exact or estimated encoded body length, used to presize buffers.
    fn size_hint(&self, _ctx: &PacketContext) -> Option<usize> {
        None
    }
}

pub(crate) type DecodeFn = fn(&mut &[u8], &DecodeContext<'_>) -> Result<Packet>;

pub(crate) fn decoder<T>() -> DecodeFn
where
    T: PacketBody,
    Packet: From<T>,
{
    |input, ctx| T::decode_body(input, ctx).map(Packet::from)
}

macro_rules! packet_set {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        /// Any packet understood by the session layer.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Packet {
            $($variant($ty),)*
        }

        /// Discriminant of [`Packet`], used as the registry lookup key.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum PacketKind {
            $($variant,)*
        }

        impl PacketKind {
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)*
                }
            }
        }

        impl Packet {
            pub fn kind(&self) -> PacketKind {
                match self {
                    $(Self::$variant(_) => PacketKind::$variant,)*
                }
            }

            pub fn encode_body(&self, out: &mut Vec<u8>, ctx: &PacketContext) -> Result<()> {
                match self {
                    $(Self::$variant(packet) => packet.encode_body(out, ctx),)*
                }
            }

            pub fn size_hint(&self, ctx: &PacketContext) -> Option<usize> {
                match self {
                    $(Self::$variant(packet) => packet.size_hint(ctx),)*
                }
            }
        }

        $(
            impl From<$ty> for Packet {
                fn from(packet: $ty) -> Self {
                    Self::$variant(packet)
                }
            }
        )*
    };
}

packet_set! {
    Handshake(Handshake),
    StatusRequest(StatusRequest),
    StatusResponse(StatusResponse),
    StatusPing(StatusPing),
    StatusPong(StatusPong),
    LoginStart(LoginStart),
    LoginDisconnect(LoginDisconnect),
    LoginPluginMessage(LoginPluginMessage),
    LoginPluginResponse(LoginPluginResponse),
    LoginAcknowledged(LoginAcknowledged),
    FinishConfiguration(FinishConfiguration),
    AcknowledgeFinishConfiguration(AcknowledgeFinishConfiguration),
    StartConfiguration(StartConfiguration),
    AcknowledgeConfiguration(AcknowledgeConfiguration),
    BossBar(BossBarPacket),
    StopSound(StopSound),
    SoundEntity(SoundEntity),
    ShowDialog(ShowDialog),
    CodeOfConduct(CodeOfConduct),
}
