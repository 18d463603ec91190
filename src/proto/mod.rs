//! Wire codec: framing, primitives and the versioned packet registry.

mod component;
mod error;
mod io;
mod key;
mod nbt;
mod packets;
mod registry;
mod state;
mod types;
mod varint;
mod version;


pub use component::Component;
pub use error::{ProtoError, Result};
pub use key::{DEFAULT_NAMESPACE, Key};
pub use nbt::{Compound, List, Value};
pub use packets::{
    AcknowledgeConfiguration, AcknowledgeFinishConfiguration, BossBarAction, BossBarColor,
    BossBarOverlay, BossBarPacket, CodeOfConduct, DecodeContext, DialogContent,
    FinishConfiguration, Handshake, LoginAcknowledged, LoginDisconnect, LoginPluginMessage,
    LoginPluginResponse, LoginStart, LoginStartSigData, Packet, PacketBody, PacketContext,
    PacketKind, ShowDialog, SoundEntity, SoundEvent, SoundSource, StartConfiguration, StatusPing,
    StatusPong, StatusRequest, StatusResponse, StopSound,
};
pub use registry::{CodecTable, Decoded, PacketRegistry, UnknownPacketPolicy};
pub use state::{Direction, HandshakeNextState, ProtocolPhase};
pub use types::{MAX_PACKET_SIZE, PacketDecoder, PacketEncoder, PacketFrame, Uuid, encode_raw_packet};
pub use version::ProtocolVersion;
