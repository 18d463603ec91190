use super::{
    state::{Direction, ProtocolPhase},
    version::ProtocolVersion,
};

/// Protocol decode/encode error.
///
/// Every variant is connection-fatal when it surfaces from an inbound decode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtoError {
    #[error("unexpected end of packet")]
    UnexpectedEof,
    #[error("varint is too large")]
    VarIntTooLarge,
    #[error("packet too large ({len} bytes)")]
    PacketTooLarge { len: usize },
    #[error("negative length {0}")]
    NegativeLength(i32),
    #[error("invalid boolean byte {0:#04x}")]
    InvalidBool(u8),
    #[error("invalid utf-8 string")]
    InvalidUtf8,
    #[error("string too long (max {max}, got {actual})")]
    StringTooLong { max: usize, actual: usize },
    #[error("length too large (max {max}, got {actual})")]
    LengthTooLarge { max: usize, actual: usize },
    #[error("{0} trailing bytes after packet body")]
    TrailingBytes(usize),
    #[error("missing field {0}")]
    MissingField(&'static str),
    #[error("unknown packet id {id:#04x} in {phase:?}/{direction:?}")]
    InvalidPacketId {
        phase: ProtocolPhase,
        direction: Direction,
        id: i32,
    },
    #[error("invalid handshake next state {0}")]
    InvalidHandshakeState(i32),
    #[error("invalid {kind} discriminator {value}")]
    InvalidEnum { kind: &'static str, value: i32 },
    #[error("invalid namespaced key '{0}'")]
    InvalidKey(String),
    #[error("invalid tag type {0}")]
    InvalidTag(u8),
    #[error("malformed tag tree: {0}")]
    InvalidNbt(String),
    #[error("invalid chat component: {0}")]
    InvalidComponent(String),
    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(ProtocolVersion),
    #[error("{kind} is not registered for {phase:?}/{direction:?} on {version}")]
    UnregisteredPacket {
        kind: &'static str,
        phase: ProtocolPhase,
        direction: Direction,
        version: ProtocolVersion,
    },
    #[error("{0} cannot be encoded in this phase")]
    WrongPhase(&'static str),
}

pub type Result<T> = std::result::Result<T, ProtoError>;

pub(crate) fn debug_log_error(context: &str, error: &ProtoError) {
    #[cfg(debug_assertions)]
    {
        log::error!("{}: {:?}", context, error);
    }
    let _ = context;
    let _ = error;
}
