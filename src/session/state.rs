use std::{
    net::SocketAddr,
    sync::{
        OnceLock,
        atomic::{AtomicBool, AtomicU8, Ordering},
    },
};

use bytes::Bytes;

use crate::proto::{
    CodecTable, Decoded, Direction, Packet, PacketFrame, PacketRegistry, ProtoError,
    ProtocolPhase, ProtocolVersion,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhaseError {
    #[error("illegal phase transition {from:?} -> {to:?}")]
    IllegalTransition {
        from: ProtocolPhase,
        to: ProtocolPhase,
    },
    #[error("{0} has no configuration phase")]
    NoConfigurationPhase(ProtocolVersion),
    #[error("protocol version already negotiated ({0})")]
    VersionAlreadySet(ProtocolVersion),
    #[error("protocol version not negotiated yet")]
    VersionNotNegotiated,
    #[error("player key already associated")]
    PlayerKeyAlreadySet,
    #[error("expected {expected:?} phase, connection is in {actual:?}")]
    WrongPhase {
        expected: ProtocolPhase,
        actual: ProtocolPhase,
    },
    #[error("connection closed")]
    Closed,
    #[error(transparent)]
    Codec(#[from] ProtoError),
}

/// Signed profile key presented by the client during login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifiedKey {
    pub public_key: Bytes,
    pub signature: Bytes,
    /// Expiry as unix millis.
    pub expires_at: i64,
}

/// Per-connection protocol state.
///
/// The phase only moves forward, except for the play/configuration round trip
/// performed on every backend switch. The version is fixed by the handshake.
#[derive(Debug)]
pub struct ConnectionState {
    remote: SocketAddr,
    phase: AtomicU8,
    closed: AtomicBool,
    version: OnceLock<ProtocolVersion>,
    player_key: OnceLock<IdentifiedKey>,
    registry: &'static PacketRegistry,
}

impl ConnectionState {
    pub fn new(remote: SocketAddr) -> Self {
        Self::with_registry(remote, PacketRegistry::shared())
    }

    pub fn with_registry(remote: SocketAddr, registry: &'static PacketRegistry) -> Self {
        Self {
            remote,
            phase: AtomicU8::new(ProtocolPhase::Handshake as u8),
            closed: AtomicBool::new(false),
            version: OnceLock::new(),
            player_key: OnceLock::new(),
            registry,
        }
    }

    pub fn remote_address(&self) -> SocketAddr {
        self.remote
    }

    pub fn phase(&self) -> ProtocolPhase {
        ProtocolPhase::from_u8(self.phase.load(Ordering::Acquire)).unwrap_or(ProtocolPhase::Handshake)
    }

    pub fn version(&self) -> Option<ProtocolVersion> {
        self.version.get().copied()
    }

    /// Fixes the codec version from the handshake. Unsupported client versions
    /// are mapped to the closest older supported one.
    pub fn negotiate(&self, requested: ProtocolVersion) -> Result<ProtocolVersion, PhaseError> {
        let effective = requested.nearest_supported();
        self.version
            .set(effective)
            .map_err(|_| PhaseError::VersionAlreadySet(self.version().unwrap_or(effective)))?;
        Ok(effective)
    }

    /// Version used for codec lookups. The handshake is read before
    /// negotiation, with the oldest supported layout.
    pub fn codec_version(&self) -> Result<ProtocolVersion, PhaseError> {
        match (self.version(), self.phase()) {
            (Some(version), _) => Ok(version),
            (None, ProtocolPhase::Handshake) => Ok(ProtocolVersion::MINIMUM),
            (None, _) => Err(PhaseError::VersionNotNegotiated),
        }
    }

    fn check_edge(&self, from: ProtocolPhase, to: ProtocolPhase) -> Result<(), PhaseError> {
        use ProtocolPhase::*;

        let illegal = PhaseError::IllegalTransition { from, to };
        let has_config = |version: ProtocolVersion| version >= ProtocolVersion::MINECRAFT_1_20_2;
        match (from, to) {
            (Handshake, Status | Login) => {
                self.version().ok_or(PhaseError::VersionNotNegotiated)?;
                Ok(())
            }
            (Login, Configuration) | (Play, Configuration) => {
                let version = self.version().ok_or(PhaseError::VersionNotNegotiated)?;
                if has_config(version) {
                    Ok(())
                } else {
                    Err(PhaseError::NoConfigurationPhase(version))
                }
            }
            (Login, Play) => {
                let version = self.version().ok_or(PhaseError::VersionNotNegotiated)?;
                if has_config(version) {
                    Err(illegal)
                } else {
                    Ok(())
                }
            }
            (Configuration, Play) => Ok(()),
            _ => Err(illegal),
        }
    }

    pub fn transition(&self, to: ProtocolPhase) -> Result<(), PhaseError> {
        loop {
            if self.is_closed() {
                return Err(PhaseError::Closed);
            }
            let current = self.phase.load(Ordering::Acquire);
            let from = ProtocolPhase::from_u8(current).unwrap_or(ProtocolPhase::Handshake);
            self.check_edge(from, to)?;
            if self
                .phase
                .compare_exchange(current, to as u8, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Ok(());
            }
        }
    }

    pub fn ensure_phase(&self, expected: ProtocolPhase) -> Result<(), PhaseError> {
        let actual = self.phase();
        if actual == expected {
            Ok(())
        } else {
            Err(PhaseError::WrongPhase { expected, actual })
        }
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Associates the player's signed key. Only the first call succeeds.
    pub fn set_player_key(&self, key: IdentifiedKey) -> Result<(), PhaseError> {
        self.player_key
            .set(key)
            .map_err(|_| PhaseError::PlayerKeyAlreadySet)
    }

    pub fn player_key(&self) -> Option<&IdentifiedKey> {
        self.player_key.get()
    }

    pub fn table(&self, direction: Direction) -> Result<&'static CodecTable, PhaseError> {
        let version = self.codec_version()?;
        Ok(self.registry.resolve(self.phase(), direction, version)?)
    }

    /// Decodes a frame with the table of the current phase and version.
    pub fn decode(&self, direction: Direction, frame: &PacketFrame) -> Result<Decoded, PhaseError> {
        Ok(self.table(direction)?.decode(frame)?)
    }

    pub fn encode(&self, direction: Direction, packet: &Packet) -> Result<PacketFrame, PhaseError> {
        Ok(self.table(direction)?.encode(packet)?)
    }

    pub fn decode_inbound(&self, frame: &PacketFrame) -> Result<Decoded, PhaseError> {
        self.decode(Direction::Serverbound, frame)
    }

    pub fn encode_outbound(&self, packet: &Packet) -> Result<PacketFrame, PhaseError> {
        self.encode(Direction::Clientbound, packet)
    }
}
