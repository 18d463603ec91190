/// Connection phase used to select packet IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ProtocolPhase {
    Handshake = 0,
    Status = 1,
    Login = 2,
    Configuration = 3,
    Play = 4,
}

impl ProtocolPhase {
    pub const ALL: [ProtocolPhase; 5] = [
        ProtocolPhase::Handshake,
        ProtocolPhase::Status,
        ProtocolPhase::Login,
        ProtocolPhase::Configuration,
        ProtocolPhase::Play,
    ];

    pub(crate) fn from_u8(raw: u8) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Handshake => "handshake",
            Self::Status => "status",
            Self::Login => "login",
            Self::Configuration => "configuration",
            Self::Play => "play",
        }
    }
}

/// Which way a packet travels relative to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Client to server.
    Serverbound,
    /// Server to client.
    Clientbound,
}

/// Next state value in the handshake packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeNextState {
    Status,
    Login,
    /// Login initiated by a server transfer (1.20.5+).
    Transfer,
}

impl HandshakeNextState {
    pub(crate) fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            1 => Some(Self::Status),
            2 => Some(Self::Login),
            3 => Some(Self::Transfer),
            _ => None,
        }
    }

    pub(crate) fn as_raw(&self) -> i32 {
        match self {
            Self::Status => 1,
            Self::Login => 2,
            Self::Transfer => 3,
        }
    }

    /// Phase the connection enters once the handshake is accepted.
    pub fn phase(&self) -> ProtocolPhase {
        match self {
            Self::Status => ProtocolPhase::Status,
            Self::Login | Self::Transfer => ProtocolPhase::Login,
        }
    }
}
