use valence_text::{Color, IntoText};

use crate::{
    logging::SessionLogger,
    proto::{Component, LoginDisconnect, Packet, ProtoError, ProtocolPhase, ProtocolVersion},
    session::{ConnectionState, ExchangeError, PhaseError, Transport},
};

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("Request timeout (se::rt)")]
    Timeout(#[from] tokio::time::error::Elapsed),
    #[error("Networking error - {0:?} (se::ne)")]
    Io(#[from] tokio::io::Error),
    #[error("Malformed packet - {0} (se::mp)")]
    Protocol(#[from] ProtoError),
    #[error("Protocol state violation - {0} (se::ps)")]
    Phase(#[from] PhaseError),
    #[error("Plugin message failure - {0} (se::pm)")]
    Exchange(#[from] ExchangeError),
    #[error("Unsupported client version {0} (se::uv)")]
    UnsupportedVersion(ProtocolVersion),
    #[error("Connection closed (se::cc)")]
    Closed,
    #[error("Unknown error (se::??)")]
    Anyhow(#[from] anyhow::Error),
}

impl SessionError {
    /// Whether the peer broke the protocol, as opposed to a local or network failure.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            Self::Protocol(_) | Self::Phase(_) | Self::UnsupportedVersion(_)
        )
    }
}

#[derive(Clone, Copy, Default)]
pub struct ErrorResponder;

impl ErrorResponder {
    pub const fn new() -> Self {
        Self
    }

    /// Tells the client why it is being dropped when the phase allows it.
    /// Only login has a disconnect packet in the handled set.
    pub fn disconnect_with_log<S, L>(
        &self,
        transport: &dyn Transport,
        state: &ConnectionState,
        public_reason: S,
        log_reason: L,
    ) where
        S: Into<String>,
        L: Into<String>,
    {
        let log_reason = log_reason.into();
        SessionLogger::disconnect_warning(&state.remote_address(), &log_reason);
        if state.phase() == ProtocolPhase::Login {
            let public_reason: String = public_reason.into();
            transport.write(Packet::LoginDisconnect(LoginDisconnect {
                reason: Component(public_reason.into_text().color(Color::RED)),
            }));
        }
    }

    pub fn disconnect_with_error(
        &self,
        transport: &dyn Transport,
        state: &ConnectionState,
        err: &SessionError,
        context: impl Into<String>,
    ) {
        let context = context.into();
        let err_msg = err.to_string();
        let public_reason = format!("Gateway error:\n\n{}", err_msg);
        let log_reason = format!("{}: {}", context, err_msg);
        self.disconnect_with_log(transport, state, public_reason, log_reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemoryTransport, TransportEvent};

    #[test]
    fn login_disconnect_carries_reason() {
        let state = ConnectionState::new("127.0.0.1:9".parse().unwrap());
        state.negotiate(ProtocolVersion::MINECRAFT_1_21).unwrap();
        state.transition(ProtocolPhase::Login).unwrap();
        let transport = MemoryTransport::default();

        let err = SessionError::UnsupportedVersion(ProtocolVersion(5));
        ErrorResponder::new().disconnect_with_error(&transport, &state, &err, "login");

        match transport.events().as_slice() {
            [TransportEvent::Write(Packet::LoginDisconnect(packet))] => {
                let text = packet.reason.plain().unwrap_or_default();
                assert!(text.starts_with("Gateway error"));
                assert!(text.contains("se::uv"));
                assert_eq!(packet.reason.0.color, Some(Color::RED));
            }
            other => panic!("unexpected events {other:?}"),
        }
        assert!(err.is_protocol_violation());
    }

    #[test]
    fn status_phase_gets_no_packet() {
        let state = ConnectionState::new("127.0.0.1:9".parse().unwrap());
        state.negotiate(ProtocolVersion::MINECRAFT_1_21).unwrap();
        state.transition(ProtocolPhase::Status).unwrap();
        let transport = MemoryTransport::default();
        ErrorResponder::new().disconnect_with_log(&transport, &state, "bye", "test");
        assert!(transport.events().is_empty());
    }
}
