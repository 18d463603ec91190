use crate::{
    error::SessionError,
    proto::{
        AcknowledgeConfiguration, AcknowledgeFinishConfiguration, BossBarPacket, CodeOfConduct,
        Decoded, FinishConfiguration, Handshake, LoginAcknowledged, LoginDisconnect,
        LoginPluginMessage, LoginPluginResponse, LoginStart, Packet, PacketFrame, ShowDialog,
        SoundEntity, StartConfiguration, StatusPing, StatusPong, StatusRequest, StatusResponse,
        StopSound,
    },
};

use super::state::ConnectionState;

/// Phase handler. Each method returns whether the packet was consumed;
/// unconsumed packets are forwarded as they arrived.
#[allow(unused_variables)]
pub trait PacketHandler {
    fn handle_handshake(&mut self, packet: Handshake) -> Result<bool, SessionError> {
        Ok(false)
    }

    fn handle_status_request(&mut self, packet: StatusRequest) -> Result<bool, SessionError> {
        Ok(false)
    }

    fn handle_status_response(&mut self, packet: StatusResponse) -> Result<bool, SessionError> {
        Ok(false)
    }

    fn handle_status_ping(&mut self, packet: StatusPing) -> Result<bool, SessionError> {
        Ok(false)
    }

    fn handle_status_pong(&mut self, packet: StatusPong) -> Result<bool, SessionError> {
        Ok(false)
    }

    fn handle_login_start(&mut self, packet: LoginStart) -> Result<bool, SessionError> {
        Ok(false)
    }

    fn handle_login_disconnect(&mut self, packet: LoginDisconnect) -> Result<bool, SessionError> {
        Ok(false)
    }

    fn handle_login_plugin_message(
        &mut self,
        packet: LoginPluginMessage,
    ) -> Result<bool, SessionError> {
        Ok(false)
    }

    fn handle_login_plugin_response(
        &mut self,
        packet: LoginPluginResponse,
    ) -> Result<bool, SessionError> {
        Ok(false)
    }

    fn handle_login_acknowledged(
        &mut self,
        packet: LoginAcknowledged,
    ) -> Result<bool, SessionError> {
        Ok(false)
    }

    fn handle_finish_configuration(
        &mut self,
        packet: FinishConfiguration,
    ) -> Result<bool, SessionError> {
        Ok(false)
    }

    fn handle_acknowledge_finish_configuration(
        &mut self,
        packet: AcknowledgeFinishConfiguration,
    ) -> Result<bool, SessionError> {
        Ok(false)
    }

    fn handle_start_configuration(
        &mut self,
        packet: StartConfiguration,
    ) -> Result<bool, SessionError> {
        Ok(false)
    }

    fn handle_acknowledge_configuration(
        &mut self,
        packet: AcknowledgeConfiguration,
    ) -> Result<bool, SessionError> {
        Ok(false)
    }

    fn handle_boss_bar(&mut self, packet: BossBarPacket) -> Result<bool, SessionError> {
        Ok(false)
    }

    fn handle_stop_sound(&mut self, packet: StopSound) -> Result<bool, SessionError> {
        Ok(false)
    }

    fn handle_sound_entity(&mut self, packet: SoundEntity) -> Result<bool, SessionError> {
        Ok(false)
    }

    fn handle_show_dialog(&mut self, packet: ShowDialog) -> Result<bool, SessionError> {
        Ok(false)
    }

    fn handle_code_of_conduct(&mut self, packet: CodeOfConduct) -> Result<bool, SessionError> {
        Ok(false)
    }

    /// Frame whose id the current table does not know.
    fn handle_unknown(&mut self, frame: &PacketFrame) -> Result<(), SessionError> {
        Ok(())
    }
}

/// Routes a typed packet to its handler method.
pub fn dispatch<H>(handler: &mut H, packet: Packet) -> Result<bool, SessionError>
where
    H: PacketHandler + ?Sized,
{
    match packet {
        Packet::Handshake(p) => handler.handle_handshake(p),
        Packet::StatusRequest(p) => handler.handle_status_request(p),
        Packet::StatusResponse(p) => handler.handle_status_response(p),
        Packet::StatusPing(p) => handler.handle_status_ping(p),
        Packet::StatusPong(p) => handler.handle_status_pong(p),
        Packet::LoginStart(p) => handler.handle_login_start(p),
        Packet::LoginDisconnect(p) => handler.handle_login_disconnect(p),
        Packet::LoginPluginMessage(p) => handler.handle_login_plugin_message(p),
        Packet::LoginPluginResponse(p) => handler.handle_login_plugin_response(p),
        Packet::LoginAcknowledged(p) => handler.handle_login_acknowledged(p),
        Packet::FinishConfiguration(p) => handler.handle_finish_configuration(p),
        Packet::AcknowledgeFinishConfiguration(p) => {
            handler.handle_acknowledge_finish_configuration(p)
        }
        Packet::StartConfiguration(p) => handler.handle_start_configuration(p),
        Packet::AcknowledgeConfiguration(p) => handler.handle_acknowledge_configuration(p),
        Packet::BossBar(p) => handler.handle_boss_bar(p),
        Packet::StopSound(p) => handler.handle_stop_sound(p),
        Packet::SoundEntity(p) => handler.handle_sound_entity(p),
        Packet::ShowDialog(p) => handler.handle_show_dialog(p),
        Packet::CodeOfConduct(p) => handler.handle_code_of_conduct(p),
    }
}

/// What happened to an inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Handled,
    /// Not consumed by the handler; forward the original frame.
    Passthrough(PacketFrame),
}

/// Decodes `frame` with the connection's current table and dispatches it.
///
/// Decode failures and frames that are illegal in the current phase are
/// returned as errors; the caller is expected to close the connection.
pub fn process_frame<H>(
    state: &ConnectionState,
    frame: PacketFrame,
    handler: &mut H,
) -> Result<Dispatch, SessionError>
where
    H: PacketHandler + ?Sized,
{
    match state.decode_inbound(&frame)? {
        Decoded::Packet(packet) => {
            if dispatch(handler, packet)? {
                Ok(Dispatch::Handled)
            } else {
                Ok(Dispatch::Passthrough(frame))
            }
        }
        Decoded::Unhandled(frame) => {
            handler.handle_unknown(&frame)?;
            Ok(Dispatch::Passthrough(frame))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{HandshakeNextState, ProtoError, ProtocolPhase, ProtocolVersion};
    use crate::session::state::PhaseError;

    #[derive(Default)]
    struct Recorder {
        handshakes: Vec<Handshake>,
        unknown: usize,
    }

    impl PacketHandler for Recorder {
        fn handle_handshake(&mut self, packet: Handshake) -> Result<bool, SessionError> {
            self.handshakes.push(packet);
            Ok(true)
        }

        fn handle_unknown(&mut self, _frame: &PacketFrame) -> Result<(), SessionError> {
            self.unknown += 1;
            Ok(())
        }
    }

    fn handshake_frame() -> PacketFrame {
        let state = ConnectionState::new("127.0.0.1:1".parse().unwrap());
        state
            .encode(
                crate::proto::Direction::Serverbound,
                &Packet::Handshake(Handshake {
                    protocol_version: 767,
                    server_address: "play.example.net".to_string(),
                    server_port: 25565,
                    next_state: HandshakeNextState::Login,
                }),
            )
            .unwrap()
    }

    #[test]
    fn handled_packets_are_consumed() {
        let state = ConnectionState::new("127.0.0.1:1".parse().unwrap());
        let mut recorder = Recorder::default();
        let outcome = process_frame(&state, handshake_frame(), &mut recorder).unwrap();
        assert_eq!(outcome, Dispatch::Handled);
        assert_eq!(recorder.handshakes.len(), 1);
    }

    #[test]
    fn unknown_login_frame_is_fatal() {
        let state = ConnectionState::new("127.0.0.1:1".parse().unwrap());
        state.negotiate(ProtocolVersion::MINECRAFT_1_21).unwrap();
        state.transition(ProtocolPhase::Login).unwrap();
        let frame = PacketFrame::new(0x7E, Vec::new());
        let err = process_frame(&state, frame, &mut Recorder::default()).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Phase(PhaseError::Codec(ProtoError::InvalidPacketId { .. }))
        ));
    }

    #[test]
    fn unknown_play_frames_pass_through() {
        let state = ConnectionState::new("127.0.0.1:1".parse().unwrap());
        state.negotiate(ProtocolVersion::MINECRAFT_1_21).unwrap();
        state.transition(ProtocolPhase::Login).unwrap();
        state.transition(ProtocolPhase::Configuration).unwrap();
        state.transition(ProtocolPhase::Play).unwrap();

        let mut recorder = Recorder::default();
        let frame = PacketFrame::new(0x30, vec![1, 2, 3]);
        let outcome = process_frame(&state, frame.clone(), &mut recorder).unwrap();
        assert_eq!(outcome, Dispatch::Passthrough(frame));
        assert_eq!(recorder.unknown, 1);
    }
}
