//! Client-side half of a backend switch.
//!
//! From 1.20.2 the client is sent back to configuration between backends.
//! Boss bar updates are held while it is there and replayed once it is back
//! in play.

use std::sync::Arc;

use super::{
    bossbar::BossBarManager, handler::PacketHandler, state::ConnectionState, transport::Transport,
};
use crate::{
    error::SessionError,
    logging::SessionLogger,
    proto::{
        AcknowledgeConfiguration, AcknowledgeFinishConfiguration, LoginAcknowledged, Packet,
        ProtocolPhase, StartConfiguration,
    },
};

/// Owns the play/configuration phase edges of one client connection.
///
/// Acts as the [`PacketHandler`] for the acknowledgements the client sends;
/// other handlers can delegate to the `on_*` methods instead.
pub struct BackendSwitch {
    state: Arc<ConnectionState>,
    transport: Arc<dyn Transport>,
    bossbars: Arc<BossBarManager>,
}

impl BackendSwitch {
    pub fn new(
        state: Arc<ConnectionState>,
        transport: Arc<dyn Transport>,
        bossbars: Arc<BossBarManager>,
    ) -> Self {
        Self {
            state,
            transport,
            bossbars,
        }
    }

    pub fn bossbars(&self) -> &Arc<BossBarManager> {
        &self.bossbars
    }

    /// Asks a client in play to re-enter configuration. Boss bar traffic is
    /// held from here until the client is back in play.
    pub fn start(&self) -> Result<(), SessionError> {
        self.state.ensure_phase(ProtocolPhase::Play)?;
        self.bossbars.begin_suppression();
        SessionLogger::backend_switch_started(&self.state.remote_address());
        self.transport.write(Packet::StartConfiguration(StartConfiguration));
        Ok(())
    }

    /// Client finished login and entered configuration for the first time.
    pub fn on_login_acknowledged(&self) -> Result<(), SessionError> {
        self.state.transition(ProtocolPhase::Configuration)?;
        Ok(())
    }

    /// Client left play after a [`BackendSwitch::start`].
    pub fn on_acknowledge_configuration(&self) -> Result<(), SessionError> {
        self.state.transition(ProtocolPhase::Configuration)?;
        self.bossbars.begin_suppression();
        Ok(())
    }

    /// Client is back in play; held boss bars are re-created.
    pub fn on_acknowledge_finish_configuration(&self) -> Result<(), SessionError> {
        self.state.transition(ProtocolPhase::Play)?;
        if self.bossbars.is_suppressed() {
            self.bossbars.end_suppression_and_replay();
            SessionLogger::backend_switch_finished(&self.state.remote_address());
        }
        Ok(())
    }
}

impl PacketHandler for BackendSwitch {
    fn handle_login_acknowledged(
        &mut self,
        _packet: LoginAcknowledged,
    ) -> Result<bool, SessionError> {
        self.on_login_acknowledged()?;
        Ok(true)
    }

    fn handle_acknowledge_configuration(
        &mut self,
        _packet: AcknowledgeConfiguration,
    ) -> Result<bool, SessionError> {
        self.on_acknowledge_configuration()?;
        Ok(true)
    }

    fn handle_acknowledge_finish_configuration(
        &mut self,
        _packet: AcknowledgeFinishConfiguration,
    ) -> Result<bool, SessionError> {
        self.on_acknowledge_finish_configuration()?;
        Ok(true)
    }
}
