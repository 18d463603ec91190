//! Minimal client-facing front: answers status pings and runs the login
//! plugin probe before turning players away.

use std::{
    net::SocketAddr,
    sync::{Arc, OnceLock},
    time::{Duration, Instant},
};

use bytes::Bytes;
use serde_json::json;
use tokio::{
    io::AsyncReadExt,
    net::{TcpListener, TcpStream, tcp::OwnedReadHalf},
    sync::{Semaphore, broadcast},
    time::timeout,
};

use crate::{
    config::SessionConfig,
    error::{ErrorResponder, SessionError},
    logging::SessionLogger,
    metrics::{CodecMetrics, HandshakeMetrics},
    proto::{
        Component, Handshake, HandshakeNextState, LoginDisconnect, LoginPluginResponse,
        LoginStart, Packet, PacketDecoder, ProtocolPhase, ProtocolVersion, StatusPing,
        StatusPong, StatusRequest, StatusResponse,
    },
    ratelimit::{ConnectionLimiter, RatelimitResult},
    session::{
        ConnectionState, Dispatch, FramedTransport, IdentifiedKey, LoginPluginExchange,
        PacketHandler, PhaseError, SessionCleanup, ShutdownCoordinator, Transport, process_frame,
    },
    telemetry::get_meter,
};

const READ_CHUNK: usize = 4096;
const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

pub struct SessionServer {
    config: SessionConfig,
    shutdown: Arc<ShutdownCoordinator>,
    limiter: ConnectionLimiter,
    handshake_metrics: HandshakeMetrics,
    codec_metrics: CodecMetrics,
}

impl SessionServer {
    pub fn new(config: SessionConfig) -> Arc<Self> {
        let meter = get_meter();
        Arc::new(Self {
            shutdown: ShutdownCoordinator::new(config.shutdown_grace()),
            limiter: ConnectionLimiter::new(config.conn_per_sec, config.cooldown()),
            handshake_metrics: HandshakeMetrics::new(&meter),
            codec_metrics: CodecMetrics::new(&meter),
            config,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn shutdown_coordinator(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    pub async fn start(self: Arc<Self>) -> anyhow::Result<()> {
        SessionLogger::preparing_socket(&self.config.bind);
        let address: SocketAddr = self.config.bind.parse()?;
        let listener = TcpListener::bind(address).await?;
        self.serve(listener).await
    }

    /// Accepts clients until the shutdown notice arrives.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> anyhow::Result<()> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_conn as usize));
        let mut stop = self.shutdown.subscribe();
        let mut sweep = tokio::time::interval(Duration::from_secs(60));

        loop {
            let (client, addr) = tokio::select! {
                accepted = listener.accept() => accepted?,
                _ = stop.recv() => return Ok(()),
                _ = sweep.tick() => {
                    self.limiter.retain_recent();
                    continue;
                }
            };

            let ip = addr.ip();
            if let RatelimitResult::Disallowed { .. } = self.limiter.check(&ip) {
                SessionLogger::rate_limited(&ip);
                drop(client);
                continue;
            }

            let Ok(permit) = semaphore.clone().try_acquire_owned() else {
                drop(client);
                continue;
            };

            if dotenvy::var("NO_NODELAY").is_err() {
                if let Err(e) = client.set_nodelay(true) {
                    SessionLogger::tcp_nodelay_failed(&e);
                }
            }

            let server = self.clone();
            tokio::spawn(async move {
                if let Err(e) = server.handle_connection(client, addr).await {
                    SessionLogger::connection_closed(&addr, &e);
                }
                drop(permit);
            });
        }
    }

    pub async fn handle_connection(
        self: Arc<Self>,
        stream: TcpStream,
        addr: SocketAddr,
    ) -> Result<(), SessionError> {
        SessionLogger::new_connection(&addr);
        self.handshake_metrics.record_open();

        let (read, write) = stream.into_split();
        let state = Arc::new(ConnectionState::new(addr));
        let (transport, _writer) = FramedTransport::spawn(state.clone(), write);
        let transport = Arc::new(transport);
        let cleanup = Arc::new(FrontendCleanup {
            transport: transport.clone(),
            exchange: OnceLock::new(),
        });
        let Some((_guard, stop)) = self.shutdown.join(cleanup.clone()) else {
            transport.close();
            return Err(SessionError::Closed);
        };

        let mut handler = FrontendHandler {
            server: self.clone(),
            state: state.clone(),
            transport: transport.clone(),
            cleanup: cleanup.clone(),
            started: Instant::now(),
        };
        let result = self.drive(&mut handler, read, stop).await;

        if let Err(err) = &result {
            if err.is_protocol_violation() {
                self.codec_metrics.record_failure(state.phase().as_str());
                SessionLogger::parser_failure(&addr, state.phase().as_str(), err);
            } else {
                SessionLogger::connection_error(&addr, err);
            }
            ErrorResponder::new().disconnect_with_error(&*transport, &state, err, "session");
        }
        cleanup.cleanup();
        result
    }

    async fn drive(
        &self,
        handler: &mut FrontendHandler,
        mut read: OwnedReadHalf,
        mut stop: broadcast::Receiver<()>,
    ) -> Result<(), SessionError> {
        let state = handler.state.clone();
        let mut decoder = PacketDecoder::with_capacity(READ_CHUNK);
        let mut chunk = vec![0u8; READ_CHUNK];

        loop {
            while let Some(frame) = decoder.try_next_packet()? {
                let phase = state.phase().as_str();
                match process_frame(&state, frame, handler)? {
                    Dispatch::Handled => self.codec_metrics.record_decoded(phase),
                    Dispatch::Passthrough(_) => self.codec_metrics.record_passthrough(phase),
                }
                if state.is_closed() {
                    return Ok(());
                }
            }

            let n = tokio::select! {
                read = timeout(IDLE_TIMEOUT, read.read(&mut chunk)) => read??,
                _ = stop.recv() => {
                    ErrorResponder::new().disconnect_with_log(
                        &*handler.transport,
                        &state,
                        "Proxy is shutting down",
                        "shutdown",
                    );
                    return Ok(());
                }
            };
            if n == 0 {
                return Ok(());
            }
            decoder.queue_slice(&chunk[..n]);
        }
    }

    fn status_json(&self, client: ProtocolVersion) -> String {
        let protocol = if client.is_supported() {
            client
        } else {
            ProtocolVersion::MAXIMUM
        };
        json!({
            "version": {
                "name": format!(
                    "Lure {}-{}",
                    ProtocolVersion::MINIMUM.name(),
                    ProtocolVersion::MAXIMUM.name()
                ),
                "protocol": protocol.0,
            },
            "players": {
                "max": self.config.max_players,
                "online": self.shutdown.active_sessions(),
            },
            "description": {
                "text": self.config.motd,
            },
        })
        .to_string()
    }
}

/// Everything one front-end connection must release.
struct FrontendCleanup {
    transport: Arc<FramedTransport>,
    exchange: OnceLock<Arc<LoginPluginExchange>>,
}

impl SessionCleanup for FrontendCleanup {
    fn cleanup(&self) {
        if let Some(exchange) = self.exchange.get() {
            exchange.cleanup();
        }
        self.transport.close();
    }
}

struct FrontendHandler {
    server: Arc<SessionServer>,
    state: Arc<ConnectionState>,
    transport: Arc<FramedTransport>,
    cleanup: Arc<FrontendCleanup>,
    started: Instant,
}

impl FrontendHandler {
    fn turn_away(&self) {
        let transport = self.transport.clone();
        transport.write(Packet::LoginDisconnect(LoginDisconnect {
            reason: Component::text(self.server.config.no_backend_reason.clone()),
        }));
        transport.close();
    }
}

impl PacketHandler for FrontendHandler {
    fn handle_handshake(&mut self, packet: Handshake) -> Result<bool, SessionError> {
        let requested = packet.protocol_version();
        let negotiated = self.state.negotiate(requested)?;
        let intent = match packet.next_state {
            HandshakeNextState::Status => "status",
            HandshakeNextState::Login => "login",
            HandshakeNextState::Transfer => "transfer",
        };
        self.server.handshake_metrics.record_attempt(intent);
        self.state.transition(packet.next_state.phase())?;

        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        self.server
            .handshake_metrics
            .record_duration(elapsed_ms, intent);
        SessionLogger::handshake_completed(elapsed_ms, intent, &negotiated);

        if self.state.phase() == ProtocolPhase::Login && !requested.is_supported() {
            self.server.handshake_metrics.record_failure(intent);
            return Err(SessionError::UnsupportedVersion(requested));
        }
        Ok(true)
    }

    fn handle_status_request(&mut self, _packet: StatusRequest) -> Result<bool, SessionError> {
        let client = self.state.version().unwrap_or(ProtocolVersion::MAXIMUM);
        self.transport.write(Packet::StatusResponse(StatusResponse {
            json: self.server.status_json(client),
        }));
        Ok(true)
    }

    fn handle_status_ping(&mut self, packet: StatusPing) -> Result<bool, SessionError> {
        self.transport.write(Packet::StatusPong(StatusPong {
            payload: packet.payload,
        }));
        self.transport.close();
        Ok(true)
    }

    fn handle_login_start(&mut self, packet: LoginStart) -> Result<bool, SessionError> {
        let version = self
            .state
            .version()
            .ok_or(PhaseError::VersionNotNegotiated)?;
        SessionLogger::login_started(&self.state.remote_address(), &packet.username, &version);

        if let Some(sig) = packet.sig_data {
            self.state.set_player_key(IdentifiedKey {
                public_key: sig.public_key,
                signature: sig.signature,
                expires_at: sig.timestamp,
            })?;
        }

        if version < ProtocolVersion::MINECRAFT_1_13 {
            self.turn_away();
            return Ok(true);
        }

        let exchange = Arc::new(LoginPluginExchange::new(self.transport.clone(), version));
        if self.cleanup.exchange.set(exchange.clone()).is_err() {
            return Err(SessionError::Closed);
        }

        let addr = self.state.remote_address();
        for channel in &self.server.config.login_probe_channels {
            let name = channel.clone();
            exchange.send(channel, Bytes::new(), move |response| {
                SessionLogger::plugin_probe_answered(&addr, &name, response.is_some());
            })?;
        }

        let transport = self.transport.clone();
        let reason = self.server.config.no_backend_reason.clone();
        exchange.signal_phase_complete(move || {
            transport.write(Packet::LoginDisconnect(LoginDisconnect {
                reason: Component::text(reason),
            }));
            transport.close();
        });
        Ok(true)
    }

    fn handle_login_plugin_response(
        &mut self,
        packet: LoginPluginResponse,
    ) -> Result<bool, SessionError> {
        match self.cleanup.exchange.get() {
            Some(exchange) => exchange.handle_response(packet),
            None => SessionLogger::unmatched_plugin_response(&self.state.remote_address(), packet.id),
        }
        Ok(true)
    }
}
