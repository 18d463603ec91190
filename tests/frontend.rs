//! End-to-end sessions against a live listener.
use std::{net::SocketAddr, sync::Arc, time::Duration};

use bytes::Bytes;
use lure_session::{
    SessionConfig, SessionServer,
    proto::{
        Decoded, Direction, Handshake, HandshakeNextState, LoginPluginResponse, LoginStart, Packet,
        PacketDecoder, PacketRegistry, ProtocolPhase, ProtocolVersion, StatusPing, StatusRequest,
        Uuid, encode_raw_packet,
    },
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    time::timeout,
};

const WAIT: Duration = Duration::from_secs(5);

async fn start(config: SessionConfig) -> (Arc<SessionServer>, SocketAddr) {
    let server = SessionServer::new(config);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.clone().serve(listener));
    (server, addr)
}

struct Client {
    stream: TcpStream,
    decoder: PacketDecoder,
    version: ProtocolVersion,
}

impl Client {
    async fn connect(addr: SocketAddr, version: ProtocolVersion) -> Self {
        Self {
            stream: TcpStream::connect(addr).await.unwrap(),
            decoder: PacketDecoder::with_capacity(1024),
            version,
        }
    }

    async fn send(&mut self, phase: ProtocolPhase, packet: Packet) {
        let table = PacketRegistry::shared()
            .resolve(phase, Direction::Serverbound, self.version)
            .unwrap();
        let frame = table.encode(&packet).unwrap();
        let mut out = Vec::new();
        encode_raw_packet(&mut out, frame.id, &frame.body).unwrap();
        self.stream.write_all(&out).await.unwrap();
    }

    async fn handshake(&mut self, next_state: HandshakeNextState) {
        let packet = Packet::Handshake(Handshake {
            protocol_version: self.version.0,
            server_address: "localhost".to_string(),
            server_port: 25565,
            next_state,
        });
        self.send(ProtocolPhase::Handshake, packet).await;
    }

    async fn recv(&mut self, phase: ProtocolPhase) -> Packet {
        let table = PacketRegistry::shared()
            .resolve(phase, Direction::Clientbound, self.version)
            .unwrap();
        let mut chunk = [0u8; 1024];
        loop {
            if let Some(frame) = self.decoder.try_next_packet().unwrap() {
                match table.decode(&frame).unwrap() {
                    Decoded::Packet(packet) => return packet,
                    Decoded::Unhandled(frame) => panic!("unexpected frame {frame:?}"),
                }
            }
            let n = timeout(WAIT, self.stream.read(&mut chunk))
                .await
                .expect("server stalled")
                .unwrap();
            assert!(n > 0, "server closed before answering");
            self.decoder.queue_slice(&chunk[..n]);
        }
    }

    async fn expect_eof(&mut self) {
        let mut chunk = [0u8; 64];
        let n = timeout(WAIT, self.stream.read(&mut chunk))
            .await
            .expect("server kept the connection open")
            .unwrap_or(0);
        assert_eq!(n, 0);
    }
}

fn login_start() -> Packet {
    Packet::LoginStart(LoginStart {
        username: "Steve".to_string(),
        profile_id: Some(Uuid::new_v4()),
        sig_data: None,
    })
}

#[tokio::test]
async fn status_ping_round_trip() {
    let config = SessionConfig {
        motd: "hello there".to_string(),
        ..SessionConfig::default()
    };
    let (_server, addr) = start(config).await;
    let mut client = Client::connect(addr, ProtocolVersion::MINECRAFT_1_21).await;

    client.handshake(HandshakeNextState::Status).await;
    client
        .send(ProtocolPhase::Status, Packet::StatusRequest(StatusRequest))
        .await;
    let Packet::StatusResponse(response) = client.recv(ProtocolPhase::Status).await else {
        panic!("expected a status response");
    };
    let json: serde_json::Value = serde_json::from_str(&response.json).unwrap();
    assert_eq!(json["version"]["protocol"], 767);
    assert_eq!(json["description"]["text"], "hello there");
    assert_eq!(json["players"]["max"], 100);

    client
        .send(ProtocolPhase::Status, Packet::StatusPing(StatusPing { payload: 42 }))
        .await;
    assert_eq!(
        client.recv(ProtocolPhase::Status).await,
        Packet::StatusPong(lure_session::proto::StatusPong { payload: 42 })
    );
    client.expect_eof().await;
}

#[tokio::test]
async fn login_probe_then_disconnect() {
    let config = SessionConfig {
        no_backend_reason: "nothing here".to_string(),
        ..SessionConfig::default()
    };
    let (_server, addr) = start(config).await;
    let mut client = Client::connect(addr, ProtocolVersion::MINECRAFT_1_21).await;

    client.handshake(HandshakeNextState::Login).await;
    client.send(ProtocolPhase::Login, login_start()).await;

    let Packet::LoginPluginMessage(probe) = client.recv(ProtocolPhase::Login).await else {
        panic!("expected a plugin probe");
    };
    assert_eq!(probe.id, 1);
    assert_eq!(probe.channel, "lure:probe");

    client
        .send(
            ProtocolPhase::Login,
            Packet::LoginPluginResponse(LoginPluginResponse {
                id: probe.id,
                success: false,
                data: Bytes::new(),
            }),
        )
        .await;

    let Packet::LoginDisconnect(disconnect) = client.recv(ProtocolPhase::Login).await else {
        panic!("expected a disconnect");
    };
    assert_eq!(disconnect.reason.plain(), Some("nothing here"));
    client.expect_eof().await;
}

#[tokio::test]
async fn legacy_login_is_turned_away_without_probes() {
    let (_server, addr) = start(SessionConfig::default()).await;
    let mut client = Client::connect(addr, ProtocolVersion::MINECRAFT_1_12_2).await;

    client.handshake(HandshakeNextState::Login).await;
    client
        .send(
            ProtocolPhase::Login,
            Packet::LoginStart(LoginStart {
                username: "Alex".to_string(),
                profile_id: None,
                sig_data: None,
            }),
        )
        .await;

    assert!(matches!(
        client.recv(ProtocolPhase::Login).await,
        Packet::LoginDisconnect(_)
    ));
    client.expect_eof().await;
}

#[tokio::test]
async fn unsupported_version_gets_a_reason() {
    let (_server, addr) = start(SessionConfig::default()).await;
    let mut client = Client::connect(addr, ProtocolVersion(47)).await;

    // the server answers with the nearest codec it has
    let packet = Packet::Handshake(Handshake {
        protocol_version: 47,
        server_address: "localhost".to_string(),
        server_port: 25565,
        next_state: HandshakeNextState::Login,
    });
    client.version = ProtocolVersion::MINIMUM;
    client.send(ProtocolPhase::Handshake, packet).await;

    let Packet::LoginDisconnect(disconnect) = client.recv(ProtocolPhase::Login).await else {
        panic!("expected a disconnect");
    };
    let reason = disconnect.reason.plain().unwrap_or_default().to_string();
    assert!(reason.contains("Unsupported client version"), "{reason}");
    client.expect_eof().await;
}

#[tokio::test]
async fn shutdown_disconnects_waiting_logins() {
    let config = SessionConfig {
        shutdown_grace_secs: 5,
        ..SessionConfig::default()
    };
    let (server, addr) = start(config).await;
    let mut client = Client::connect(addr, ProtocolVersion::MINECRAFT_1_21).await;

    client.handshake(HandshakeNextState::Login).await;
    client.send(ProtocolPhase::Login, login_start()).await;
    assert!(matches!(
        client.recv(ProtocolPhase::Login).await,
        Packet::LoginPluginMessage(_)
    ));
    assert_eq!(server.shutdown_coordinator().active_sessions(), 1);

    let report = server.shutdown_coordinator().shutdown().await;
    assert_eq!(report.initial, 1);
    assert_eq!(report.forced, 0);

    let Packet::LoginDisconnect(disconnect) = client.recv(ProtocolPhase::Login).await else {
        panic!("expected a disconnect");
    };
    assert_eq!(disconnect.reason.plain(), Some("Proxy is shutting down"));
    client.expect_eof().await;
}
