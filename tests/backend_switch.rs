//! Play -> configuration -> play round trip driven by client acknowledgements.
use std::sync::Arc;

use lure_session::{
    SessionError,
    proto::{
        AcknowledgeConfiguration, AcknowledgeFinishConfiguration, BossBarAction, BossBarColor,
        BossBarOverlay, Direction, LoginAcknowledged, Packet, ProtocolPhase, ProtocolVersion,
        StartConfiguration, Uuid,
    },
    session::{
        BackendSwitch, BossBar, BossBarManager, ConnectionState, Dispatch, MemoryTransport,
        PhaseError, process_frame,
    },
};

fn feed(state: &ConnectionState, switch: &mut BackendSwitch, packet: Packet) -> Dispatch {
    let frame = state
        .encode(Direction::Serverbound, &packet)
        .expect("registered in the current phase");
    process_frame(state, frame, switch).expect("frame is legal here")
}

fn setup() -> (Arc<ConnectionState>, Arc<MemoryTransport>, BackendSwitch) {
    let state = Arc::new(ConnectionState::new("127.0.0.1:25565".parse().unwrap()));
    state.negotiate(ProtocolVersion::MINECRAFT_1_21).unwrap();
    state.transition(ProtocolPhase::Login).unwrap();
    let transport = Arc::new(MemoryTransport::default());
    let bossbars = BossBarManager::new(Uuid::new_v4(), transport.clone());
    let switch = BackendSwitch::new(state.clone(), transport.clone(), bossbars);
    (state, transport, switch)
}

#[test]
fn switch_round_trip_replays_bars_once_back_in_play() {
    let (state, transport, mut switch) = setup();

    let outcome = feed(&state, &mut switch, Packet::LoginAcknowledged(LoginAcknowledged));
    assert_eq!(outcome, Dispatch::Handled);
    assert_eq!(state.phase(), ProtocolPhase::Configuration);
    feed(
        &state,
        &mut switch,
        Packet::AcknowledgeFinishConfiguration(AcknowledgeFinishConfiguration),
    );
    assert_eq!(state.phase(), ProtocolPhase::Play);
    assert!(transport.events().is_empty(), "nothing to replay on first entry");

    let bar = BossBar::new("Siege", 1.0, BossBarColor::Red, BossBarOverlay::Progress);
    bar.show(switch.bossbars());
    transport.take_events();

    switch.start().unwrap();
    assert_eq!(
        transport.packets(),
        vec![Packet::StartConfiguration(StartConfiguration)]
    );
    assert!(switch.bossbars().is_suppressed());
    transport.take_events();

    bar.set_health(0.3);
    feed(
        &state,
        &mut switch,
        Packet::AcknowledgeConfiguration(AcknowledgeConfiguration),
    );
    assert_eq!(state.phase(), ProtocolPhase::Configuration);
    assert!(transport.events().is_empty());

    feed(
        &state,
        &mut switch,
        Packet::AcknowledgeFinishConfiguration(AcknowledgeFinishConfiguration),
    );
    assert_eq!(state.phase(), ProtocolPhase::Play);
    assert!(!switch.bossbars().is_suppressed());
    match transport.packets().as_slice() {
        [Packet::BossBar(packet)] => {
            assert_eq!(packet.id, bar.id());
            assert!(matches!(
                packet.action,
                BossBarAction::Add { health, .. } if health == 0.3
            ));
        }
        other => panic!("expected a single replayed creation, got {other:?}"),
    }
}

#[test]
fn switch_can_only_start_from_play() {
    let (state, transport, mut switch) = setup();
    feed(&state, &mut switch, Packet::LoginAcknowledged(LoginAcknowledged));

    assert!(matches!(
        switch.start(),
        Err(SessionError::Phase(PhaseError::WrongPhase {
            expected: ProtocolPhase::Play,
            actual: ProtocolPhase::Configuration,
        }))
    ));
    assert!(transport.events().is_empty());
    assert!(!switch.bossbars().is_suppressed());
}
