//! Versioned codec tables exercised through the public registry.
use bytes::Bytes;
use lure_session::proto::{
    BossBarAction, BossBarColor, BossBarOverlay, BossBarPacket, Component, Decoded, Direction, Key,
    Packet, PacketFrame, PacketRegistry, ProtoError, ProtocolPhase, ProtocolVersion, SoundSource,
    StopSound, UnknownPacketPolicy, Uuid,
};

fn play_out(version: ProtocolVersion) -> &'static lure_session::proto::CodecTable {
    PacketRegistry::shared()
        .resolve(ProtocolPhase::Play, Direction::Clientbound, version)
        .unwrap()
}

#[test]
fn stop_sound_header_tracks_present_fields() {
    let table = play_out(ProtocolVersion::MINECRAFT_1_21_5);
    let name = Key::minecraft("ambient.cave").unwrap();
    let cases = [
        (None, None, 0b00),
        (Some(SoundSource::Music), None, 0b01),
        (None, Some(name.clone()), 0b10),
        (Some(SoundSource::Music), Some(name.clone()), 0b11),
    ];
    for (source, name, header) in cases {
        let frame = table
            .encode(&Packet::StopSound(StopSound { source, name }))
            .unwrap();
        assert_eq!(frame.id, 0x70);
        assert_eq!(frame.body[0], header);
        if header == 0 {
            assert_eq!(frame.body.len(), 1);
        }
    }
}

#[test]
fn boss_bar_survives_a_round_trip() {
    for version in [
        ProtocolVersion::MINECRAFT_1_12_2,
        ProtocolVersion::MINECRAFT_1_20_2,
        ProtocolVersion::MINECRAFT_1_21_9,
    ] {
        let table = play_out(version);
        let packet = Packet::BossBar(BossBarPacket {
            id: Uuid::from_u64s(7, 11),
            action: BossBarAction::Add {
                title: Component::text("Wither"),
                health: 0.75,
                color: BossBarColor::Red,
                overlay: BossBarOverlay::Notched10,
                flags: BossBarPacket::DARKEN_SCREEN,
            },
        });
        let frame = table.encode(&packet).unwrap();
        assert_eq!(table.decode(&frame).unwrap(), Decoded::Packet(packet));
    }
}

#[test]
fn ids_move_between_versions() {
    let registry = PacketRegistry::shared();
    let ids: Vec<_> = [
        ProtocolVersion::MINECRAFT_1_12_2,
        ProtocolVersion::MINECRAFT_1_19,
        ProtocolVersion::MINECRAFT_1_21_5,
    ]
    .into_iter()
    .map(|version| {
        registry
            .resolve(ProtocolPhase::Play, Direction::Clientbound, version)
            .unwrap()
            .id_of(lure_session::proto::PacketKind::BossBar)
    })
    .collect();
    assert_eq!(ids, vec![Some(0x0C), Some(0x0A), Some(0x09)]);
}

#[test]
fn unknown_ids_follow_the_table_policy() {
    let registry = PacketRegistry::shared();
    let version = ProtocolVersion::MINECRAFT_1_21;
    let frame = PacketFrame::new(0x7F, Bytes::from_static(b"\x01\x02"));

    let login = registry
        .resolve(ProtocolPhase::Login, Direction::Serverbound, version)
        .unwrap();
    assert_eq!(login.unknown_policy(), UnknownPacketPolicy::Error);
    assert!(matches!(
        login.decode(&frame),
        Err(ProtoError::InvalidPacketId { id: 0x7F, .. })
    ));

    let play = registry
        .resolve(ProtocolPhase::Play, Direction::Serverbound, version)
        .unwrap();
    assert_eq!(play.unknown_policy(), UnknownPacketPolicy::Ignore);
    assert_eq!(play.decode(&frame).unwrap(), Decoded::Unhandled(frame));
}
