//! Boss bar tracking across a backend switch.
use std::sync::Arc;

use lure_session::{
    proto::{BossBarAction, BossBarColor, BossBarOverlay, BossBarPacket, Packet, Uuid},
    session::{BossBar, BossBarManager, MemoryTransport},
};

fn bar(title: &str) -> Arc<BossBar> {
    BossBar::new(title, 0.5, BossBarColor::Purple, BossBarOverlay::Progress)
}

fn creations(transport: &MemoryTransport) -> Vec<Uuid> {
    transport
        .packets()
        .into_iter()
        .filter_map(|packet| match packet {
            Packet::BossBar(packet) if matches!(packet.action, BossBarAction::Add { .. }) => {
                Some(packet.id)
            }
            _ => None,
        })
        .collect()
}

#[test]
fn suppressed_updates_are_tracked_then_replayed_once() {
    let transport = Arc::new(MemoryTransport::default());
    let manager = BossBarManager::new(Uuid::new_v4(), transport.clone());
    let kept = bar("kept");
    let dropped = bar("dropped");
    kept.show(&manager);
    transport.take_events();

    manager.begin_suppression();
    let added = bar("added");
    added.show(&manager);
    dropped.show(&manager);
    dropped.hide(&manager);
    kept.set_health(0.9);
    assert!(transport.events().is_empty());
    assert!(manager.contains(added.id()));
    assert!(!manager.contains(dropped.id()));

    manager.end_suppression_and_replay();
    let mut replayed = creations(&transport);
    replayed.sort();
    let mut expected = vec![kept.id(), added.id()];
    expected.sort();
    assert_eq!(replayed, expected);
    assert_eq!(transport.packets().len(), 2);
    assert!(!manager.is_suppressed());

    transport.take_events();
    let fresh = bar("fresh");
    fresh.show(&manager);
    assert_eq!(creations(&transport), vec![fresh.id()]);
}

#[test]
fn replay_carries_the_latest_state() {
    let transport = Arc::new(MemoryTransport::default());
    let manager = BossBarManager::new(Uuid::new_v4(), transport.clone());
    let bar = bar("before");
    bar.show(&manager);

    manager.begin_suppression();
    bar.set_title("after");
    bar.set_health(0.25);
    transport.take_events();
    manager.end_suppression_and_replay();

    match transport.packets().as_slice() {
        [Packet::BossBar(packet)] => match &packet.action {
            BossBarAction::Add { title, health, .. } => {
                assert_eq!(title.plain(), Some("after"));
                assert_eq!(*health, 0.25);
            }
            other => panic!("expected a creation packet, got {other:?}"),
        },
        other => panic!("expected one packet, got {other:?}"),
    }
}

#[test]
fn players_do_not_share_suppression() {
    let first = Arc::new(MemoryTransport::default());
    let second = Arc::new(MemoryTransport::default());
    let a = BossBarManager::new(Uuid::new_v4(), first.clone());
    let b = BossBarManager::new(Uuid::new_v4(), second.clone());
    let shared = bar("shared");

    a.begin_suppression();
    shared.show(&a);
    shared.show(&b);
    assert!(first.events().is_empty());
    assert_eq!(creations(&second), vec![shared.id()]);
}

#[test]
fn update_landing_after_hide_does_not_revive_the_bar() {
    let transport = Arc::new(MemoryTransport::default());
    let manager = BossBarManager::new(Uuid::new_v4(), transport.clone());
    let bar = bar("gone");
    bar.show(&manager);
    bar.hide(&manager);
    transport.take_events();

    // an update computed from a viewer list snapshot taken before the hide
    manager.record_and_send(
        &bar,
        BossBarPacket {
            id: bar.id(),
            action: BossBarAction::UpdateHealth(0.1),
        },
    );
    assert!(!manager.contains(bar.id()));
    assert!(transport.events().is_empty());

    manager.begin_suppression();
    manager.end_suppression_and_replay();
    assert!(creations(&transport).is_empty());
}
