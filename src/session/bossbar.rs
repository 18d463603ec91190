//! Boss bars shown to a player, replayed after every backend switch.
//!
//! A client forgets every boss bar when it leaves a backend. While the switch
//! is in flight updates are only recorded; once it completes each tracked bar
//! is sent again as a fresh creation.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};

use super::transport::Transport;
use crate::{
    logging::SessionLogger,
    metrics::BossBarMetrics,
    proto::{
        BossBarAction, BossBarColor, BossBarOverlay, BossBarPacket, Component, Packet, Uuid,
    },
    telemetry::get_meter,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Clone, PartialEq)]
struct BarState {
    title: Component,
    health: f32,
    color: BossBarColor,
    overlay: BossBarOverlay,
    flags: u8,
}

/// A boss bar that can be shown to any number of players.
#[derive(Debug)]
pub struct BossBar {
    id: Uuid,
    state: Mutex<BarState>,
    viewers: Mutex<Vec<Arc<BossBarManager>>>,
}

fn clamp_health(health: f32) -> f32 {
    if health.is_nan() {
        0.0
    } else {
        health.clamp(0.0, 1.0)
    }
}

impl BossBar {
    pub fn new(
        title: impl Into<Component>,
        health: f32,
        color: BossBarColor,
        overlay: BossBarOverlay,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            state: Mutex::new(BarState {
                title: title.into(),
                health: clamp_health(health),
                color,
                overlay,
                flags: 0,
            }),
            viewers: Mutex::new(Vec::new()),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> Component {
        lock(&self.state).title.clone()
    }

    pub fn health(&self) -> f32 {
        lock(&self.state).health
    }

    pub fn flags(&self) -> u8 {
        lock(&self.state).flags
    }

    /// Creation packet reflecting the current state.
    pub fn create_packet(&self) -> BossBarPacket {
        let state = lock(&self.state);
        BossBarPacket {
            id: self.id,
            action: BossBarAction::Add {
                title: state.title.clone(),
                health: state.health,
                color: state.color,
                overlay: state.overlay,
                flags: state.flags,
            },
        }
    }

    pub fn remove_packet(&self) -> BossBarPacket {
        BossBarPacket {
            id: self.id,
            action: BossBarAction::Remove,
        }
    }

    pub fn show(self: &Arc<Self>, manager: &Arc<BossBarManager>) {
        {
            let mut viewers = lock(&self.viewers);
            if viewers.iter().any(|v| Arc::ptr_eq(v, manager)) {
                return;
            }
            viewers.push(manager.clone());
        }
        manager.record_and_send(self, self.create_packet());
    }

    pub fn hide(self: &Arc<Self>, manager: &Arc<BossBarManager>) {
        let removed = {
            let mut viewers = lock(&self.viewers);
            let before = viewers.len();
            viewers.retain(|v| !Arc::ptr_eq(v, manager));
            viewers.len() != before
        };
        if removed {
            manager.remove(self, self.remove_packet());
        }
    }

    pub fn viewer_count(&self) -> usize {
        lock(&self.viewers).len()
    }

    fn is_viewed_by(&self, manager: &BossBarManager) -> bool {
        lock(&self.viewers)
            .iter()
            .any(|v| std::ptr::eq(Arc::as_ptr(v), manager))
    }

    pub fn set_title(self: &Arc<Self>, title: impl Into<Component>) {
        let title = title.into();
        lock(&self.state).title = title.clone();
        self.broadcast(BossBarAction::UpdateTitle(title));
    }

    pub fn set_health(self: &Arc<Self>, health: f32) {
        let health = clamp_health(health);
        lock(&self.state).health = health;
        self.broadcast(BossBarAction::UpdateHealth(health));
    }

    pub fn set_style(self: &Arc<Self>, color: BossBarColor, overlay: BossBarOverlay) {
        {
            let mut state = lock(&self.state);
            state.color = color;
            state.overlay = overlay;
        }
        self.broadcast(BossBarAction::UpdateStyle { color, overlay });
    }

    pub fn set_flags(self: &Arc<Self>, flags: u8) {
        lock(&self.state).flags = flags;
        self.broadcast(BossBarAction::UpdateFlags(flags));
    }

    fn broadcast(self: &Arc<Self>, action: BossBarAction) {
        let viewers = lock(&self.viewers).clone();
        for viewer in viewers {
            viewer.record_and_send(
                self,
                BossBarPacket {
                    id: self.id,
                    action: action.clone(),
                },
            );
        }
    }
}

#[derive(Debug, Default)]
struct ManagerState {
    bars: BTreeMap<Uuid, Arc<BossBar>>,
    suppressed: bool,
}

/// Per-player record of visible boss bars.
pub struct BossBarManager {
    player: Uuid,
    transport: Arc<dyn Transport>,
    state: Mutex<ManagerState>,
    metrics: BossBarMetrics,
}

impl std::fmt::Debug for BossBarManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BossBarManager")
            .field("player", &self.player)
            .field("remote", &self.transport.remote_address())
            .finish_non_exhaustive()
    }
}

impl BossBarManager {
    pub fn new(player: Uuid, transport: Arc<dyn Transport>) -> Arc<Self> {
        Arc::new(Self {
            player,
            transport,
            state: Mutex::new(ManagerState::default()),
            metrics: BossBarMetrics::new(&get_meter()),
        })
    }

    pub fn player(&self) -> Uuid {
        self.player
    }

    /// Tracks `bar` and sends `packet` unless a backend switch is in flight.
    ///
    /// Ignored once this player is no longer a viewer of `bar`, so an update
    /// racing a hide cannot bring the bar back.
    pub fn record_and_send(&self, bar: &Arc<BossBar>, packet: BossBarPacket) {
        let mut state = lock(&self.state);
        if !bar.is_viewed_by(self) {
            return;
        }
        state.bars.insert(bar.id(), bar.clone());
        if !state.suppressed {
            self.transport.write(Packet::BossBar(packet));
        }
    }

    /// Stops tracking `bar` and sends `packet` unless a backend switch is in flight.
    pub fn remove(&self, bar: &BossBar, packet: BossBarPacket) {
        let mut state = lock(&self.state);
        state.bars.remove(&bar.id());
        if !state.suppressed {
            self.transport.write(Packet::BossBar(packet));
        }
    }

    pub fn begin_suppression(&self) {
        lock(&self.state).suppressed = true;
    }

    /// Re-creates every tracked bar on the client and resumes live updates.
    pub fn end_suppression_and_replay(&self) {
        let mut state = lock(&self.state);
        for bar in state.bars.values() {
            self.transport.write(Packet::BossBar(bar.create_packet()));
        }
        let replayed = state.bars.len();
        state.suppressed = false;
        drop(state);

        self.metrics.record_replay(replayed as u64);
        SessionLogger::bossbars_replayed(&self.transport.remote_address(), replayed);
    }

    pub fn is_suppressed(&self) -> bool {
        lock(&self.state).suppressed
    }

    pub fn contains(&self, id: Uuid) -> bool {
        lock(&self.state).bars.contains_key(&id)
    }

    /// Ids of the tracked bars in replay order.
    pub fn tracked(&self) -> Vec<Uuid> {
        lock(&self.state).bars.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::transport::{MemoryTransport, TransportEvent};

    fn manager() -> (Arc<MemoryTransport>, Arc<BossBarManager>) {
        let transport = Arc::new(MemoryTransport::default());
        let manager = BossBarManager::new(Uuid::new_v4(), transport.clone());
        (transport, manager)
    }

    #[test]
    fn show_sends_creation_and_tracks() {
        let (transport, manager) = manager();
        let bar = BossBar::new("Raid", 0.5, BossBarColor::Red, BossBarOverlay::Progress);
        bar.show(&manager);
        bar.show(&manager);

        assert!(manager.contains(bar.id()));
        assert_eq!(
            transport.packets(),
            vec![Packet::BossBar(bar.create_packet())]
        );
        assert_eq!(bar.viewer_count(), 1);
    }

    #[test]
    fn updates_reach_every_viewer() {
        let (first_transport, first) = manager();
        let (second_transport, second) = manager();
        let bar = BossBar::new("Raid", 1.0, BossBarColor::Red, BossBarOverlay::Progress);
        bar.show(&first);
        bar.show(&second);
        bar.set_health(0.25);

        let expected = Packet::BossBar(BossBarPacket {
            id: bar.id(),
            action: BossBarAction::UpdateHealth(0.25),
        });
        assert_eq!(first_transport.packets().last(), Some(&expected));
        assert_eq!(second_transport.packets().last(), Some(&expected));
    }

    #[test]
    fn health_is_clamped() {
        let bar = BossBar::new("x", 4.0, BossBarColor::Blue, BossBarOverlay::Notched6);
        assert_eq!(bar.health(), 1.0);
        bar.set_health(f32::NAN);
        assert_eq!(bar.health(), 0.0);
    }

    #[test]
    fn hide_removes_and_sends_remove() {
        let (transport, manager) = manager();
        let bar = BossBar::new("x", 1.0, BossBarColor::Blue, BossBarOverlay::Progress);
        bar.show(&manager);
        transport.take_events();
        bar.hide(&manager);

        assert!(!manager.contains(bar.id()));
        assert_eq!(
            transport.events(),
            vec![TransportEvent::Write(Packet::BossBar(bar.remove_packet()))]
        );
        bar.hide(&manager);
        assert_eq!(transport.events().len(), 1);
    }
}
