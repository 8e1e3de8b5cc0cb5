//! Small per-connection state machines the translators read and write.
//! Each one exists so a stateless-looking translator can reconstruct
//! information the target protocol needs but the packet does not carry.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use mc_relay_proto::BlockLocation;

/// Last ground flag the client reported through a movement packet.
#[derive(Debug, Default)]
pub struct OnGroundTracker {
    last: Option<bool>,
}

impl OnGroundTracker {
    /// Record the flag; returns whether it differs from the cached value.
    pub fn update(&mut self, on_ground: bool) -> bool {
        let changed = self.last != Some(on_ground);
        self.last = Some(on_ground);
        changed
    }

    pub fn last(&self) -> Option<bool> {
        self.last
    }
}

/// Window id to window type, recorded on open-window. Consulted by the
/// slot remappers, since slot numbering diverges for some window types.
#[derive(Debug, Default)]
pub struct WindowTypeTracker {
    types: HashMap<i16, u8>,
}

impl WindowTypeTracker {
    pub fn set_window_type(&mut self, window_id: i16, window_type: u8) {
        self.types.insert(window_id, window_type);
    }

    /// Type of the window, 0 (player inventory) when unknown.
    pub fn window_type(&self, window_id: i16) -> u8 {
        self.types.get(&window_id).copied().unwrap_or(0)
    }
}

/// Hot-bar contents and the held slot index, so the held item id can be
/// re-queried without re-reading the network.
#[derive(Debug, Default)]
pub struct QuickBarTracker {
    items: HashMap<i16, i16>,
    current_slot: i16,
}

impl QuickBarTracker {
    /// Hot-bar slots within the player inventory window.
    pub const FIRST_SLOT: i16 = 36;
    pub const LAST_SLOT: i16 = 44;

    pub fn add_item(&mut self, slot: i16, item_id: i16) {
        self.items.insert(slot, item_id);
    }

    pub fn item_at(&self, slot: i16) -> i16 {
        self.items.get(&slot).copied().unwrap_or(0)
    }

    pub fn set_current_hot_bar_slot(&mut self, slot: i16) {
        self.current_slot = slot;
    }

    pub fn current_hot_bar_slot(&self) -> i16 {
        self.current_slot
    }

    pub fn held_item_id(&self) -> i16 {
        self.item_at(Self::FIRST_SLOT + self.current_slot)
    }
}

/// Entity id to displayed name, so an entity-destroy packet (which only
/// carries the id) can emit the matching tab-list removal.
#[derive(Debug, Default)]
pub struct TabListCache {
    players: HashMap<i32, String>,
}

impl TabListCache {
    pub fn insert(&mut self, entity_id: i32, name: String) {
        self.players.insert(entity_id, name);
    }

    pub fn remove(&mut self, entity_id: i32) -> Option<String> {
        self.players.remove(&entity_id)
    }

    pub fn contains(&self, entity_id: i32) -> bool {
        self.players.contains_key(&entity_id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

/// In-progress digging actions by block coordinate.
#[derive(Debug, Default)]
pub struct MiningTracker {
    digs: HashMap<(i32, i32, i32), Instant>,
}

impl MiningTracker {
    pub fn start(&mut self, location: BlockLocation) {
        self.digs
            .insert((location.x, location.y, location.z), Instant::now());
    }

    pub fn cancel(&mut self, location: BlockLocation) {
        self.digs.remove(&(location.x, location.y, location.z));
    }

    /// Close out a dig, returning how long it ran.
    pub fn finish(&mut self, location: BlockLocation) -> Option<Duration> {
        self.digs
            .remove(&(location.x, location.y, location.z))
            .map(|started| started.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_ground_reports_changes_only() {
        let mut tracker = OnGroundTracker::default();
        assert!(tracker.update(true));
        assert!(!tracker.update(true));
        assert!(tracker.update(false));
        assert_eq!(tracker.last(), Some(false));
    }

    #[test]
    fn window_type_defaults_to_player_inventory() {
        let mut tracker = WindowTypeTracker::default();
        assert_eq!(tracker.window_type(3), 0);
        tracker.set_window_type(3, 4);
        assert_eq!(tracker.window_type(3), 4);
    }

    #[test]
    fn quick_bar_resolves_held_item() {
        let mut tracker = QuickBarTracker::default();
        tracker.add_item(38, 276);
        tracker.set_current_hot_bar_slot(2);
        assert_eq!(tracker.held_item_id(), 276);
        tracker.set_current_hot_bar_slot(3);
        assert_eq!(tracker.held_item_id(), 0);
    }

    #[test]
    fn mining_finish_clears_the_entry() {
        let mut tracker = MiningTracker::default();
        let loc = BlockLocation::new(1, 64, -3);
        tracker.start(loc);
        assert!(tracker.finish(loc).is_some());
        assert!(tracker.finish(loc).is_none());
    }
}
