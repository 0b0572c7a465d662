//! The seam between the engine and the world map.
//!
//! Rooms, exits and sessions live outside the engine. The zone only needs to
//! know where a player is, whether they are connected, what a room is
//! called, and how to move someone to the disposal site or the entry hub.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use ballast_types::{PlayerId, RoomId};

/// A named place the engine moves players to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Place {
    /// Where offenders are escorted.
    Disposal,
    /// Where players respawn.
    Hub,
}

/// Read and relocate access to the world map.
pub trait Topology: Send + Sync {
    /// Last known room of a player, connected or not.
    fn room_of(&self, player: PlayerId) -> Option<RoomId>;

    /// Whether the player is connected.
    fn is_online(&self, player: PlayerId) -> bool;

    /// Human-readable room name.
    fn room_name(&self, room: RoomId) -> String;

    /// Name players see for `player`.
    fn display_name(&self, player: PlayerId) -> String;

    /// Room of a named place.
    fn locate(&self, place: Place) -> RoomId;

    /// Move a player to a named place.
    fn relocate(&self, player: PlayerId, place: Place);
}

#[derive(Debug, Default)]
struct Map {
    rooms: HashMap<RoomId, String>,
    players: HashMap<PlayerId, Presence>,
}

#[derive(Debug, Clone)]
struct Presence {
    name: String,
    room: Option<RoomId>,
    online: bool,
}

/// In-memory topology for the standalone engine and tests.
#[derive(Debug)]
pub struct StaticTopology {
    map: RwLock<Map>,
    disposal: RoomId,
    hub: RoomId,
}

impl StaticTopology {
    /// A map holding only the disposal site and the hub.
    pub fn new(disposal_name: &str, hub_name: &str) -> Self {
        let disposal = RoomId::new();
        let hub = RoomId::new();
        let mut map = Map::default();
        map.rooms.insert(disposal, disposal_name.to_owned());
        map.rooms.insert(hub, hub_name.to_owned());
        Self {
            map: RwLock::new(map),
            disposal,
            hub,
        }
    }

    /// Room of a named place.
    pub const fn place(&self, place: Place) -> RoomId {
        match place {
            Place::Disposal => self.disposal,
            Place::Hub => self.hub,
        }
    }

    /// Add a room.
    pub fn add_room(&self, name: &str) -> RoomId {
        let id = RoomId::new();
        self.write().rooms.insert(id, name.to_owned());
        id
    }

    /// Register a connected player in `room`.
    pub fn join(&self, player: PlayerId, name: &str, room: RoomId) {
        self.write().players.insert(
            player,
            Presence {
                name: name.to_owned(),
                room: Some(room),
                online: true,
            },
        );
    }

    /// Move a player to a specific room.
    pub fn move_to(&self, player: PlayerId, room: RoomId) {
        if let Some(presence) = self.write().players.get_mut(&player) {
            presence.room = Some(room);
        }
    }

    /// Mark a player connected or disconnected. Their room is kept.
    pub fn set_online(&self, player: PlayerId, online: bool) {
        if let Some(presence) = self.write().players.get_mut(&player) {
            presence.online = online;
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Map> {
        self.map.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Map> {
        self.map.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Topology for StaticTopology {
    fn room_of(&self, player: PlayerId) -> Option<RoomId> {
        self.read().players.get(&player).and_then(|p| p.room)
    }

    fn is_online(&self, player: PlayerId) -> bool {
        self.read().players.get(&player).is_some_and(|p| p.online)
    }

    fn room_name(&self, room: RoomId) -> String {
        self.read()
            .rooms
            .get(&room)
            .cloned()
            .unwrap_or_else(|| String::from("somewhere on the platform"))
    }

    fn display_name(&self, player: PlayerId) -> String {
        self.read()
            .players
            .get(&player)
            .map_or_else(|| String::from("someone"), |p| p.name.clone())
    }

    fn locate(&self, place: Place) -> RoomId {
        self.place(place)
    }

    fn relocate(&self, player: PlayerId, place: Place) {
        let room = self.place(place);
        self.move_to(player, room);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relocation_moves_between_places() {
        let topology = StaticTopology::new("KonMarie Temple", "Welcome area");
        let gallery = topology.add_room("Gallery");
        let player = PlayerId::new();
        topology.join(player, "Mo", gallery);

        topology.relocate(player, Place::Disposal);
        let room = topology.room_of(player);
        assert_eq!(room, Some(topology.place(Place::Disposal)));
        assert_eq!(
            room.map(|r| topology.room_name(r)).as_deref(),
            Some("KonMarie Temple")
        );
    }

    #[test]
    fn offline_players_keep_their_room() {
        let topology = StaticTopology::new("Temple", "Hub");
        let player = PlayerId::new();
        topology.join(player, "Ada", topology.place(Place::Hub));
        topology.set_online(player, false);
        assert!(!topology.is_online(player));
        assert_eq!(topology.room_of(player), Some(topology.place(Place::Hub)));
        assert_eq!(topology.display_name(PlayerId::new()), "someone");
    }
}
