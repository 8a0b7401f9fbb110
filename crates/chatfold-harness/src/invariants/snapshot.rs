//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of the facade at a point in time.
//! Invariants operate on snapshots rather than live state to ensure
//! consistent, atomic checks. Maps are ordered so two snapshots of the same
//! state compare equal.

use std::{
    collections::{BTreeMap, BTreeSet},
    ops::Sub,
    time::Duration,
};

use chatfold_app::ChatFacade;
use chatfold_core::{EventId, Room, RoomId, UserId};

/// Snapshot of the facade's observable state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemSnapshot {
    /// Selected room. `None` if no room is open.
    pub selected_room: Option<RoomId>,
    /// Room list order, hidden rooms included.
    pub room_order: Vec<RoomId>,
    /// All known rooms.
    pub rooms: BTreeMap<RoomId, RoomSnapshot>,
}

impl SystemSnapshot {
    /// Create an empty snapshot (no rooms).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Capture the current state of `facade`.
    pub fn from_facade<I>(facade: &ChatFacade<I>) -> Self
    where
        I: Copy + Ord + Sub<Output = Duration>,
    {
        let rooms = facade
            .rooms()
            .map(|room| {
                let snapshot =
                    RoomSnapshot::from_room(room).with_unread(facade.unread_count(room.id()));
                (room.id().clone(), snapshot)
            })
            .collect();

        Self {
            selected_room: facade.selected_room().cloned(),
            room_order: facade.room_order().to_vec(),
            rooms,
        }
    }

    /// Add a room snapshot.
    #[must_use]
    pub fn with_room(mut self, room_id: impl Into<RoomId>, room: RoomSnapshot) -> Self {
        let room_id = room_id.into();
        self.room_order.push(room_id.clone());
        self.rooms.insert(room_id, room);
        self
    }

    /// Set the selected room.
    #[must_use]
    pub fn with_selected(mut self, room_id: Option<RoomId>) -> Self {
        self.selected_room = room_id;
        self
    }
}

/// Snapshot of one room's timeline and derived indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomSnapshot {
    /// Stored event ids, timeline order.
    pub event_ids: Vec<EventId>,
    /// Canonical message ids, timeline order.
    pub canonical: Vec<EventId>,
    /// Stored events that must never be canonical.
    pub non_canonical: BTreeSet<EventId>,
    /// Resolved replies, reply id to target id.
    pub replies: BTreeMap<EventId, EventId>,
    /// Reaction tallies per target, keys in first-seen order.
    pub reactions: BTreeMap<EventId, Vec<(String, Vec<UserId>)>>,
    /// Unread count.
    pub unread: u32,
}

impl RoomSnapshot {
    /// Capture a room's timeline and resolution.
    pub fn from_room(room: &Room) -> Self {
        let resolution = room.resolution();
        Self {
            event_ids: room.store().iter().map(|event| event.id.clone()).collect(),
            canonical: resolution.canonical().to_vec(),
            non_canonical: room
                .store()
                .iter()
                .filter(|event| !event.is_canonical())
                .map(|event| event.id.clone())
                .collect(),
            replies: resolution
                .replies()
                .iter()
                .map(|(reply, target)| (reply.clone(), target.clone()))
                .collect(),
            reactions: resolution
                .all_reactions()
                .iter()
                .map(|(target, tally)| {
                    let keys = tally.iter().map(|(key, who)| (key.clone(), who.clone())).collect();
                    (target.clone(), keys)
                })
                .collect(),
            unread: 0,
        }
    }

    /// Set the unread count.
    #[must_use]
    pub fn with_unread(mut self, unread: u32) -> Self {
        self.unread = unread;
        self
    }

    /// Set the stored and canonical ids.
    #[must_use]
    pub fn with_events(
        mut self,
        event_ids: impl IntoIterator<Item = &'static str>,
        canonical: impl IntoIterator<Item = &'static str>,
    ) -> Self {
        self.event_ids = event_ids.into_iter().map(EventId::new).collect();
        self.canonical = canonical.into_iter().map(EventId::new).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use chatfold_core::Event;

    use super::*;

    #[test]
    fn empty_snapshot() {
        let snapshot = SystemSnapshot::empty();
        assert!(snapshot.rooms.is_empty());
        assert_eq!(snapshot.selected_room, None);
    }

    #[test]
    fn room_snapshot_captures_derived_indices() {
        let mut room = Room::new(RoomId::new("!a"), "A", Vec::<UserId>::new());
        room.append([
            Event::message("$1", "!a", "@bob:x", 1, "hi"),
            Event::reply("$2", "!a", "@carol:x", 2, "$1", "hey"),
            Event::reaction("$3", "!a", "@carol:x", 3, "$1", "👍"),
        ]);

        let snapshot = RoomSnapshot::from_room(&room);

        assert_eq!(snapshot.event_ids.len(), 3);
        assert_eq!(snapshot.canonical, [EventId::new("$1"), EventId::new("$2")]);
        assert!(snapshot.non_canonical.contains(&EventId::new("$3")));
        assert_eq!(snapshot.replies.get(&EventId::new("$2")), Some(&EventId::new("$1")));
        assert_eq!(snapshot.reactions[&EventId::new("$1")][0].0, "👍");
    }
}
