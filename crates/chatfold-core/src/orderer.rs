//! Sidebar ordering of rooms.
//!
//! Rooms sort by the timestamp of their latest canonical message, newest
//! first, with empty rooms last. Rooms that contain a priority member are
//! then moved ahead of the rest by a stable partition. Both steps are stable,
//! so rooms whose recency key did not change keep their relative position
//! across recomputations.

use std::{cmp::Reverse, collections::HashSet};

use crate::event::{RoomId, UserId};

/// Ordering input for one room.
#[derive(Debug, Clone, Copy)]
pub struct RoomRecency<'a> {
    /// Room being ordered.
    pub room_id: &'a RoomId,
    /// Timestamp of the room's latest canonical message.
    pub latest: Option<u64>,
    /// Current members of the room.
    pub members: &'a HashSet<UserId>,
}

/// Produces the room list order.
#[derive(Debug, Clone, Default)]
pub struct RoomOrderer {
    priority: HashSet<UserId>,
}

impl RoomOrderer {
    /// Create an orderer with the given priority allow-list.
    pub fn new(priority: impl IntoIterator<Item = UserId>) -> Self {
        Self { priority: priority.into_iter().collect() }
    }

    /// True if any member is on the priority allow-list.
    pub fn is_priority(&self, members: &HashSet<UserId>) -> bool {
        !self.priority.is_empty() && members.iter().any(|m| self.priority.contains(m))
    }

    /// Order rooms for display. Input order breaks ties.
    pub fn order<'a>(&self, rooms: impl IntoIterator<Item = RoomRecency<'a>>) -> Vec<RoomId> {
        let mut rooms: Vec<RoomRecency<'a>> = rooms.into_iter().collect();

        // `Reverse(None)` sorts after every `Reverse(Some(_))`.
        rooms.sort_by_key(|room| Reverse(room.latest));

        let (priority, rest): (Vec<_>, Vec<_>) =
            rooms.into_iter().partition(|room| self.is_priority(room.members));

        priority.into_iter().chain(rest).map(|room| room.room_id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members(ids: &[&str]) -> HashSet<UserId> {
        ids.iter().map(|id| UserId::new(*id)).collect()
    }

    fn names(order: &[RoomId]) -> Vec<&str> {
        order.iter().map(RoomId::as_str).collect()
    }

    #[test]
    fn recency_descending_with_empty_rooms_last() {
        let (r1, r2, r3) = (RoomId::new("R1"), RoomId::new("R2"), RoomId::new("R3"));
        let none = HashSet::new();
        let orderer = RoomOrderer::default();

        let order = orderer.order([
            RoomRecency { room_id: &r1, latest: Some(5), members: &none },
            RoomRecency { room_id: &r2, latest: Some(10), members: &none },
            RoomRecency { room_id: &r3, latest: None, members: &none },
        ]);

        assert_eq!(names(&order), ["R2", "R1", "R3"]);
    }

    #[test]
    fn priority_member_moves_room_first() {
        let (r1, r2, r3) = (RoomId::new("R1"), RoomId::new("R2"), RoomId::new("R3"));
        let none = HashSet::new();
        let vip = members(&["@boss:example.org", "@me:example.org"]);
        let orderer = RoomOrderer::new([UserId::new("@boss:example.org")]);

        let order = orderer.order([
            RoomRecency { room_id: &r1, latest: Some(5), members: &vip },
            RoomRecency { room_id: &r2, latest: Some(10), members: &none },
            RoomRecency { room_id: &r3, latest: None, members: &none },
        ]);

        assert_eq!(names(&order), ["R1", "R2", "R3"]);
    }

    #[test]
    fn ties_keep_input_order() {
        let rooms: Vec<RoomId> = ["A", "B", "C"].into_iter().map(RoomId::new).collect();
        let none = HashSet::new();
        let orderer = RoomOrderer::default();

        let order = orderer.order(
            rooms.iter().map(|id| RoomRecency { room_id: id, latest: Some(7), members: &none }),
        );
        assert_eq!(names(&order), ["A", "B", "C"]);

        let order = orderer.order(
            rooms.iter().map(|id| RoomRecency { room_id: id, latest: None, members: &none }),
        );
        assert_eq!(names(&order), ["A", "B", "C"]);
    }

    #[test]
    fn priority_partition_is_stable() {
        let ids: Vec<RoomId> = ["A", "B", "C", "D"].into_iter().map(RoomId::new).collect();
        let none = HashSet::new();
        let vip = members(&["@vip:x"]);
        let orderer = RoomOrderer::new([UserId::new("@vip:x")]);

        let order = orderer.order([
            RoomRecency { room_id: &ids[0], latest: Some(40), members: &none },
            RoomRecency { room_id: &ids[1], latest: Some(30), members: &vip },
            RoomRecency { room_id: &ids[2], latest: Some(20), members: &none },
            RoomRecency { room_id: &ids[3], latest: None, members: &vip },
        ]);

        assert_eq!(names(&order), ["B", "D", "A", "C"]);
    }
}
