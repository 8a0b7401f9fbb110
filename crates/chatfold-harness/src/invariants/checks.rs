//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use std::collections::HashSet;

use super::{Invariant, InvariantResult, SystemSnapshot};

/// Selected room must exist in the rooms map.
///
/// This prevents the UI from showing a selected room that doesn't exist.
pub struct SelectedRoomExists;

impl Invariant for SelectedRoomExists {
    fn name(&self) -> &'static str {
        "selected_room_exists"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        if let Some(selected) = &state.selected_room
            && !state.rooms.contains_key(selected)
        {
            return Err(self.violation(format!(
                "selected room {selected} not in rooms {:?}",
                state.rooms.keys().collect::<Vec<_>>()
            )));
        }
        Ok(())
    }
}

/// The room the user is looking at never shows unread messages.
pub struct SelectedRoomUnreadZero;

impl Invariant for SelectedRoomUnreadZero {
    fn name(&self) -> &'static str {
        "selected_room_unread_zero"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let Some(selected) = &state.selected_room else { return Ok(()) };
        match state.rooms.get(selected) {
            Some(room) if room.unread > 0 => Err(self.violation(format!(
                "selected room {selected} has {} unread",
                room.unread
            ))),
            _ => Ok(()),
        }
    }
}

/// The room list holds every known room exactly once.
pub struct RoomOrderComplete;

impl Invariant for RoomOrderComplete {
    fn name(&self) -> &'static str {
        "room_order_complete"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let mut seen = HashSet::new();
        for room_id in &state.room_order {
            if !seen.insert(room_id) {
                return Err(self.violation(format!("room {room_id} listed twice")));
            }
            if !state.rooms.contains_key(room_id) {
                return Err(self.violation(format!("listed room {room_id} is unknown")));
            }
        }
        if seen.len() != state.rooms.len() {
            return Err(self.violation(format!(
                "{} rooms listed, {} known",
                seen.len(),
                state.rooms.len()
            )));
        }
        Ok(())
    }
}

/// No event id appears twice in a room timeline.
pub struct TimelineIdsUnique;

impl Invariant for TimelineIdsUnique {
    fn name(&self) -> &'static str {
        "timeline_ids_unique"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for (room_id, room) in &state.rooms {
            let mut seen = HashSet::new();
            if let Some(dup) = room.event_ids.iter().find(|id| !seen.insert(*id)) {
                return Err(self.violation(format!("room {room_id}: event {dup} stored twice")));
            }
        }
        Ok(())
    }
}

/// Canonical messages are stored events that are not edits, reactions,
/// redactions or unknown types.
pub struct CanonicalExcludesRelations;

impl Invariant for CanonicalExcludesRelations {
    fn name(&self) -> &'static str {
        "canonical_excludes_relations"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for (room_id, room) in &state.rooms {
            let stored: HashSet<_> = room.event_ids.iter().collect();
            for id in &room.canonical {
                if room.non_canonical.contains(id) {
                    return Err(self.violation(format!(
                        "room {room_id}: {id} is canonical but carries a relation or is not a \
                         message"
                    )));
                }
                if !stored.contains(id) {
                    let message = format!("room {room_id}: canonical {id} not stored");
                    return Err(self.violation(message));
                }
            }
        }
        Ok(())
    }
}

/// A sender counts at most once per reaction glyph on a target.
pub struct ReactionSendersUnique;

impl Invariant for ReactionSendersUnique {
    fn name(&self) -> &'static str {
        "reaction_senders_unique"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for (room_id, room) in &state.rooms {
            for (target, tally) in &room.reactions {
                for (key, senders) in tally {
                    let unique: HashSet<_> = senders.iter().collect();
                    if unique.len() != senders.len() {
                        return Err(self.violation(format!(
                            "room {room_id}: {key} on {target} counts a sender twice: {senders:?}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// A resolved reply points at an event that is loaded in the same room.
pub struct ReplyTargetsLoaded;

impl Invariant for ReplyTargetsLoaded {
    fn name(&self) -> &'static str {
        "reply_targets_loaded"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for (room_id, room) in &state.rooms {
            let stored: HashSet<_> = room.event_ids.iter().collect();
            for (reply, target) in &room.replies {
                if !stored.contains(target) {
                    return Err(self.violation(format!(
                        "room {room_id}: reply {reply} resolved to unloaded {target}"
                    )));
                }
            }
        }
        Ok(())
    }
}
