//! Unread counting.
//!
//! The tracker starts [`UnreadMode::Suppressed`] because the initial sync
//! replays the whole backlog as if it were arriving live. Once the settle
//! delay has elapsed it switches to [`UnreadMode::Active`] and stays there.
//!
//! Each room is either [`RoomUnread::Idle`] (currently selected, nothing
//! counts) or [`RoomUnread::Tracking`] (counting qualifying events).

use std::{
    collections::{HashMap, HashSet},
    ops::Sub,
    time::Duration,
};

use crate::event::{RoomId, UserId};

/// Global counting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnreadMode<I> {
    /// Initial sync in progress since `since`; nothing counts.
    Suppressed {
        /// Session start.
        since: I,
    },
    /// Counting.
    Active,
}

/// Per-room counter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomUnread {
    /// Room is selected; events are presumed read.
    Idle(u32),
    /// Room is in the background; qualifying events count.
    Tracking(u32),
}

impl RoomUnread {
    /// Current count.
    pub fn count(self) -> u32 {
        match self {
            Self::Idle(count) | Self::Tracking(count) => count,
        }
    }
}

/// Counts unread events per room.
#[derive(Debug, Clone)]
pub struct UnreadTracker<I> {
    mode: UnreadMode<I>,
    settle_delay: Duration,
    local_user: UserId,
    linked: HashSet<UserId>,
    rooms: HashMap<RoomId, RoomUnread>,
}

impl<I> UnreadTracker<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Create a tracker for a session that started at `started_at`.
    ///
    /// `linked` holds identities that represent the local user elsewhere
    /// (e.g., a bridge puppet); their traffic never counts.
    pub fn new(
        local_user: UserId,
        linked: impl IntoIterator<Item = UserId>,
        settle_delay: Duration,
        started_at: I,
    ) -> Self {
        Self {
            mode: UnreadMode::Suppressed { since: started_at },
            settle_delay,
            local_user,
            linked: linked.into_iter().collect(),
            rooms: HashMap::new(),
        }
    }

    /// Advance time. Returns true on the one transition to active.
    pub fn tick(&mut self, now: I) -> bool {
        match self.mode {
            UnreadMode::Suppressed { since } if now - since >= self.settle_delay => {
                self.mode = UnreadMode::Active;
                tracing::info!(
                    settle = ?self.settle_delay,
                    "initial sync settled, counting unread"
                );
                true
            },
            _ => false,
        }
    }

    /// Current mode.
    pub fn mode(&self) -> UnreadMode<I> {
        self.mode
    }

    /// True once the settle delay has elapsed.
    pub fn is_active(&self) -> bool {
        matches!(self.mode, UnreadMode::Active)
    }

    /// True if `sender` is the local user or a linked identity.
    pub fn is_self(&self, sender: &UserId) -> bool {
        *sender == self.local_user || self.linked.contains(sender)
    }

    /// Start tracking a room if it is not known yet.
    pub fn track_room(&mut self, room_id: &RoomId) {
        self.rooms.entry(room_id.clone()).or_insert(RoomUnread::Tracking(0));
    }

    /// Make `room_id` the selected room, or clear the selection.
    ///
    /// The newly selected room is reset to zero. The previously selected room
    /// goes back to tracking.
    pub fn set_active_room(&mut self, room_id: Option<&RoomId>) {
        for state in self.rooms.values_mut() {
            if let RoomUnread::Idle(count) = *state {
                *state = RoomUnread::Tracking(count);
            }
        }
        if let Some(room_id) = room_id {
            self.rooms.insert(room_id.clone(), RoomUnread::Idle(0));
        }
    }

    /// Reset a room's counter without changing its state.
    pub fn reset(&mut self, room_id: &RoomId) {
        if let Some(state) = self.rooms.get_mut(room_id) {
            *state = match *state {
                RoomUnread::Idle(_) => RoomUnread::Idle(0),
                RoomUnread::Tracking(_) => RoomUnread::Tracking(0),
            };
        }
    }

    /// Record one newly appended event. Returns true if it counted.
    ///
    /// Backfilled events must not be passed here.
    pub fn record(&mut self, now: I, room_id: &RoomId, sender: &UserId) -> bool {
        self.tick(now);
        if !self.is_active() || self.is_self(sender) {
            return false;
        }

        let state = self.rooms.entry(room_id.clone()).or_insert(RoomUnread::Tracking(0));
        match state {
            RoomUnread::Idle(_) => false,
            RoomUnread::Tracking(count) => {
                *count = count.saturating_add(1);
                true
            },
        }
    }

    /// Unread count for a room. Zero for unknown rooms.
    pub fn count(&self, room_id: &RoomId) -> u32 {
        self.rooms.get(room_id).map_or(0, |state| state.count())
    }

    /// Counter state for a room.
    pub fn state(&self, room_id: &RoomId) -> Option<RoomUnread> {
        self.rooms.get(room_id).copied()
    }
}
