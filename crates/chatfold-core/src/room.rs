//! Room aggregate.
//!
//! A [`Room`] couples an [`EventStore`] with the [`Resolution`] derived from
//! it. Every mutation recomputes the resolution before returning, so the
//! timeline and its derived indices are never observed out of step.

use std::collections::HashSet;

use crate::{
    event::{Content, Event, EventId, RoomId, UserId},
    resolver::{self, Resolution},
    store::EventStore,
};

/// One joined room and its derived state.
#[derive(Debug, Clone)]
pub struct Room {
    id: RoomId,
    display_name: String,
    members: HashSet<UserId>,
    store: EventStore,
    resolution: Resolution,
    backfill_in_flight: bool,
    history_exhausted: bool,
}

impl Room {
    /// Create a room with an empty timeline.
    pub fn new(
        id: RoomId,
        display_name: impl Into<String>,
        members: impl IntoIterator<Item = UserId>,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            members: members.into_iter().collect(),
            store: EventStore::new(),
            resolution: Resolution::default(),
            backfill_in_flight: false,
            history_exhausted: false,
        }
    }

    /// Room identifier.
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Human-readable name. Falls back to the id when blank.
    pub fn display_name(&self) -> &str {
        if self.display_name.trim().is_empty() { self.id.as_str() } else { &self.display_name }
    }

    /// Current members.
    pub fn members(&self) -> &HashSet<UserId> {
        &self.members
    }

    /// Underlying timeline.
    pub fn store(&self) -> &EventStore {
        &self.store
    }

    /// Derived indices for the current timeline.
    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    /// Look up a loaded event.
    pub fn event(&self, id: &EventId) -> Option<&Event> {
        self.store.get(id)
    }

    /// Canonical messages in timeline order.
    pub fn canonical_messages(&self) -> impl Iterator<Item = &Event> {
        self.resolution.canonical().iter().filter_map(|id| self.store.get(id))
    }

    /// Latest canonical message.
    pub fn last_canonical(&self) -> Option<&Event> {
        self.resolution.canonical().last().and_then(|id| self.store.get(id))
    }

    /// Timestamp of the latest canonical message, the room's recency key.
    pub fn latest_timestamp(&self) -> Option<u64> {
        self.resolution.latest_canonical_ts()
    }

    /// Seed the timeline with the backlog delivered at join time.
    ///
    /// Initial backlog is history: membership events in it do not change the
    /// member set reported by the transport.
    pub fn seed(&mut self, backlog: impl IntoIterator<Item = Event>) -> usize {
        let inserted = self.store.append(backlog);
        self.recompute();
        inserted
    }

    /// Append live events. Returns the number inserted.
    ///
    /// The inserted events are the last `n` of [`Room::store`]. Membership
    /// events among them update the member set.
    pub fn append(&mut self, batch: impl IntoIterator<Item = Event>) -> usize {
        let inserted = self.store.append(batch);
        let skip = self.store.len() - inserted;
        for event in self.store.iter().skip(skip) {
            if let Content::Membership { user_id, membership, .. } = &event.content {
                if membership.is_member() {
                    self.members.insert(user_id.clone());
                } else {
                    self.members.remove(user_id);
                }
            }
        }
        self.recompute();
        inserted
    }

    /// Events inserted by the last append of `n` events.
    pub fn newest(&self, n: usize) -> impl Iterator<Item = &Event> {
        self.store.iter().skip(self.store.len().saturating_sub(n))
    }

    /// Prepend older events fetched by pagination.
    ///
    /// Clears the in-flight flag. Zero new events marks history exhausted.
    pub fn backfill(&mut self, batch: impl IntoIterator<Item = Event>) -> usize {
        self.backfill_in_flight = false;
        let inserted = self.store.backfill(batch);
        if inserted == 0 {
            tracing::debug!(room_id = %self.id, "backfill returned nothing new, history exhausted");
            self.history_exhausted = true;
        }
        self.recompute();
        inserted
    }

    /// True if another page may be requested now.
    pub fn can_backfill(&self) -> bool {
        !self.backfill_in_flight && !self.history_exhausted
    }

    /// Record that a page request was issued.
    pub fn mark_backfill_started(&mut self) {
        self.backfill_in_flight = true;
    }

    /// Record that the page request failed; the window is unchanged and the
    /// request may be retried.
    pub fn mark_backfill_failed(&mut self) {
        self.backfill_in_flight = false;
    }

    /// A page request is outstanding.
    pub fn backfill_in_flight(&self) -> bool {
        self.backfill_in_flight
    }

    /// Pagination reached the start of the room.
    pub fn history_exhausted(&self) -> bool {
        self.history_exhausted
    }

    fn recompute(&mut self) {
        self.resolution = resolver::resolve(&self.store);
        tracing::debug!(
            room_id = %self.id,
            events = self.store.len(),
            canonical = self.resolution.canonical().len(),
            "recomputed room"
        );
    }
}
