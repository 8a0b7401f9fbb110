//! Per-room event timeline.
//!
//! Events arrive through two channels: live push appends to the tail and
//! pagination prepends older history. Both paths deduplicate by
//! [`EventId`], so an event delivered twice is only held once.
//!
//! Positions are tracked as absolute sequence numbers that never change once
//! assigned; prepending only moves `front_seq` down. Lookup by id is O(1).

use std::collections::{HashMap, HashSet, VecDeque};

use crate::event::{Event, EventId};

/// Ordered, deduplicated event log for one room.
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    /// Events in timeline order.
    events: VecDeque<Event>,
    /// Absolute sequence number of each held event.
    positions: HashMap<EventId, i64>,
    /// Sequence number of `events[0]`.
    front_seq: i64,
    /// Redactions whose target is not loaded yet.
    pending_redactions: HashSet<EventId>,
}

impl EventStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add newer events to the tail, in batch order.
    ///
    /// Events whose id is already held (or appears earlier in the same batch)
    /// are dropped. Returns how many events were inserted; they are the last
    /// `n` events of [`EventStore::iter`].
    pub fn append(&mut self, batch: impl IntoIterator<Item = Event>) -> usize {
        let mut inserted = 0;
        for event in batch {
            if !self.admit(&event) {
                continue;
            }
            let seq = self.front_seq + self.events.len() as i64;
            self.insert(event, seq, |events, event| events.push_back(event));
            inserted += 1;
        }
        inserted
    }

    /// Insert older events before the current earliest event.
    ///
    /// `batch` is chronological: its last event ends up directly before the
    /// previously earliest one. Returns how many genuinely new events were
    /// inserted; zero means the start of history (or nothing new) was reached.
    /// They are the first `n` events of [`EventStore::iter`].
    pub fn backfill(&mut self, batch: impl IntoIterator<Item = Event>) -> usize {
        let batch: Vec<Event> = batch.into_iter().collect();
        let mut inserted = 0;
        for event in batch.into_iter().rev() {
            if !self.admit(&event) {
                continue;
            }
            self.front_seq -= 1;
            let seq = self.front_seq;
            self.insert(event, seq, |events, event| events.push_front(event));
            inserted += 1;
        }
        inserted
    }

    /// Look up an event by id.
    pub fn get(&self, id: &EventId) -> Option<&Event> {
        let seq = *self.positions.get(id)?;
        self.events.get((seq - self.front_seq) as usize)
    }

    /// True if an event with this id is held.
    pub fn contains(&self, id: &EventId) -> bool {
        self.positions.contains_key(id)
    }

    /// Id of the earliest held event, used as the pagination anchor.
    pub fn earliest_id(&self) -> Option<&EventId> {
        self.events.front().map(|e| &e.id)
    }

    /// Most recent event.
    pub fn latest(&self) -> Option<&Event> {
        self.events.back()
    }

    /// Number of held events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if no events are held.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events in timeline order.
    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, Event> {
        self.events.iter()
    }

    /// Number of redactions waiting for their target to be loaded.
    pub fn pending_redactions(&self) -> usize {
        self.pending_redactions.len()
    }

    fn admit(&self, event: &Event) -> bool {
        if event.id.is_empty() {
            tracing::warn!(
                room_id = %event.room_id,
                sender = %event.sender,
                "dropping event without id"
            );
            return false;
        }
        !self.positions.contains_key(&event.id)
    }

    fn insert(
        &mut self,
        mut event: Event,
        seq: i64,
        place: impl FnOnce(&mut VecDeque<Event>, Event),
    ) {
        // Read the target first: a redacted redaction still took effect.
        let redacts = event.redacts().cloned();
        if self.pending_redactions.remove(&event.id) {
            event.redact();
        }
        self.positions.insert(event.id.clone(), seq);
        place(&mut self.events, event);

        if let Some(target) = redacts {
            self.apply_redaction(target);
        }
    }

    fn apply_redaction(&mut self, target: EventId) {
        match self.positions.get(&target) {
            Some(&seq) => {
                let index = (seq - self.front_seq) as usize;
                if let Some(event) = self.events.get_mut(index) {
                    event.redact();
                }
            },
            None => {
                tracing::debug!(%target, "redaction target not loaded, deferring");
                self.pending_redactions.insert(target);
            },
        }
    }
}

impl<'a> IntoIterator for &'a EventStore {
    type Item = &'a Event;
    type IntoIter = std::collections::vec_deque::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
