//! Scripted in-memory transport.
//!
//! `SimTransport` implements [`Transport`] over shared state that tests
//! script from outside the runtime: joined rooms, per-room history served by
//! pagination, a queue of live events, and one-shot failures for each
//! operation. Clones share the same state, so a test keeps one handle while
//! the [`chatfold_app::Runtime`] owns another.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chatfold_app::{JoinedRoom, Transport};
use chatfold_core::{Event, EventId, RoomId, UserId};

/// Error returned by the simulated transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimTransportError {
    /// Failure injected by the test.
    #[error("injected failure: {0}")]
    Injected(String),

    /// Pagination for a room the transport has no history for.
    #[error("no history for room {0}")]
    UnknownRoom(RoomId),
}

/// One queued item on the live subscription.
#[derive(Debug, Clone)]
enum Live {
    Event(RoomId, Event),
    Error(String),
}

/// Shared state for injection.
///
/// This allows injection from outside async contexts.
#[derive(Debug, Default)]
struct SharedState {
    rooms: Vec<JoinedRoom>,
    /// Full chronological history per room, served by pagination.
    history: HashMap<RoomId, Vec<Event>>,
    live: VecDeque<Live>,
    fail_joined_rooms: Option<String>,
    fail_paginate: VecDeque<String>,
    fail_send: VecDeque<String>,
    /// Queue sent messages as live events, as a homeserver would.
    echo_sends: bool,
    local_user: Option<UserId>,
    /// Latest timestamp handed out or queued, in milliseconds.
    last_ts: u64,
    sent: Vec<(RoomId, String)>,
    paginations: Vec<(RoomId, Option<EventId>, usize)>,
}

/// Simulated transport for deterministic testing.
///
/// An empty live queue reads as a closed subscription.
#[derive(Debug, Clone, Default)]
pub struct SimTransport {
    state: Arc<Mutex<SharedState>>,
}

impl SimTransport {
    /// Create a transport with no rooms.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a joined room.
    ///
    /// `history` is the room's full chronological timeline. The room's
    /// backlog should be a suffix of it so pagination can continue from the
    /// earliest backlog event.
    pub fn add_room(&self, room: JoinedRoom, history: Vec<Event>) {
        let mut state = self.state();
        let latest = history.iter().map(|event| event.timestamp_ms).max().unwrap_or(0);
        state.last_ts = state.last_ts.max(latest);
        state.history.insert(room.room_id.clone(), history);
        state.rooms.push(room);
    }

    /// Queue a live event.
    pub fn push_live(&self, room_id: impl Into<RoomId>, event: Event) {
        let mut state = self.state();
        state.last_ts = state.last_ts.max(event.timestamp_ms);
        state.live.push_back(Live::Event(room_id.into(), event));
    }

    /// Queue a subscription error.
    pub fn push_live_error(&self, reason: impl Into<String>) {
        self.state().live.push_back(Live::Error(reason.into()));
    }

    /// Fail the next room list request.
    pub fn fail_joined_rooms(&self, reason: impl Into<String>) {
        self.state().fail_joined_rooms = Some(reason.into());
    }

    /// Fail the next pagination request.
    pub fn fail_next_paginate(&self, reason: impl Into<String>) {
        self.state().fail_paginate.push_back(reason.into());
    }

    /// Fail the next send.
    pub fn fail_next_send(&self, reason: impl Into<String>) {
        self.state().fail_send.push_back(reason.into());
    }

    /// Echo successful sends back on the live queue, authored by `local_user`.
    pub fn echo_sends_as(&self, local_user: impl Into<UserId>) {
        let mut state = self.state();
        state.echo_sends = true;
        state.local_user = Some(local_user.into());
    }

    /// Messages sent so far, in order.
    pub fn sent(&self) -> Vec<(RoomId, String)> {
        self.state().sent.clone()
    }

    /// Pagination requests received so far, in order.
    pub fn paginations(&self) -> Vec<(RoomId, Option<EventId>, usize)> {
        self.state().paginations.clone()
    }

    /// Number of queued live items.
    pub fn pending_live(&self) -> usize {
        self.state().live.len()
    }
}

impl Transport for SimTransport {
    type Error = SimTransportError;

    async fn joined_rooms(&mut self) -> Result<Vec<JoinedRoom>, Self::Error> {
        let mut state = self.state();
        match state.fail_joined_rooms.take() {
            Some(reason) => Err(SimTransportError::Injected(reason)),
            None => Ok(state.rooms.clone()),
        }
    }

    async fn next_event(&mut self) -> Result<Option<(RoomId, Event)>, Self::Error> {
        match self.state().live.pop_front() {
            Some(Live::Event(room_id, event)) => Ok(Some((room_id, event))),
            Some(Live::Error(reason)) => Err(SimTransportError::Injected(reason)),
            None => Ok(None),
        }
    }

    async fn paginate(
        &mut self,
        room_id: &RoomId,
        before: Option<&EventId>,
        limit: usize,
    ) -> Result<Vec<Event>, Self::Error> {
        let mut state = self.state();
        state.paginations.push((room_id.clone(), before.cloned(), limit));
        if let Some(reason) = state.fail_paginate.pop_front() {
            tracing::debug!(%room_id, %reason, "injected pagination failure");
            return Err(SimTransportError::Injected(reason));
        }

        let history = state
            .history
            .get(room_id)
            .ok_or_else(|| SimTransportError::UnknownRoom(room_id.clone()))?;
        let end = before
            .and_then(|id| history.iter().position(|event| &event.id == id))
            .unwrap_or(history.len());
        Ok(history[end.saturating_sub(limit)..end].to_vec())
    }

    async fn send(&mut self, room_id: &RoomId, text: &str) -> Result<EventId, Self::Error> {
        let mut state = self.state();
        if let Some(reason) = state.fail_send.pop_front() {
            tracing::debug!(%room_id, %reason, "injected send failure");
            return Err(SimTransportError::Injected(reason));
        }

        state.sent.push((room_id.clone(), text.to_owned()));
        let event_id = EventId::new(format!("$sent{}", state.sent.len()));
        if state.echo_sends {
            let sender = state.local_user.clone().unwrap_or_else(|| UserId::new(""));
            state.last_ts += 1;
            let ts = state.last_ts;
            let event = Event::message(event_id.clone(), room_id.clone(), sender, ts, text);
            state.live.push_back(Live::Event(room_id.clone(), event));
        }
        Ok(event_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(room: &str, count: usize) -> Vec<Event> {
        (0..count)
            .map(|i| Event::message(format!("${i}"), room, "@bob:x", i as u64, format!("m{i}")))
            .collect()
    }

    #[tokio::test]
    async fn paginate_serves_pages_older_than_cursor() {
        let mut transport = SimTransport::new();
        transport.add_room(JoinedRoom::new("!a", "A"), history("!a", 5));
        let room = RoomId::new("!a");

        let page = transport.paginate(&room, Some(&EventId::new("$3")), 2).await.unwrap();
        let ids: Vec<&str> = page.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["$1", "$2"]);

        let page = transport.paginate(&room, Some(&EventId::new("$0")), 2).await.unwrap();
        assert!(page.is_empty());

        let page = transport.paginate(&room, None, 10).await.unwrap();
        assert_eq!(page.len(), 5);
    }

    #[tokio::test]
    async fn injected_failures_are_one_shot() {
        let mut transport = SimTransport::new();
        transport.add_room(JoinedRoom::new("!a", "A"), history("!a", 1));
        transport.fail_next_send("offline");

        let room = RoomId::new("!a");
        assert_eq!(
            transport.send(&room, "hi").await,
            Err(SimTransportError::Injected("offline".into()))
        );
        assert_eq!(transport.send(&room, "hi").await, Ok(EventId::new("$sent1")));
        assert_eq!(transport.sent(), [(room, "hi".to_owned())]);
    }

    #[tokio::test]
    async fn echoed_send_arrives_on_subscription() {
        let mut transport = SimTransport::new();
        transport.add_room(JoinedRoom::new("!a", "A"), Vec::new());
        transport.echo_sends_as("@me:x");

        let room = RoomId::new("!a");
        transport.send(&room, "hello").await.unwrap();

        let (room_id, event) = transport.next_event().await.unwrap().unwrap();
        assert_eq!(room_id, room);
        assert_eq!(event.sender, UserId::new("@me:x"));
        assert_eq!(transport.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn paginate_unknown_room_fails() {
        let mut transport = SimTransport::new();
        let result = transport.paginate(&RoomId::new("!nope"), None, 10).await;
        assert_eq!(result, Err(SimTransportError::UnknownRoom(RoomId::new("!nope"))));
    }
}
