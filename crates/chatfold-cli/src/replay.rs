//! Replay transport over a recorded event log.
//!
//! The log is JSON lines. Each line is one of:
//!
//! - a room header: `{"room": {"id": "!a:x", "name": "Family", "members": [...]}}`
//! - the live marker `{"live": true}`
//! - a protocol event carrying its own `room_id`
//!
//! Events before the live marker are history: the newest `initial` of each
//! room form the backlog delivered with the room list, older ones are served
//! by pagination. Events after the marker are delivered one at a time on the
//! subscription. Lines that fail to decode are logged and skipped.

use std::{
    collections::{HashMap, VecDeque},
    io::BufRead,
};

use chatfold_app::{JoinedRoom, Transport};
use chatfold_core::{Event, EventId, RoomId, UserId, wire};
use serde::Deserialize;
use serde_json::Value;

/// Error returned by the replay transport.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// Pagination for a room that is not in the log.
    #[error("room {0} is not in the log")]
    UnknownRoom(RoomId),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RoomHeader {
    id: RoomId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    members: Vec<UserId>,
}

#[derive(Debug)]
struct ReplayRoom {
    name: String,
    members: Vec<UserId>,
    history: Vec<Event>,
}

/// Transport replaying a recorded log.
#[derive(Debug)]
pub struct ReplayTransport {
    /// Room ids in first-seen order.
    order: Vec<RoomId>,
    rooms: HashMap<RoomId, ReplayRoom>,
    live: VecDeque<Event>,
    initial: usize,
    local_user: UserId,
    sent: usize,
    skipped: usize,
}

impl ReplayTransport {
    /// Parse a log.
    ///
    /// `initial` is the backlog size per room. Sent messages are echoed back
    /// on the subscription as authored by `local_user`.
    pub fn from_reader(
        reader: impl BufRead,
        initial: usize,
        local_user: UserId,
    ) -> std::io::Result<Self> {
        let mut replay = Self {
            order: Vec::new(),
            rooms: HashMap::new(),
            live: VecDeque::new(),
            initial,
            local_user,
            sent: 0,
            skipped: 0,
        };

        let mut live = false;
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = index + 1;
            if line.trim().is_empty() {
                continue;
            }

            let value: Value = match serde_json::from_str(&line) {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(line_no, %err, "skipping line that is not JSON");
                    replay.skipped += 1;
                    continue;
                },
            };

            if let Some(header) = value.get("room") {
                match RoomHeader::deserialize(header) {
                    Ok(header) => replay.add_header(header),
                    Err(err) => {
                        tracing::warn!(line_no, %err, "skipping malformed room header");
                        replay.skipped += 1;
                    },
                }
                continue;
            }
            if value.get("live").and_then(Value::as_bool) == Some(true) {
                live = true;
                continue;
            }

            match wire::decode_room_event(value) {
                Ok(event) if live => {
                    replay.room_entry(&event.room_id);
                    replay.live.push_back(event);
                },
                Ok(event) => replay.room_entry(&event.room_id).history.push(event),
                Err(err) => {
                    tracing::warn!(line_no, %err, "skipping malformed event");
                    replay.skipped += 1;
                },
            }
        }

        tracing::info!(
            rooms = replay.order.len(),
            live = replay.live.len(),
            skipped = replay.skipped,
            "event log loaded"
        );
        Ok(replay)
    }

    fn add_header(&mut self, header: RoomHeader) {
        let room = self.room_entry(&header.id);
        if let Some(name) = header.name {
            room.name = name;
        }
        room.members = header.members;
    }

    fn room_entry(&mut self, room_id: &RoomId) -> &mut ReplayRoom {
        if !self.rooms.contains_key(room_id) {
            self.order.push(room_id.clone());
        }
        self.rooms.entry(room_id.clone()).or_insert_with(|| ReplayRoom {
            name: room_id.to_string(),
            members: Vec::new(),
            history: Vec::new(),
        })
    }

    /// Number of lines skipped as malformed.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl Transport for ReplayTransport {
    type Error = ReplayError;

    async fn joined_rooms(&mut self) -> Result<Vec<JoinedRoom>, Self::Error> {
        let rooms = self
            .order
            .iter()
            .filter_map(|id| self.rooms.get(id).map(|room| (id, room)))
            .map(|(id, room)| {
                let start = room.history.len().saturating_sub(self.initial);
                JoinedRoom::new(id.clone(), room.name.clone())
                    .with_members(room.members.iter().cloned())
                    .with_backlog(room.history[start..].to_vec())
            })
            .collect();
        Ok(rooms)
    }

    async fn next_event(&mut self) -> Result<Option<(RoomId, Event)>, Self::Error> {
        Ok(self.live.pop_front().map(|event| (event.room_id.clone(), event)))
    }

    async fn paginate(
        &mut self,
        room_id: &RoomId,
        before: Option<&EventId>,
        limit: usize,
    ) -> Result<Vec<Event>, Self::Error> {
        let room =
            self.rooms.get(room_id).ok_or_else(|| ReplayError::UnknownRoom(room_id.clone()))?;
        let end = before
            .and_then(|id| room.history.iter().position(|event| &event.id == id))
            .unwrap_or(room.history.len());
        Ok(room.history[end.saturating_sub(limit)..end].to_vec())
    }

    async fn send(&mut self, room_id: &RoomId, text: &str) -> Result<EventId, Self::Error> {
        self.sent += 1;
        let event_id = EventId::new(format!("$local{}", self.sent));
        let ts = self
            .rooms
            .get(room_id)
            .and_then(|room| room.history.last())
            .into_iter()
            .chain(self.live.iter())
            .map(|event| event.timestamp_ms)
            .max()
            .map_or(0, |latest| latest + 1);
        let event =
            Event::message(event_id.clone(), room_id.clone(), self.local_user.clone(), ts, text);
        self.live.push_back(event);
        Ok(event_id)
    }
}
