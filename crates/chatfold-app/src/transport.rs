//! Transport trait for abstracting the chat protocol client.
//!
//! The [`Transport`] trait decouples the runtime from the network client that
//! talks to the homeserver. Production wraps a real client; simulation and
//! replay feed recorded or scripted events. The generic
//! [`crate::Runtime`] handles all orchestration.

use std::future::Future;

use chatfold_core::{Event, EventId, RoomId, UserId};

/// A room reported joined by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedRoom {
    /// Room identifier.
    pub room_id: RoomId,
    /// Human-readable name.
    pub display_name: String,
    /// Current members.
    pub members: Vec<UserId>,
    /// Most recent events, chronological.
    pub backlog: Vec<Event>,
}

impl JoinedRoom {
    /// A joined room with no members and no backlog.
    pub fn new(room_id: impl Into<RoomId>, display_name: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            display_name: display_name.into(),
            members: Vec::new(),
            backlog: Vec::new(),
        }
    }

    /// Set the member list.
    #[must_use]
    pub fn with_members(mut self, members: impl IntoIterator<Item = impl Into<UserId>>) -> Self {
        self.members = members.into_iter().map(Into::into).collect();
        self
    }

    /// Set the initial backlog.
    #[must_use]
    pub fn with_backlog(mut self, backlog: Vec<Event>) -> Self {
        self.backlog = backlog;
        self
    }
}

/// Abstracts the chat protocol client.
///
/// Implementations deliver already-decoded events. Retry and backoff are the
/// implementation's concern; errors returned here are reported to the user
/// and the operation may be retried by the user.
///
/// # Implementations
///
/// - **Replay**: reads a recorded event log (the `chatfold` binary)
/// - **Simulation**: scripted in-memory transport with injectable failures
pub trait Transport: Send {
    /// Transport-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Rooms the account has joined, with their initial backlog.
    fn joined_rooms(&mut self) -> impl Future<Output = Result<Vec<JoinedRoom>, Self::Error>> + Send;

    /// Next live event.
    ///
    /// Returns `None` once the subscription is closed.
    fn next_event(
        &mut self,
    ) -> impl Future<Output = Result<Option<(RoomId, Event)>, Self::Error>> + Send;

    /// Fetch up to `limit` events older than `before`, chronological.
    ///
    /// An empty result means the start of the room was reached.
    fn paginate(
        &mut self,
        room_id: &RoomId,
        before: Option<&EventId>,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send;

    /// Send a text message. Returns the id assigned to it.
    fn send(
        &mut self,
        room_id: &RoomId,
        text: &str,
    ) -> impl Future<Output = Result<EventId, Self::Error>> + Send;
}
