//! Facade side-effects.
//!
//! [`FacadeAction`]s are instructions produced by the [`crate::ChatFacade`]
//! for the runtime to execute against the transport. Results come back as
//! [`crate::FacadeEvent`]s.

use chatfold_core::{EventId, RoomId};

/// Actions produced by the facade state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacadeAction {
    /// Request older history for a room.
    Backfill {
        /// Room to paginate.
        room_id: RoomId,
        /// Earliest loaded event, the pagination anchor. `None` for an empty
        /// timeline.
        before: Option<EventId>,
        /// Maximum number of events to fetch.
        limit: usize,
    },

    /// Send a text message.
    SendMessage {
        /// Destination room.
        room_id: RoomId,
        /// Message text, trimmed.
        text: String,
    },

    /// Derived state changed; presentation should re-read it.
    Render,
}
