//! Facade input events.
//!
//! [`FacadeEvent`] is the complete set of inputs that drive the
//! [`crate::ChatFacade`] besides direct user operations. Events come from
//! three sources:
//! - Subscription and room-list notifications from the transport.
//! - Completions of actions the facade asked the runtime to perform.
//! - Clock ticks from the runtime's environment.

use chatfold_core::{ChatError, Event, EventId, RoomId};

use crate::JoinedRoom;

/// Events processed by the facade state machine.
///
/// `I` is the environment's instant type.
#[derive(Debug, Clone)]
pub enum FacadeEvent<I> {
    /// Initial room list after login.
    RoomsListed {
        /// Every joined room with its initial backlog.
        rooms: Vec<JoinedRoom>,
    },

    /// A room was joined during the session.
    RoomJoined {
        /// The new room.
        room: JoinedRoom,
    },

    /// Live event pushed by the subscription.
    LiveEvent {
        /// Room the event was delivered for.
        room_id: RoomId,
        /// The event.
        event: Event,
    },

    /// A backfill request returned.
    BackfillCompleted {
        /// Room the request was issued for.
        room_id: RoomId,
        /// Older events, chronological.
        events: Vec<Event>,
    },

    /// A backfill request failed.
    BackfillFailed {
        /// Room the request was issued for.
        room_id: RoomId,
        /// Cause.
        error: ChatError,
    },

    /// The transport acknowledged a sent message.
    SendCompleted {
        /// Destination room.
        room_id: RoomId,
        /// Id assigned to the message.
        event_id: EventId,
    },

    /// Sending failed.
    SendFailed {
        /// Destination room.
        room_id: RoomId,
        /// Cause.
        error: ChatError,
    },

    /// Clock tick.
    Tick {
        /// Current time.
        now: I,
    },

    /// The subscription reported an error.
    TransportError {
        /// Cause.
        error: ChatError,
    },
}
