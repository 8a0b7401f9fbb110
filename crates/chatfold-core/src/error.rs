//! Error types for the chatfold core.
//!
//! A dangling relation (a target id that is not loaded) is deliberately not
//! represented here: partial windows are the normal case and are handled by
//! the resolver's omission rules.

use thiserror::Error;

use crate::event::{EventId, RoomId};

/// Errors surfaced by the core and the facade built on top of it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// Subscription, pagination or send failed at the transport.
    #[error("transport unavailable: {0}")]
    TransportUnavailable(String),

    /// Event could not be decoded or lacks a required field.
    #[error("malformed event {}: {reason}", display_id(.event_id))]
    MalformedEvent {
        /// Identifier of the offending event, if it had one.
        event_id: Option<EventId>,
        /// What was wrong with it.
        reason: String,
    },

    /// Operation requires a selected room.
    #[error("no room selected")]
    NoRoomSelected,

    /// Room is not among the joined rooms.
    #[error("unknown room: {0}")]
    UnknownRoom(RoomId),

    /// Message text is empty after trimming.
    #[error("message is empty")]
    EmptyMessage,
}

impl ChatError {
    /// Returns true if this error is transient and may succeed on retry.
    ///
    /// Only transport failures qualify. Malformed input and invalid
    /// operations fail the same way every time.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransportUnavailable(_))
    }

    /// Shorthand for a [`ChatError::MalformedEvent`].
    pub fn malformed(event_id: Option<EventId>, reason: impl Into<String>) -> Self {
        Self::MalformedEvent { event_id, reason: reason.into() }
    }
}

fn display_id(event_id: &Option<EventId>) -> &str {
    event_id.as_ref().map_or("<unknown>", EventId::as_str)
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::malformed(None, err.to_string())
    }
}
