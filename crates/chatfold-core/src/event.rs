//! Chat event value types.
//!
//! An [`Event`] is one record in a room timeline. Events are immutable once
//! observed; the only later change is the redaction flag flip performed by
//! the [`crate::EventStore`].

use std::{borrow::Borrow, fmt};

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an opaque identifier string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// True if the identifier is the empty string.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Opaque event identifier, unique within a room and stable across
    /// live push and pagination.
    EventId
);

string_id!(
    /// Opaque room identifier.
    RoomId
);

string_id!(
    /// Opaque user identifier.
    UserId
);

/// Protocol event type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// `m.room.message`
    Message,
    /// `m.sticker`
    Sticker,
    /// `m.room.member`
    Membership,
    /// `m.reaction`
    Reaction,
    /// `m.room.redaction`
    Redaction,
    /// Any other type. Carried so reply targets still resolve, never shown.
    Unknown(String),
}

impl EventKind {
    /// Map an upstream type string to a kind.
    pub fn from_type(event_type: &str) -> Self {
        match event_type {
            "m.room.message" => Self::Message,
            "m.sticker" => Self::Sticker,
            "m.room.member" => Self::Membership,
            "m.reaction" => Self::Reaction,
            "m.room.redaction" => Self::Redaction,
            other => Self::Unknown(other.to_owned()),
        }
    }

    /// Upstream type string for this kind.
    pub fn as_type(&self) -> &str {
        match self {
            Self::Message => "m.room.message",
            Self::Sticker => "m.sticker",
            Self::Membership => "m.room.member",
            Self::Reaction => "m.reaction",
            Self::Redaction => "m.room.redaction",
            Self::Unknown(other) => other,
        }
    }
}

/// Message sub-type (`msgtype`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MsgType {
    /// `m.text`
    Text,
    /// `m.notice`
    Notice,
    /// `m.emote`
    Emote,
    /// `m.image`
    Image,
    /// `m.audio`
    Audio,
    /// `m.video`
    Video,
    /// `m.file`
    File,
    /// Anything else.
    Other(String),
}

impl MsgType {
    /// Map an upstream `msgtype` string.
    pub fn from_msgtype(msgtype: &str) -> Self {
        match msgtype {
            "m.text" => Self::Text,
            "m.notice" => Self::Notice,
            "m.emote" => Self::Emote,
            "m.image" => Self::Image,
            "m.audio" => Self::Audio,
            "m.video" => Self::Video,
            "m.file" => Self::File,
            other => Self::Other(other.to_owned()),
        }
    }
}

/// Body of a message or of an edit's replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent {
    /// Message sub-type.
    pub msgtype: MsgType,
    /// Plain-text body.
    pub body: String,
}

impl MessageContent {
    /// Plain text message content.
    pub fn text(body: impl Into<String>) -> Self {
        Self { msgtype: MsgType::Text, body: body.into() }
    }
}

/// Membership state carried by a membership event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Membership {
    /// Joined the room.
    Join,
    /// Left (or was kicked from) the room.
    Leave,
    /// Was invited.
    Invite,
    /// Was banned.
    Ban,
    /// Asked to join.
    Knock,
}

impl Membership {
    /// Map an upstream `membership` string. `None` for unrecognized values.
    pub fn from_str_opt(membership: &str) -> Option<Self> {
        match membership {
            "join" => Some(Self::Join),
            "leave" => Some(Self::Leave),
            "invite" => Some(Self::Invite),
            "ban" => Some(Self::Ban),
            "knock" => Some(Self::Knock),
            _ => None,
        }
    }

    /// Whether a user in this state counts as a room member.
    pub fn is_member(self) -> bool {
        matches!(self, Self::Join | Self::Invite)
    }
}

/// Type-dependent event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Message body.
    Message(MessageContent),
    /// Sticker with its fallback description.
    Sticker {
        /// Fallback text.
        body: String,
    },
    /// Membership change for `user_id`.
    Membership {
        /// User whose membership changed.
        user_id: UserId,
        /// New membership state.
        membership: Membership,
        /// Display name at the time of the change.
        display_name: Option<String>,
    },
    /// Redaction of another event.
    Redaction {
        /// Event being redacted.
        redacts: EventId,
    },
    /// No payload (reactions, or content blanked by redaction).
    Empty,
}

/// Typed reference from one event to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
    /// This event edits `target`.
    ///
    /// An edit with no `new_content` still hides the edit event itself but
    /// leaves the target unchanged.
    Replace {
        /// Edited event.
        target: EventId,
        /// Content that supersedes the target's.
        new_content: Option<MessageContent>,
    },
    /// This event replies to `target`.
    ReplyTo {
        /// Event replied to.
        target: EventId,
    },
    /// This event reacts to `target` with glyph `key`.
    Annotation {
        /// Event reacted to.
        target: EventId,
        /// Reaction glyph.
        key: String,
    },
}

impl Relation {
    /// Event this relation points at.
    pub fn target(&self) -> &EventId {
        match self {
            Self::Replace { target, .. }
            | Self::ReplyTo { target }
            | Self::Annotation { target, .. } => target,
        }
    }

    /// True for [`Relation::Replace`].
    pub fn is_replace(&self) -> bool {
        matches!(self, Self::Replace { .. })
    }
}

/// One record in a room timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Stable event identifier.
    pub id: EventId,
    /// Room the event belongs to.
    pub room_id: RoomId,
    /// Author of the event.
    pub sender: UserId,
    /// Origin timestamp in milliseconds.
    pub timestamp_ms: u64,
    /// Protocol event type.
    pub kind: EventKind,
    /// Type-dependent payload.
    pub content: Content,
    /// Optional relation to another event.
    pub relation: Option<Relation>,
    /// Content has been withdrawn.
    pub redacted: bool,
}

impl Event {
    /// Plain text message.
    pub fn message(
        id: impl Into<EventId>,
        room_id: impl Into<RoomId>,
        sender: impl Into<UserId>,
        timestamp_ms: u64,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            room_id: room_id.into(),
            sender: sender.into(),
            timestamp_ms,
            kind: EventKind::Message,
            content: Content::Message(MessageContent::text(body)),
            relation: None,
            redacted: false,
        }
    }

    /// Edit of `target` replacing its content with `body`.
    pub fn edit(
        id: impl Into<EventId>,
        room_id: impl Into<RoomId>,
        sender: impl Into<UserId>,
        timestamp_ms: u64,
        target: impl Into<EventId>,
        body: impl Into<String>,
    ) -> Self {
        let body = body.into();
        let mut event = Self::message(id, room_id, sender, timestamp_ms, format!("* {body}"));
        let new_content = Some(MessageContent::text(body));
        event.relation = Some(Relation::Replace { target: target.into(), new_content });
        event
    }

    /// Reply to `target` with `body`.
    pub fn reply(
        id: impl Into<EventId>,
        room_id: impl Into<RoomId>,
        sender: impl Into<UserId>,
        timestamp_ms: u64,
        target: impl Into<EventId>,
        body: impl Into<String>,
    ) -> Self {
        Self::message(id, room_id, sender, timestamp_ms, body)
            .with_relation(Relation::ReplyTo { target: target.into() })
    }

    /// Reaction `key` on `target`.
    pub fn reaction(
        id: impl Into<EventId>,
        room_id: impl Into<RoomId>,
        sender: impl Into<UserId>,
        timestamp_ms: u64,
        target: impl Into<EventId>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            room_id: room_id.into(),
            sender: sender.into(),
            timestamp_ms,
            kind: EventKind::Reaction,
            content: Content::Empty,
            relation: Some(Relation::Annotation { target: target.into(), key: key.into() }),
            redacted: false,
        }
    }

    /// Sticker with fallback text `body`.
    pub fn sticker(
        id: impl Into<EventId>,
        room_id: impl Into<RoomId>,
        sender: impl Into<UserId>,
        timestamp_ms: u64,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            room_id: room_id.into(),
            sender: sender.into(),
            timestamp_ms,
            kind: EventKind::Sticker,
            content: Content::Sticker { body: body.into() },
            relation: None,
            redacted: false,
        }
    }

    /// Membership change of `user_id`, sent by `sender`.
    pub fn membership(
        id: impl Into<EventId>,
        room_id: impl Into<RoomId>,
        sender: impl Into<UserId>,
        timestamp_ms: u64,
        user_id: impl Into<UserId>,
        membership: Membership,
    ) -> Self {
        Self {
            id: id.into(),
            room_id: room_id.into(),
            sender: sender.into(),
            timestamp_ms,
            kind: EventKind::Membership,
            content: Content::Membership {
                user_id: user_id.into(),
                membership,
                display_name: None,
            },
            relation: None,
            redacted: false,
        }
    }

    /// Redaction of `redacts`.
    pub fn redaction(
        id: impl Into<EventId>,
        room_id: impl Into<RoomId>,
        sender: impl Into<UserId>,
        timestamp_ms: u64,
        redacts: impl Into<EventId>,
    ) -> Self {
        Self {
            id: id.into(),
            room_id: room_id.into(),
            sender: sender.into(),
            timestamp_ms,
            kind: EventKind::Redaction,
            content: Content::Redaction { redacts: redacts.into() },
            relation: None,
            redacted: false,
        }
    }

    /// Attach a relation.
    #[must_use]
    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relation = Some(relation);
        self
    }

    /// Mark as already redacted upstream.
    #[must_use]
    pub fn into_redacted(mut self) -> Self {
        self.redact();
        self
    }

    /// Flip the redaction flag and blank the content.
    ///
    /// The relation is kept so the event keeps its place in derived indices.
    pub fn redact(&mut self) {
        self.redacted = true;
        self.content = Content::Empty;
    }

    /// Event this one redacts, for redaction events.
    pub fn redacts(&self) -> Option<&EventId> {
        match (&self.kind, &self.content) {
            (EventKind::Redaction, Content::Redaction { redacts }) => Some(redacts),
            _ => None,
        }
    }

    /// True if this event carries an edit relation.
    pub fn is_edit(&self) -> bool {
        self.relation.as_ref().is_some_and(Relation::is_replace)
    }

    /// Eligible for direct display in the message list.
    ///
    /// Messages, stickers and membership changes, excluding edit events
    /// (absorbed into the edit index) and reactions.
    pub fn is_canonical(&self) -> bool {
        matches!(self.kind, EventKind::Message | EventKind::Sticker | EventKind::Membership)
            && !self.is_edit()
    }

    /// Message body, for message events that still carry content.
    pub fn message_content(&self) -> Option<&MessageContent> {
        match &self.content {
            Content::Message(content) => Some(content),
            _ => None,
        }
    }
}
