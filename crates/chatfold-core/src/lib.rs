//! Core derived-state engine for chatfold.
//!
//! Turns an append-only, partially loaded stream of chat protocol events into
//! the state a chat client renders: canonical message lists, edit and reaction
//! indices, reply resolutions, room recency ordering and unread counters.
//!
//! # Architecture
//!
//! Everything in this crate is Sans-IO. Components are plain values that are
//! fed events and queried for derived state; nothing here performs network or
//! disk access, and time only enters through [`env::Environment`].
//!
//! # Components
//!
//! - [`EventStore`]: per-room timeline with idempotent append and backfill
//! - [`resolver::resolve`]: pure relation resolution over a timeline
//! - [`RoomOrderer`]: sidebar ordering (recency, priority partition)
//! - [`UnreadTracker`]: settle-aware unread counting
//! - [`Room`]: aggregate tying a store to its current [`Resolution`]
//! - [`wire`]: decoding of upstream JSON events into [`Event`]

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod env;
pub mod error;
pub mod event;
pub mod orderer;
pub mod resolver;
pub mod room;
pub mod store;
pub mod unread;
pub mod wire;

pub use error::ChatError;
pub use event::{
    Content, Event, EventId, EventKind, Membership, MessageContent, MsgType, Relation, RoomId,
    UserId,
};
pub use orderer::{RoomOrderer, RoomRecency};
pub use resolver::{DELETED_PLACEHOLDER, EffectiveContent, ReactionTally, Resolution};
pub use room::Room;
pub use store::EventStore;
pub use unread::{RoomUnread, UnreadMode, UnreadTracker};
