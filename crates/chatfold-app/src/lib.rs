//! Application layer for chatfold.
//!
//! A pure facade state machine plus a generic runtime that drives it against
//! a transport, so simulation tests exercise the same code that runs in
//! production.
//!
//! # Components
//!
//! - [`ChatFacade`]: derived-state machine (rooms, selection, unread, draft)
//! - [`Transport`]: trait for the protocol client
//! - [`Runtime`]: generic orchestration loop using a Transport
//! - [`ChatConfig`]: account and presentation settings
//! - [`view`]: presentation snapshots (messages, reply quotes, room list)

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod config;
mod event;
mod facade;
mod runtime;
mod transport;
pub mod view;

pub use action::FacadeAction;
pub use config::{ChatConfig, DEFAULT_BACKFILL_LIMIT, DEFAULT_MIN_WINDOW, DEFAULT_SETTLE_DELAY};
pub use event::FacadeEvent;
pub use facade::{ChatFacade, Selection};
pub use runtime::{Runtime, SUBSCRIPTION_RETRY_DELAY};
pub use transport::{JoinedRoom, Transport};
pub use view::{MessageView, ReactionView, ReplyPreview, RoomSummary};
