//! Deterministic simulation harness for chatfold.
//!
//! Simulated implementations of the Environment and Transport traits so the
//! production [`chatfold_app::Runtime`] can be driven step by step on tokio's
//! paused clock, with scripted history and injected failures.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the common
//! facade invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod sim_env;
pub mod sim_transport;

pub use invariants::{
    CanonicalExcludesRelations, Invariant, InvariantRegistry, InvariantResult,
    ReactionSendersUnique, ReplyTargetsLoaded, RoomOrderComplete, RoomSnapshot,
    SelectedRoomExists, SelectedRoomUnreadZero, SystemSnapshot, TimelineIdsUnique, Violation,
};
pub use sim_env::SimEnv;
pub use sim_transport::{SimTransport, SimTransportError};
