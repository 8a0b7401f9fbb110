//! Command-line replay client for chatfold.
//!
//! Feeds a recorded event log through the production [`chatfold_app::Runtime`]
//! and renders the resulting room list and message view as plain text.
//!
//! # Components
//!
//! - [`ReplayTransport`]: JSON-lines event log as a transport
//! - [`SystemEnv`]: wall-clock environment
//! - [`render`]: plain-text room list and message rendering
//! - [`CliError`]: errors that stop the binary

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
pub mod render;
mod replay;
mod system_env;

pub use error::CliError;
pub use replay::{ReplayError, ReplayTransport};
pub use system_env::SystemEnv;
