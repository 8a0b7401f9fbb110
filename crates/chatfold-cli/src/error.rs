//! CLI error types.

use std::path::PathBuf;

use chatfold_core::ChatError;

/// Errors that stop the `chatfold` binary.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// A file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid.
    #[error("invalid config {}: {source}", path.display())]
    Config {
        /// Config file.
        path: PathBuf,
        /// Decode error.
        #[source]
        source: serde_json::Error,
    },

    /// Writing the rendered output failed.
    #[error("cannot write output: {0}")]
    Output(#[from] std::io::Error),

    /// Rendering into the output buffer failed.
    #[error("cannot render output")]
    Render(#[from] std::fmt::Error),

    /// The session rejected an operation.
    #[error(transparent)]
    Chat(#[from] ChatError),
}
