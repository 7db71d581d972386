use std::result::Result as StdResult;

use thiserror::Error;

/// Convenient result type for the client crate.
pub type Result<T> = StdResult<T, Error>;

/// Errors surfaced by the embedded client controller.
///
/// A floating window that is already gone is never an error; operations on
/// it are skipped.
#[derive(Debug, Error)]
pub enum Error {
    /// The host end of the session channel is gone.
    #[error("host channel closed")]
    ChannelClosed,

    /// The shell refused or failed to open the floating window.
    #[error("failed to open window '{name}': {message}")]
    Open {
        /// Frame name of the window.
        name: String,
        /// Shell error text.
        message: String,
    },
}
