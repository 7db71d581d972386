use std::{io, result::Result as StdResult};

use thiserror::Error;

/// Convenient result type for the host crate.
pub type Result<T> = StdResult<T, Error>;

/// Errors surfaced by the host controller.
///
/// Stale window handles and foreign open requests are not errors: they are
/// treated as "no window" and "deny" respectively.
#[derive(Debug, Error)]
pub enum Error {
    /// The client end of the session channel is gone.
    #[error("client channel closed")]
    ChannelClosed,

    /// I/O failure while reading or writing the position store.
    #[error("position store I/O error: {0}")]
    Io(#[from] io::Error),

    /// The position store file is not valid JSON.
    #[error("position store is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}
