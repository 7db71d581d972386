//! Error handling for the aot-sim crate.

use std::result;

use thiserror::Error;

/// Convenient result type for aot-sim operations.
pub type Result<T> = result::Result<T, Error>;

/// Errors that can occur while running scenarios.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] aot_config::Error),
    /// The host controller failed, e.g. opening the position store.
    #[error("Host error: {0}")]
    Host(#[from] aot_host::Error),
    /// A scenario expectation did not hold.
    #[error("scenario {scenario}: {message}")]
    Check {
        /// Scenario that failed.
        scenario: &'static str,
        /// What went wrong.
        message: String,
    },
}

impl Error {
    /// Helper to build a failed expectation.
    pub fn check<M: Into<String>>(scenario: &'static str, msg: M) -> Self {
        Self::Check {
            scenario,
            message: msg.into(),
        }
    }
}
