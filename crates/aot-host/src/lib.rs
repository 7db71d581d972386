//! Host-side controller for the always-on-top floating window.
//!
//! The host owns the floating OS window. It decides whether a `window.open`
//! may create it, configures it once created (stacking level, capture
//! exclusion, aspect ratio), shows and hides it as the host window loses and
//! gains focus, and persists its position.
//!
//! - [`Host`]: the state machine; feed it [`HostEvent`]s
//! - [`Session`]: async driver pairing a [`Host`] with the session channel
//! - [`ops`]: the OS capabilities a shell injects
//! - [`JsonFileStore`] and [`MemoryStore`]: position stores
mod error;
pub mod geometry;
mod host;
pub mod ops;
mod placement;
mod resize;
mod session;
mod store;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use error::{Error, Result};
pub use host::{FloatingEvent, Flow, Host, HostEvent, MainWindowEvent};
pub use placement::Placement;
pub use resize::ResizeGuard;
pub use session::{HostEventRx, HostEventTx, Session, event_channel, setup};
pub use store::{JsonFileStore, MemoryStore};
