//! Embedded client controller for the always-on-top floating window.
//!
//! The client runs beside the conference. It tells the host when the
//! conference is joined, left, or scrolled out of view, opens the floating
//! window when the host asks, and mirrors the conference video into it.
//!
//! - [`Client`]: the state machine; feed it [`ClientEvent`]s and host messages
//! - [`ClientSession`]: async driver with media-refresh debouncing
//! - [`FloatingContent`]: the page inside the floating window
//! - [`ops`]: the capabilities an embedding page injects
mod client;
pub mod content;
mod error;
mod handoff;
pub mod ops;
mod session;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use client::{Client, ClientEvent, ClientEventRx, ClientEventTx, Flow, event_channel};
pub use content::{DragTracker, FloatingContent, Resource};
pub use error::{Error, Result};
pub use handoff::{Handoff, HandoffEvent};
pub use session::{ClientSession, setup};
