//! Callbacks the client hands to the floating window.
//!
//! The floating window has no channel of its own. Everything it wants to say
//! goes through a [`Handoff`], which turns calls into [`ClientEvent`]s tagged
//! with the window they came from. Once the client is gone, calls are
//! dropped.

use std::sync::Weak;

use aot_protocol::{Position, Size};
use tracing::trace;

use crate::{
    client::{ClientEvent, ClientEventTx},
    ops::FloatingView,
};

/// What the floating window reports back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffEvent {
    /// The dismiss control was clicked.
    Dismiss,
    /// Drag in progress: move the window origin to `position`.
    Move {
        /// New window origin in screen coordinates.
        position: Position,
        /// Window size when the drag started.
        initial_size: Size,
    },
    /// The window was double-clicked.
    DoubleClick,
    /// The window's script finished loading.
    Load,
}

/// Callback object installed into one floating window.
#[derive(Clone)]
pub struct Handoff {
    /// Sequence number of the window this handoff belongs to.
    window: u64,
    tx: ClientEventTx,
    should_implement_drag: bool,
    view: Weak<dyn FloatingView>,
}

impl Handoff {
    pub(crate) fn new(
        window: u64,
        tx: ClientEventTx,
        should_implement_drag: bool,
        view: Weak<dyn FloatingView>,
    ) -> Self {
        Self {
            window,
            tx,
            should_implement_drag,
            view,
        }
    }

    /// Sequence number of the owning window.
    pub fn window(&self) -> u64 {
        self.window
    }

    /// The page must implement drag itself; false where the titlebar drag
    /// region works natively.
    pub fn should_implement_drag(&self) -> bool {
        self.should_implement_drag
    }

    /// Current viewport size, or zero once the window is gone.
    pub fn current_size(&self) -> Size {
        self.view
            .upgrade()
            .map(|v| v.inner_size())
            .unwrap_or_default()
    }

    /// The dismiss control was clicked.
    pub fn dismiss(&self) {
        self.emit(HandoffEvent::Dismiss);
    }

    /// Move the window to `position` keeping `initial_size`.
    pub fn move_to(&self, position: Position, initial_size: Size) {
        self.emit(HandoffEvent::Move {
            position,
            initial_size,
        });
    }

    /// The window was double-clicked.
    pub fn double_click(&self) {
        self.emit(HandoffEvent::DoubleClick);
    }

    /// The page finished loading.
    pub fn loaded(&self) {
        self.emit(HandoffEvent::Load);
    }

    fn emit(&self, event: HandoffEvent) {
        let ev = ClientEvent::Handoff {
            window: self.window,
            event,
        };
        if self.tx.send(ev).is_err() {
            trace!(window = self.window, ?event, "client gone, dropping handoff event");
        }
    }
}
