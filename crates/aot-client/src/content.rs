//! Floating window content: the passive page inside the floating window.
//!
//! It turns raw pointer input into [`Handoff`] calls. Drag is implemented
//! here on platforms without a working native drag region; the window size
//! is captured at mouse-down and sent with every move so the host never
//! resizes the window mid-drag.

use aot_protocol::{Position, Size};
use tracing::trace;

use crate::handoff::Handoff;

/// A resource the page loads after its markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    /// A script URL.
    Script(String),
    /// A stylesheet URL.
    Stylesheet(String),
}

impl Resource {
    /// Classify `src` by extension; anything but `.js` and `.css` is skipped.
    pub fn classify(src: &str) -> Option<Self> {
        if src.ends_with(".js") {
            Some(Self::Script(src.to_string()))
        } else if src.ends_with(".css") {
            Some(Self::Stylesheet(src.to_string()))
        } else {
            None
        }
    }
}

/// Pointer drag state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DragTracker {
    /// Page point and window size captured at mouse-down.
    origin: Option<(Position, Size)>,
}

impl DragTracker {
    /// Start a drag at page point `page` with the window at `size`.
    pub fn begin(&mut self, page: Position, size: Size) {
        self.origin = Some((page, size));
    }

    /// Window origin and size for a pointer now at screen point `screen`.
    pub fn drag_to(&self, screen: Position) -> Option<(Position, Size)> {
        let (page, size) = self.origin?;
        Some((Position::new(screen.x - page.x, screen.y - page.y), size))
    }

    /// Stop dragging.
    pub fn end(&mut self) {
        self.origin = None;
    }

    /// True between `begin` and `end`.
    pub fn is_dragging(&self) -> bool {
        self.origin.is_some()
    }
}

/// The page running inside one floating window.
pub struct FloatingContent {
    handoff: Handoff,
    drag: DragTracker,
    loaded: bool,
}

impl FloatingContent {
    /// Content talking to the client through `handoff`.
    pub fn new(handoff: Handoff) -> Self {
        Self {
            handoff,
            drag: DragTracker::default(),
            loaded: false,
        }
    }

    /// Page finished loading: report it once and return the resources to
    /// attach.
    pub fn load(&mut self, resources: &[String]) -> Vec<Resource> {
        if !self.loaded {
            self.loaded = true;
            self.handoff.loaded();
        }
        resources.iter().filter_map(|s| Resource::classify(s)).collect()
    }

    /// Pointer pressed at page point `page`.
    pub fn mouse_down(&mut self, page: Position) {
        if !self.handoff.should_implement_drag() {
            return;
        }
        self.drag.begin(page, self.handoff.current_size());
    }

    /// Pointer moved to screen point `screen`.
    pub fn mouse_move(&mut self, screen: Position) {
        if let Some((position, size)) = self.drag.drag_to(screen) {
            trace!(?position, "dragging aot window");
            self.handoff.move_to(position, size);
        }
    }

    /// Pointer released.
    pub fn mouse_up(&mut self) {
        self.drag.end();
    }

    /// The window was double-clicked.
    pub fn double_click(&self) {
        self.handoff.double_click();
    }

    /// The dismiss control was clicked.
    pub fn dismiss_click(&self) {
        self.handoff.dismiss();
    }

    /// True while a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }
}
