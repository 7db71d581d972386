//! Collaborator capabilities consumed by the host controller.
//!
//! The controller never talks to an OS window system directly. Window
//! enumeration, display geometry, the host window and the position store
//! are injected behind these traits so that production shells and tests can
//! plug in their own implementations.

use std::sync::Arc;

use aot_config::{WindowChrome, ZLevel};
use aot_protocol::{Position, Rect, Size};

use crate::Result;

/// Identifier of a window, stable for the window's lifetime. Later windows
/// get larger ids.
pub type WindowId = u64;

/// A live (or formerly live) floating window.
///
/// All mutating calls are fire-and-forget. Implementations must tolerate
/// calls on a destroyed window.
pub trait FloatingWindow: Send + Sync {
    /// Shell-assigned id.
    fn id(&self) -> WindowId;
    /// Name of the window's main frame (the `window.open` target name).
    fn frame_name(&self) -> String;
    /// True once the window is closed.
    fn is_destroyed(&self) -> bool;
    /// True when the content process died.
    fn is_crashed(&self) -> bool;
    /// Outer bounds in screen coordinates.
    fn bounds(&self) -> Rect;
    /// Move and resize in a single call.
    fn set_bounds(&self, bounds: Rect);
    /// Resize, keeping the origin.
    fn set_size(&self, size: Size);
    /// Stack above other windows at `level`.
    fn set_always_on_top(&self, on: bool, level: ZLevel);
    /// Exclude (or include) the window from screen capture.
    fn set_content_protection(&self, on: bool);
    /// Ask the window manager to keep `ratio`; only used where it is reliable.
    fn set_aspect_ratio(&self, ratio: f64);
    /// Show and focus.
    fn show(&self);
    /// Show without taking focus.
    fn show_inactive(&self);
    /// Hide without closing.
    fn hide(&self);
    /// Close and destroy.
    fn close(&self);
}

/// Shared handle to a floating window.
pub type WindowRef = Arc<dyn FloatingWindow>;

/// Enumeration of every window the shell currently owns.
pub trait WindowManager: Send + Sync {
    /// Snapshot of all windows, destroyed ones included until reaped.
    fn all_windows(&self) -> Vec<WindowRef>;
}

/// The main application window hosting the conference.
pub trait MainWindow: Send + Sync {
    /// Bring the window to the foreground.
    fn show(&self);
}

/// One physical display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Display {
    /// Shell-assigned id.
    pub id: u32,
    /// Full bounds of the display.
    pub bounds: Rect,
    /// Bounds minus taskbars, docks and menu bars.
    pub work_area: Rect,
}

/// Display geometry queries.
pub trait Displays: Send + Sync {
    /// Current pointer location.
    fn cursor_screen_point(&self) -> Position;
    /// Display closest to `point`.
    fn display_nearest_point(&self, point: Position) -> Display;
    /// Display with the largest overlap with `rect`, if any overlaps.
    fn display_matching(&self, rect: Rect) -> Option<Display>;
}

/// Persistent key-value storage for the last window position.
pub trait PositionStore: Send + Sync {
    /// Stored integer under `key`; `None` when absent or not an integer.
    fn get(&self, key: &str) -> Option<i32>;
    /// Store `value` under `key`.
    fn set(&self, key: &str, value: i32) -> Result<()>;
}

/// A `window.open` request seen by the host before the window exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    /// Target frame name passed to `window.open`.
    pub frame_name: String,
    /// Requested URL.
    pub url: String,
}

impl OpenRequest {
    /// Request for `frame_name` with an empty URL.
    pub fn named(frame_name: impl Into<String>) -> Self {
        Self {
            frame_name: frame_name.into(),
            url: String::new(),
        }
    }
}

/// Creation options injected into an allowed floating window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowOptions {
    /// Frame and behaviour flags.
    pub chrome: WindowChrome,
    /// Initial outer bounds.
    pub bounds: Rect,
}

/// Answer to an [`OpenRequest`].
#[derive(Debug, Clone, PartialEq)]
pub enum OpenDecision {
    /// Create the window, optionally overriding its options.
    Allow(Option<WindowOptions>),
    /// Refuse the request.
    Deny,
}

impl OpenDecision {
    /// True for [`OpenDecision::Allow`].
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow(_))
    }
}

/// Handler for open requests that are not floating-window requests.
pub type OpenHandler = Box<dyn Fn(&OpenRequest) -> OpenDecision + Send + Sync>;

/// Answer to a pending user resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeDecision {
    /// Let the resize happen.
    Allow,
    /// Veto it.
    Prevent,
}

/// Bundle of collaborators a host session needs.
#[derive(Clone)]
pub struct HostDeps {
    /// The window hosting the conference.
    pub main_window: Arc<dyn MainWindow>,
    /// Window enumeration.
    pub windows: Arc<dyn WindowManager>,
    /// Display geometry.
    pub displays: Arc<dyn Displays>,
    /// Where the last position persists.
    pub store: Arc<dyn PositionStore>,
}
