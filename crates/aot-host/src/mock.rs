//! In-memory collaborators for tests and simulations (`test-utils` feature).
//!
//! Each mock records the calls it receives as short names so tests can
//! assert on interactions (`calls_contains("hide")`).

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
};

use aot_config::ZLevel;
use aot_protocol::{Position, Rect, Size};
use parking_lot::Mutex;

use crate::{
    ops::{
        Display, Displays, FloatingWindow, HostDeps, MainWindow, WindowId, WindowManager, WindowRef,
    },
    store::MemoryStore,
};

/// Floating window double.
pub struct MockFloatingWindow {
    id: WindowId,
    frame_name: String,
    destroyed: AtomicBool,
    crashed: AtomicBool,
    visible: AtomicBool,
    bounds: Mutex<Rect>,
    always_on_top: Mutex<Option<(bool, ZLevel)>>,
    content_protection: Mutex<Option<bool>>,
    aspect_ratio: Mutex<Option<f64>>,
    /// Every `set_bounds` argument, in order.
    bounds_calls: Mutex<Vec<Rect>>,
    calls: Mutex<Vec<String>>,
}

impl MockFloatingWindow {
    /// Window with `id` named `frame_name`, initially hidden at `bounds`.
    pub fn new(id: WindowId, frame_name: impl Into<String>, bounds: Rect) -> Self {
        Self {
            id,
            frame_name: frame_name.into(),
            destroyed: AtomicBool::new(false),
            crashed: AtomicBool::new(false),
            visible: AtomicBool::new(false),
            bounds: Mutex::new(bounds),
            always_on_top: Mutex::new(None),
            content_protection: Mutex::new(None),
            aspect_ratio: Mutex::new(None),
            bounds_calls: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn note(&self, s: &str) {
        self.calls.lock().push(s.to_string());
    }

    /// Every recorded call, oldest first.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// True if any recorded call contains `s`.
    pub fn calls_contains(&self, s: &str) -> bool {
        self.calls.lock().iter().any(|x| x == s)
    }

    /// Number of recorded calls equal to `s`.
    pub fn count(&self, s: &str) -> usize {
        self.calls.lock().iter().filter(|x| *x == s).count()
    }

    /// Arguments of every `set_bounds` call.
    pub fn bounds_calls(&self) -> Vec<Rect> {
        self.bounds_calls.lock().clone()
    }

    /// True after `show`/`show_inactive` until `hide` or `close`.
    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    /// Last `set_always_on_top` arguments.
    pub fn always_on_top(&self) -> Option<(bool, ZLevel)> {
        *self.always_on_top.lock()
    }

    /// Last `set_content_protection` argument.
    pub fn content_protection(&self) -> Option<bool> {
        *self.content_protection.lock()
    }

    /// Last `set_aspect_ratio` argument.
    pub fn aspect_ratio(&self) -> Option<f64> {
        *self.aspect_ratio.lock()
    }

    /// Simulate the OS destroying the window behind the host's back.
    pub fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
    }

    /// Simulate a content-process crash.
    pub fn crash(&self) {
        self.crashed.store(true, Ordering::SeqCst);
    }

    /// Simulate a user drag changing the size without going through the host.
    pub fn user_resize(&self, size: Size) {
        let mut b = self.bounds.lock();
        b.width = size.width;
        b.height = size.height;
    }

    /// Simulate a user move.
    pub fn user_move(&self, pos: Position) {
        let mut b = self.bounds.lock();
        b.x = pos.x;
        b.y = pos.y;
    }
}

impl FloatingWindow for MockFloatingWindow {
    fn id(&self) -> WindowId {
        self.id
    }
    fn frame_name(&self) -> String {
        self.frame_name.clone()
    }
    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }
    fn is_crashed(&self) -> bool {
        self.crashed.load(Ordering::SeqCst)
    }
    fn bounds(&self) -> Rect {
        *self.bounds.lock()
    }
    fn set_bounds(&self, bounds: Rect) {
        self.note("set_bounds");
        self.bounds_calls.lock().push(bounds);
        *self.bounds.lock() = bounds;
    }
    fn set_size(&self, size: Size) {
        self.note("set_size");
        self.user_resize(size);
    }
    fn set_always_on_top(&self, on: bool, level: ZLevel) {
        self.note("set_always_on_top");
        *self.always_on_top.lock() = Some((on, level));
    }
    fn set_content_protection(&self, on: bool) {
        self.note("set_content_protection");
        *self.content_protection.lock() = Some(on);
    }
    fn set_aspect_ratio(&self, ratio: f64) {
        self.note("set_aspect_ratio");
        *self.aspect_ratio.lock() = Some(ratio);
    }
    fn show(&self) {
        self.note("show");
        self.visible.store(true, Ordering::SeqCst);
    }
    fn show_inactive(&self) {
        self.note("show_inactive");
        self.visible.store(true, Ordering::SeqCst);
    }
    fn hide(&self) {
        self.note("hide");
        self.visible.store(false, Ordering::SeqCst);
    }
    fn close(&self) {
        self.note("close");
        self.visible.store(false, Ordering::SeqCst);
        self.destroyed.store(true, Ordering::SeqCst);
    }
}

/// Window enumeration double.
#[derive(Default)]
pub struct MockWindowManager {
    windows: Mutex<Vec<Arc<MockFloatingWindow>>>,
    next_id: AtomicU64,
}

impl MockWindowManager {
    /// Empty window manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a window named `frame_name`.
    pub fn spawn(&self, frame_name: &str, bounds: Rect) -> Arc<MockFloatingWindow> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let w = Arc::new(MockFloatingWindow::new(id, frame_name, bounds));
        self.windows.lock().push(w.clone());
        w
    }

    /// Drop destroyed windows from the enumeration, as a real shell would.
    pub fn reap(&self) {
        self.windows.lock().retain(|w| !w.is_destroyed());
    }

    /// Windows not yet reaped.
    pub fn len(&self) -> usize {
        self.windows.lock().len()
    }

    /// True when no windows remain.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WindowManager for MockWindowManager {
    fn all_windows(&self) -> Vec<WindowRef> {
        self.windows
            .lock()
            .iter()
            .map(|w| w.clone() as WindowRef)
            .collect()
    }
}

/// Host window double.
#[derive(Default)]
pub struct MockMainWindow {
    shows: AtomicUsize,
}

impl MockMainWindow {
    /// Main window that has never been shown.
    pub fn new() -> Self {
        Self::default()
    }

    /// How often the window was brought forward.
    pub fn shows(&self) -> usize {
        self.shows.load(Ordering::SeqCst)
    }
}

impl MainWindow for MockMainWindow {
    fn show(&self) {
        self.shows.fetch_add(1, Ordering::SeqCst);
    }
}

/// Display geometry double.
pub struct MockDisplays {
    displays: Vec<Display>,
    cursor: Mutex<Position>,
}

impl MockDisplays {
    /// `displays` must not be empty.
    pub fn new(displays: Vec<Display>) -> Self {
        Self {
            displays,
            cursor: Mutex::new(Position::default()),
        }
    }

    /// A single display whose work area equals its bounds.
    pub fn single(bounds: Rect) -> Self {
        Self::new(vec![Display {
            id: 1,
            bounds,
            work_area: bounds,
        }])
    }

    /// Move the simulated pointer.
    pub fn set_cursor(&self, p: Position) {
        *self.cursor.lock() = p;
    }
}

impl Displays for MockDisplays {
    fn cursor_screen_point(&self) -> Position {
        *self.cursor.lock()
    }

    fn display_nearest_point(&self, point: Position) -> Display {
        let dist = |d: &Display| {
            let b = d.bounds;
            let dx = (b.x - point.x).max(point.x - (b.right() - 1)).max(0);
            let dy = (b.y - point.y).max(point.y - (b.bottom() - 1)).max(0);
            i64::from(dx) * i64::from(dx) + i64::from(dy) * i64::from(dy)
        };
        self.displays
            .iter()
            .min_by_key(|d| dist(d))
            .copied()
            .unwrap_or(Display {
                id: 0,
                bounds: Rect::default(),
                work_area: Rect::default(),
            })
    }

    fn display_matching(&self, rect: Rect) -> Option<Display> {
        self.displays
            .iter()
            .map(|d| (d.bounds.overlap_area(&rect), d))
            .filter(|(area, _)| *area > 0)
            .max_by_key(|(area, _)| *area)
            .map(|(_, d)| *d)
    }
}

/// Every mock collaborator a host session needs, plus the [`HostDeps`] view.
pub struct MockShell {
    /// Host window double.
    pub main_window: Arc<MockMainWindow>,
    /// Window enumeration double.
    pub windows: Arc<MockWindowManager>,
    /// Display geometry double.
    pub displays: Arc<MockDisplays>,
    /// In-memory position store.
    pub store: Arc<MemoryStore>,
}

impl MockShell {
    /// Shell with a single 1920x1080 display and an empty store.
    pub fn new() -> Self {
        Self::with_displays(MockDisplays::single(Rect::new(0, 0, 1920, 1080)))
    }

    /// Shell with the given displays and an empty store.
    pub fn with_displays(displays: MockDisplays) -> Self {
        Self {
            main_window: Arc::new(MockMainWindow::new()),
            windows: Arc::new(MockWindowManager::new()),
            displays: Arc::new(displays),
            store: Arc::new(MemoryStore::new()),
        }
    }

    /// Replace the position store.
    pub fn with_store(mut self, store: MemoryStore) -> Self {
        self.store = Arc::new(store);
        self
    }

    /// Collaborator bundle backed by these doubles.
    pub fn deps(&self) -> HostDeps {
        HostDeps {
            main_window: self.main_window.clone(),
            windows: self.windows.clone(),
            displays: self.displays.clone(),
            store: self.store.clone(),
        }
    }
}

impl Default for MockShell {
    fn default() -> Self {
        Self::new()
    }
}
