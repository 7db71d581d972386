//! Where the floating window opens and how big it is.
//!
//! Position survives restarts through the [`PositionStore`]; size lives only
//! as long as the conference and is reset when the session closes.

use std::sync::Arc;

use aot_protocol::{Platform, Position, Rect, STORAGE_X, STORAGE_Y, Size};
use tracing::{debug, warn};

use crate::{
    geometry,
    ops::{Displays, FloatingWindow, PositionStore},
};

/// Position/size bookkeeping for one host session.
pub struct Placement {
    store: Arc<dyn PositionStore>,
    displays: Arc<dyn Displays>,
    platform: Platform,
    default_size: Size,
    /// Current size, carried across close/reopen within a conference.
    size: Size,
}

impl Placement {
    /// Placement starting at `default_size`.
    pub fn new(
        store: Arc<dyn PositionStore>,
        displays: Arc<dyn Displays>,
        platform: Platform,
        default_size: Size,
    ) -> Self {
        Self {
            store,
            displays,
            platform,
            default_size,
            size: default_size,
        }
    }

    /// Size to give the next window.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Record a size chosen by the user.
    pub fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    /// Back to the default size.
    pub fn reset_size(&mut self) {
        self.size = self.default_size;
    }

    /// Last stored position, corrected onto a display where needed; without
    /// one, the top-right corner of the display under the cursor.
    pub fn position(&self) -> Position {
        let stored = self
            .store
            .get(STORAGE_X)
            .zip(self.store.get(STORAGE_Y))
            .map(|(x, y)| Position::new(x, y));

        if let Some(pos) = stored {
            let rect = Rect::from_parts(pos, self.size);
            if self.platform.clamps_stored_position()
                && let Some(screen) = self.displays.display_matching(rect)
            {
                let fixed = geometry::position_within_bounds(rect, screen.work_area);
                if fixed != pos {
                    let display_id = screen.id;
                    debug!(?pos, ?fixed, display_id, "stored position corrected");
                }
                return fixed;
            }
            return pos;
        }

        let cursor = self.displays.cursor_screen_point();
        let display = self.displays.display_nearest_point(cursor);
        geometry::top_right(display.work_area, self.size)
    }

    /// Bounds for a new window: [`Self::position`] plus [`Self::size`].
    pub fn bounds(&self) -> Rect {
        Rect::from_parts(self.position(), self.size)
    }

    /// Persist the window's current origin.
    pub fn save_position(&self, window: &dyn FloatingWindow) {
        let pos = window.bounds().position();
        let res = self
            .store
            .set(STORAGE_X, pos.x)
            .and_then(|()| self.store.set(STORAGE_Y, pos.y));
        match res {
            Ok(()) => debug!(?pos, "saved aot position"),
            Err(e) => warn!(error = %e, "failed to save aot position"),
        }
    }
}

#[cfg(test)]
mod tests {
    use aot_protocol::Os;

    use super::*;
    use crate::{mock::MockDisplays, ops::Display, store::MemoryStore};

    fn displays() -> Arc<MockDisplays> {
        Arc::new(MockDisplays::new(vec![
            Display {
                id: 1,
                bounds: Rect::new(0, 0, 1280, 800),
                work_area: Rect::new(0, 0, 1280, 800),
            },
            Display {
                id: 2,
                bounds: Rect::new(1280, 0, 1920, 1080),
                work_area: Rect::new(1280, 25, 1920, 1055),
            },
        ]))
    }

    fn placement(os: Os, store: Arc<MemoryStore>, d: Arc<MockDisplays>) -> Placement {
        Placement::new(store, d, Platform::new(os, "10.0.22631"), Size::new(320, 180))
    }

    #[test]
    fn stored_position_is_clamped_on_windows() {
        let store = Arc::new(MemoryStore::with([(STORAGE_X, 1000), (STORAGE_Y, 50)]));
        let p = placement(Os::Windows, store, displays());
        assert_eq!(p.position(), Position::new(960, 50));
    }

    #[test]
    fn stored_position_is_trusted_elsewhere() {
        let store = Arc::new(MemoryStore::with([(STORAGE_X, 1000), (STORAGE_Y, 50)]));
        let p = placement(Os::Linux, store, displays());
        assert_eq!(p.position(), Position::new(1000, 50));
    }

    #[test]
    fn offscreen_position_without_matching_display_is_kept() {
        let store = Arc::new(MemoryStore::with([(STORAGE_X, 9000), (STORAGE_Y, 9000)]));
        let p = placement(Os::Windows, store, displays());
        assert_eq!(p.position(), Position::new(9000, 9000));
    }

    #[test]
    fn missing_coordinate_falls_back_to_top_right_of_cursor_display() {
        let store = Arc::new(MemoryStore::with([(STORAGE_X, 10)]));
        let d = displays();
        d.set_cursor(Position::new(2000, 500));
        let p = placement(Os::MacOs, store, d);
        assert_eq!(p.position(), Position::new(1280 + 1920 - 320, 25));
    }

    #[test]
    fn size_is_tracked_and_reset() {
        let mut p = placement(Os::Linux, Arc::new(MemoryStore::new()), displays());
        p.set_size(Size::new(480, 270));
        assert_eq!(p.bounds().size(), Size::new(480, 270));
        p.reset_size();
        assert_eq!(p.size(), Size::new(320, 180));
    }
}
