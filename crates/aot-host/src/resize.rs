//! Aspect-ratio enforcement for platforms without a reliable native primitive.
//!
//! The guard sees `will-resize` (before the OS applies a user drag) and
//! `resize` (after). Before: remember the old size and veto drags that start
//! in the bottom-right corner, whose native handle misbehaves. After: keep
//! whichever dimension moved most and derive the other from the ratio.

use aot_protocol::{Position, Rect, Size};
use tracing::trace;

use crate::{geometry, ops::ResizeDecision};

/// Per-window resize state.
#[derive(Debug, Clone)]
pub struct ResizeGuard {
    /// Target width / height ratio.
    ratio: f64,
    /// Size of the bottom-right veto square.
    corner_margin: i32,
    /// Size observed before the resize currently in flight.
    old_size: Option<Size>,
}

impl ResizeGuard {
    /// Guard keeping `ratio`, vetoing resizes within `corner_margin` of the bottom-right corner.
    pub fn new(ratio: f64, corner_margin: i32) -> Self {
        Self {
            ratio,
            corner_margin,
            old_size: None,
        }
    }

    /// Forget the size of a previous window.
    pub fn reset(&mut self) {
        self.old_size = None;
    }

    /// A user resize is about to happen.
    pub fn will_resize(&mut self, current: Size, new_bounds: Rect, cursor: Position) -> ResizeDecision {
        self.old_size = Some(current);
        if geometry::in_corner_veto(cursor, new_bounds, self.corner_margin) {
            trace!(?cursor, ?new_bounds, "vetoing bottom-right resize");
            ResizeDecision::Prevent
        } else {
            ResizeDecision::Allow
        }
    }

    /// The window now has `current`; returns the size to force, if any.
    ///
    /// Without a preceding `will_resize` there is no reference size and the
    /// resize is left alone.
    pub fn resized(&mut self, current: Size) -> Option<Size> {
        let old = self.old_size?;
        let fixed = geometry::fit_aspect(old, current, self.ratio);
        self.old_size = Some(fixed);
        Some(fixed)
    }
}
