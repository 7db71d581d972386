//! Boundary and aspect-ratio math for the floating window.

use aot_protocol::{Position, Rect, Size};

/// Move `window` so that it lies inside `screen`.
///
/// Coordinates are top-left corners. When the window is larger than the
/// screen on an axis, the far edge wins (the window's top/left is placed so
/// its right/bottom edge touches the screen's).
pub fn position_within_bounds(window: Rect, screen: Rect) -> Position {
    let min_x = screen.x;
    let min_y = screen.y;
    let max_x = screen.x + screen.width - window.width;
    let max_y = screen.y + screen.height - window.height;
    Position::new(
        window.x.max(min_x).min(max_x),
        window.y.max(min_y).min(max_y),
    )
}

/// Default spot for a window without a stored position: the top-right
/// corner of `work_area`.
pub fn top_right(work_area: Rect, size: Size) -> Position {
    Position::new(work_area.x + work_area.width - size.width, work_area.y)
}

/// Re-derive one dimension of `current` from the other so that the result
/// keeps `ratio`. The dimension that moved most since `old` is kept.
pub fn fit_aspect(old: Size, current: Size, ratio: f64) -> Size {
    let dw = (old.width - current.width).abs();
    let dh = (old.height - current.height).abs();
    if dw >= dh {
        Size::new(
            current.width,
            round_px(f64::from(current.width) / ratio),
        )
    } else {
        Size::new(
            round_px(f64::from(current.height) * ratio),
            current.height,
        )
    }
}

/// True when `cursor` sits within `margin` pixels of the bottom-right corner
/// of `bounds`.
pub fn in_corner_veto(cursor: Position, bounds: Rect, margin: i32) -> bool {
    cursor.x >= bounds.right() - margin && cursor.y >= bounds.bottom() - margin
}

/// Round half away from zero and saturate into `i32`.
fn round_px(v: f64) -> i32 {
    v.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const RATIO: f64 = 16.0 / 9.0;

    #[test]
    fn stored_position_is_pulled_back_on_screen() {
        let wa = Rect::new(0, 0, 1280, 800);
        let win = Rect::new(1000, 50, 320, 180);
        assert_eq!(position_within_bounds(win, wa), Position::new(960, 50));
    }

    #[test]
    fn position_inside_is_untouched() {
        let wa = Rect::new(-1920, 0, 1920, 1080);
        let win = Rect::new(-1000, 300, 320, 180);
        assert_eq!(position_within_bounds(win, wa), Position::new(-1000, 300));
    }

    #[test]
    fn negative_overflow_is_clamped_to_origin() {
        let wa = Rect::new(0, 25, 1440, 875);
        let win = Rect::new(-80, -10, 320, 180);
        assert_eq!(position_within_bounds(win, wa), Position::new(0, 25));
    }

    #[test]
    fn top_right_default() {
        let wa = Rect::new(100, 30, 1280, 770);
        assert_eq!(
            top_right(wa, Size::new(320, 180)),
            Position::new(1060, 30)
        );
    }

    #[test]
    fn width_drag_recomputes_height() {
        let got = fit_aspect(Size::new(320, 180), Size::new(400, 181), RATIO);
        assert_eq!(got, Size::new(400, 225));
    }

    #[test]
    fn height_drag_recomputes_width() {
        let got = fit_aspect(Size::new(320, 180), Size::new(321, 270), RATIO);
        assert_eq!(got, Size::new(480, 270));
    }

    #[test]
    fn corner_veto_region() {
        let b = Rect::new(100, 100, 320, 180);
        assert!(in_corner_veto(Position::new(410, 270), b, 16));
        assert!(in_corner_veto(Position::new(404, 264), b, 16));
        assert!(!in_corner_veto(Position::new(403, 270), b, 16));
        assert!(!in_corner_veto(Position::new(410, 263), b, 16));
        assert!(!in_corner_veto(Position::new(100, 100), b, 16));
    }

    proptest! {
        #[test]
        fn clamp_keeps_window_inside_work_area(
            wa_x in -4000i32..4000,
            wa_y in -4000i32..4000,
            wa_w in 400i32..4000,
            wa_h in 300i32..3000,
            w in 100i32..400,
            h in 50i32..300,
            x in -10000i32..10000,
            y in -10000i32..10000,
        ) {
            let wa = Rect::new(wa_x, wa_y, wa_w, wa_h);
            let p = position_within_bounds(Rect::new(x, y, w, h), wa);
            prop_assert!(p.x >= wa.x && p.x <= wa.x + wa.width - w);
            prop_assert!(p.y >= wa.y && p.y <= wa.y + wa.height - h);
        }

        #[test]
        fn resize_sequence_keeps_ratio(
            steps in proptest::collection::vec((-200i32..200, -200i32..200), 1..20),
        ) {
            let mut size = Size::new(320, 180);
            for (dw, dh) in steps {
                let dragged = Size::new(
                    (size.width + dw).max(160),
                    (size.height + dh).max(90),
                );
                let next = fit_aspect(size, dragged, RATIO);
                // Rounding one dimension to whole pixels bounds the error.
                let err = (f64::from(next.width) - f64::from(next.height) * RATIO).abs();
                prop_assert!(err <= RATIO / 2.0 + 1e-9, "{next:?} drifted by {err}");
                size = next;
            }
        }
    }
}
