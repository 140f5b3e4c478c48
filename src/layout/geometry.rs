// Overlap and bounds helpers shared by label placement and clash detection.

use super::Rect;
use crate::ir::PhotoDimension;

/// True when the boxes share interior area. Touching edges do not clash.
/// Callers must skip self-pairs; a box always clashes with itself.
pub fn rects_clash(a: &Rect, b: &Rect) -> bool {
    !(a.right() <= b.left()
        || a.left() >= b.right()
        || a.bottom() <= b.top()
        || a.top() >= b.bottom())
}

/// Shift `rect` so it lies within `[margin, dimension - margin]` on both axes.
/// The size is never changed; a box larger than the usable area ends up
/// pinned to the top-left margin.
pub fn keep_within_image(rect: Rect, dimension: &PhotoDimension, margin: i32) -> Rect {
    let max_x = dimension.width as i32 - margin;
    let max_y = dimension.height as i32 - margin;
    let mut out = rect;
    if out.right() > max_x {
        out.x = max_x - out.w;
    }
    if out.x < margin {
        out.x = margin;
    }
    if out.bottom() > max_y {
        out.y = max_y - out.h;
    }
    if out.y < margin {
        out.y = margin;
    }
    out
}
