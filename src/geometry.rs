//! Clip-rectangle geometry.
//!
//! One rectangle per segment masks the continuous area outline down to
//! the segment's x-span. Rectangles are padded vertically by the stroke
//! width so strokes are never clipped, and horizontally only at the
//! overall x-extent so adjacent segments stay visually separate.

use kurbo::Rect;

/// Derive one clip rectangle per raw segment span `(x_start, x_end)`.
///
/// Vertical padding applies to every rectangle. Horizontal padding
/// applies only where a span endpoint sits exactly on the overall
/// x-extent boundary.
pub fn clip_rects(
    spans: &[(f64, f64)],
    x_extent: (f64, f64),
    y_extent: (f64, f64),
    stroke_width: f64,
) -> Vec<Rect> {
    let y0 = y_extent.0 - stroke_width;
    let y1 = y_extent.1 + stroke_width;

    spans
        .iter()
        .map(|&(start, end)| {
            let x0 = if start == x_extent.0 { start - stroke_width } else { start };
            let x1 = if end == x_extent.1 { end + stroke_width } else { end };
            Rect::new(x0, y0, x1, y1)
        })
        .collect()
}

/// Clip a span to the visible region containing its midpoint.
///
/// Entering rectangles grow out of this span against the previously
/// visible regions; exiting rectangles shrink into it against the next
/// visible regions. When no region contains the midpoint the span
/// collapses there, so the rectangle vanishes in place instead of
/// jumping to a corner.
pub fn visible_span(span: (f64, f64), visible: &[(f64, f64)]) -> (f64, f64) {
    let (start, end) = span;
    let mid = start + (end - start) / 2.0;

    match visible.iter().find(|v| v.0 <= mid && mid <= v.1) {
        Some(&(v0, v1)) => (v0.max(start), v1.min(end)),
        None => (mid, mid),
    }
}
