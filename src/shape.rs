//! Area outline generation.
//!
//! Builds one closed fillable outline from a sequence of
//! `(x, y0, y1)` triples: the top edge follows y1 in point order, the
//! bottom edge follows y0 in reverse, and the chosen curve shapes both
//! edges. Per-segment masking is not done here; the outline always
//! spans every point it is given.

use kurbo::{BezPath, PathEl, Point};

/// One prepared outline point: x position, baseline y and value y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaPoint {
    pub x: f64,
    pub y0: f64,
    pub y1: f64,
}

/// Interpolation applied between outline points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Curve {
    /// Straight lines between points.
    #[default]
    Linear,
    /// Hold the value to the midpoint of the span, then step.
    Step,
    /// Step at the start of each span.
    StepBefore,
    /// Step at the end of each span.
    StepAfter,
    /// Catmull-Rom spline through the points, emitted as cubics.
    CatmullRom,
}

/// Build the closed area outline. Empty input yields an empty path;
/// a single point yields a degenerate two-command outline.
pub fn area_outline(points: &[AreaPoint], curve: Curve) -> BezPath {
    let mut path = BezPath::new();
    if points.is_empty() {
        return path;
    }

    let top: Vec<Point> = points.iter().map(|p| Point::new(p.x, p.y1)).collect();
    let bottom: Vec<Point> = points.iter().rev().map(|p| Point::new(p.x, p.y0)).collect();

    path.push(PathEl::MoveTo(top[0]));
    edge(&top, curve, &mut path);
    path.push(PathEl::LineTo(bottom[0]));
    edge(&bottom, curve, &mut path);
    path.push(PathEl::ClosePath);
    path
}

/// The same outline with every value pinned to the baseline.
/// Used as the starting shape when animating an initial render.
pub fn flattened_outline(points: &[AreaPoint], curve: Curve) -> BezPath {
    let flat: Vec<AreaPoint> = points
        .iter()
        .map(|p| AreaPoint { x: p.x, y0: p.y0, y1: p.y0 })
        .collect();
    area_outline(&flat, curve)
}

fn edge(pts: &[Point], curve: Curve, path: &mut BezPath) {
    match curve {
        Curve::Linear => {
            for p in &pts[1..] {
                path.push(PathEl::LineTo(*p));
            }
        }
        Curve::Step => {
            for w in pts.windows(2) {
                let mid = (w[0].x + w[1].x) / 2.0;
                path.push(PathEl::LineTo(Point::new(mid, w[0].y)));
                path.push(PathEl::LineTo(Point::new(mid, w[1].y)));
                path.push(PathEl::LineTo(w[1]));
            }
        }
        Curve::StepBefore => {
            for w in pts.windows(2) {
                path.push(PathEl::LineTo(Point::new(w[0].x, w[1].y)));
                path.push(PathEl::LineTo(w[1]));
            }
        }
        Curve::StepAfter => {
            for w in pts.windows(2) {
                path.push(PathEl::LineTo(Point::new(w[1].x, w[0].y)));
                path.push(PathEl::LineTo(w[1]));
            }
        }
        Curve::CatmullRom => catmull_rom(pts, path),
    }
}

/// Uniform Catmull-Rom through the points, with endpoint tangents from
/// duplicated terminal points, converted span-by-span to cubics.
fn catmull_rom(pts: &[Point], path: &mut BezPath) {
    let n = pts.len();
    for i in 0..n.saturating_sub(1) {
        let p0 = pts[i.saturating_sub(1)];
        let p1 = pts[i];
        let p2 = pts[i + 1];
        let p3 = pts[(i + 2).min(n - 1)];

        let c1 = Point::new(p1.x + (p2.x - p0.x) / 6.0, p1.y + (p2.y - p0.y) / 6.0);
        let c2 = Point::new(p2.x - (p3.x - p1.x) / 6.0, p2.y - (p3.y - p1.y) / 6.0);
        path.push(PathEl::CurveTo(c1, c2, p2));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(f64, f64)]) -> Vec<AreaPoint> {
        raw.iter()
            .map(|&(x, y1)| AreaPoint { x, y0: 0.0, y1 })
            .collect()
    }

    fn command_count(path: &BezPath) -> usize {
        path.elements()
            .iter()
            .filter(|el| !matches!(el, PathEl::ClosePath))
            .count()
    }

    #[test]
    fn empty_input_yields_empty_path() {
        assert!(area_outline(&[], Curve::Linear).elements().is_empty());
    }

    #[test]
    fn linear_outline_has_two_commands_per_point() {
        for n in 1..5 {
            let raw: Vec<(f64, f64)> = (0..n).map(|i| (i as f64, 1.0)).collect();
            let outline = area_outline(&pts(&raw), Curve::Linear);
            assert_eq!(command_count(&outline), 2 * n);
        }
    }

    #[test]
    fn single_point_is_a_degenerate_vertical() {
        let outline = area_outline(&pts(&[(3.0, 2.0)]), Curve::Linear);
        assert_eq!(
            outline.elements(),
            &[
                PathEl::MoveTo(Point::new(3.0, 2.0)),
                PathEl::LineTo(Point::new(3.0, 0.0)),
                PathEl::ClosePath,
            ]
        );
    }

    #[test]
    fn flattened_outline_pins_values_to_baseline() {
        let outline = flattened_outline(&pts(&[(0.0, 1.0), (1.0, 2.0)]), Curve::Linear);
        for el in outline.elements() {
            match el {
                PathEl::MoveTo(p) | PathEl::LineTo(p) => assert_eq!(p.y, 0.0),
                _ => {}
            }
        }
    }

    #[test]
    fn catmull_rom_emits_cubics_through_every_point() {
        let outline = area_outline(
            &pts(&[(0.0, 1.0), (1.0, 3.0), (2.0, 2.0)]),
            Curve::CatmullRom,
        );
        let curves = outline
            .elements()
            .iter()
            .filter(|el| matches!(el, PathEl::CurveTo(..)))
            .count();
        // two spans on the top edge, two on the bottom edge
        assert_eq!(curves, 4);
    }
}
