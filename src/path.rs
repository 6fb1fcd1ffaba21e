//! Path-string serialization and morph interpolation.
//!
//! Outlines travel through the scene as compact SVG path strings
//! (`M0,1L1,2...Z`). Morph transitions normalize both endpoint strings
//! to an equal-length cubic form, interpolate numerically, and land on
//! the exact target string at completion.

use std::fmt::Write;

use kurbo::{BezPath, PathEl, Point};

use crate::error::RenderError;

/// Format a number the way it is written into attributes: integral
/// values without a fractional part, everything else as the shortest
/// round-trip form.
pub(crate) fn fmt_num(v: f64) -> String {
    if v == v.trunc() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

/// Serialize a path as a compact command string.
pub fn to_svg(path: &BezPath) -> String {
    let mut out = String::new();
    let write_pt = |out: &mut String, p: Point| {
        let _ = write!(out, "{},{}", fmt_num(p.x), fmt_num(p.y));
    };

    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                out.push('M');
                write_pt(&mut out, p);
            }
            PathEl::LineTo(p) => {
                out.push('L');
                write_pt(&mut out, p);
            }
            PathEl::QuadTo(c, p) => {
                out.push('Q');
                write_pt(&mut out, c);
                out.push(' ');
                write_pt(&mut out, p);
            }
            PathEl::CurveTo(c1, c2, p) => {
                out.push('C');
                write_pt(&mut out, c1);
                out.push(' ');
                write_pt(&mut out, c2);
                out.push(' ');
                write_pt(&mut out, p);
            }
            PathEl::ClosePath => out.push('Z'),
        }
    }
    out
}

/// Parse an SVG path string.
pub fn from_svg(d: &str) -> Result<BezPath, RenderError> {
    BezPath::from_svg(d).map_err(|e| RenderError::InvalidPath(e.to_string()))
}

/// A single-subpath outline normalized to start point + cubic spans.
#[derive(Debug, Clone)]
struct CubicForm {
    start: Point,
    segs: Vec<(Point, Point, Point)>,
    closed: bool,
}

fn to_cubic_form(path: &BezPath) -> Option<CubicForm> {
    let mut form: Option<CubicForm> = None;
    let mut current = Point::ZERO;

    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                if form.is_none() {
                    form = Some(CubicForm { start: p, segs: Vec::new(), closed: false });
                } else if let Some(f) = form.as_mut() {
                    // later subpaths are folded in as joins
                    f.segs.push(line_cubic(current, p));
                }
                current = p;
            }
            PathEl::LineTo(p) => {
                if let Some(f) = form.as_mut() {
                    f.segs.push(line_cubic(current, p));
                }
                current = p;
            }
            PathEl::QuadTo(c, p) => {
                if let Some(f) = form.as_mut() {
                    // degree elevation
                    let c1 = lerp(current, c, 2.0 / 3.0);
                    let c2 = lerp(p, c, 2.0 / 3.0);
                    f.segs.push((c1, c2, p));
                }
                current = p;
            }
            PathEl::CurveTo(c1, c2, p) => {
                if let Some(f) = form.as_mut() {
                    f.segs.push((c1, c2, p));
                }
                current = p;
            }
            PathEl::ClosePath => {
                if let Some(f) = form.as_mut() {
                    f.closed = true;
                }
            }
        }
    }
    form
}

fn line_cubic(a: Point, b: Point) -> (Point, Point, Point) {
    (lerp(a, b, 1.0 / 3.0), lerp(a, b, 2.0 / 3.0), b)
}

fn lerp(a: Point, b: Point, t: f64) -> Point {
    Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

fn pad_to(form: &mut CubicForm, n: usize) {
    let anchor = form.segs.last().map(|s| s.2).unwrap_or(form.start);
    while form.segs.len() < n {
        form.segs.push((anchor, anchor, anchor));
    }
}

fn serialize_cubic(form: &CubicForm) -> String {
    let mut out = String::new();
    let _ = write!(out, "M{},{}", fmt_num(form.start.x), fmt_num(form.start.y));
    for (c1, c2, p) in &form.segs {
        let _ = write!(
            out,
            "C{},{} {},{} {},{}",
            fmt_num(c1.x),
            fmt_num(c1.y),
            fmt_num(c2.x),
            fmt_num(c2.y),
            fmt_num(p.x),
            fmt_num(p.y)
        );
    }
    if form.closed {
        out.push('Z');
    }
    out
}

/// Interpolates between two outline strings over progress 0..1.
///
/// When either endpoint is empty there is nothing to morph through, so
/// the interpolator holds the source string and swaps to the target at
/// completion.
#[derive(Debug, Clone)]
pub struct PathInterpolator {
    from_raw: String,
    to_raw: String,
    forms: Option<(CubicForm, CubicForm)>,
}

impl PathInterpolator {
    pub fn new(from: &str, to: &str) -> Result<Self, RenderError> {
        let mut from_form = if from.is_empty() { None } else { to_cubic_form(&from_svg(from)?) };
        let mut to_form = if to.is_empty() { None } else { to_cubic_form(&from_svg(to)?) };

        let forms = match (from_form.as_mut(), to_form.as_mut()) {
            (Some(a), Some(b)) => {
                let n = a.segs.len().max(b.segs.len());
                pad_to(a, n);
                pad_to(b, n);
                Some((a.clone(), b.clone()))
            }
            _ => None,
        };

        Ok(PathInterpolator {
            from_raw: from.to_string(),
            to_raw: to.to_string(),
            forms,
        })
    }

    /// The outline string at progress `t`. Exactly the target string
    /// for `t >= 1`.
    pub fn at(&self, t: f64) -> String {
        if t >= 1.0 {
            return self.to_raw.clone();
        }
        let Some((a, b)) = &self.forms else {
            return self.from_raw.clone();
        };

        let mid = CubicForm {
            start: lerp(a.start, b.start, t),
            segs: a
                .segs
                .iter()
                .zip(&b.segs)
                .map(|(sa, sb)| {
                    (
                        lerp(sa.0, sb.0, t),
                        lerp(sa.1, sb.1, t),
                        lerp(sa.2, sb.2, t),
                    )
                })
                .collect(),
            closed: a.closed && b.closed,
        };
        serialize_cubic(&mid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_compact_commands() {
        let mut p = BezPath::new();
        p.push(PathEl::MoveTo(Point::new(0.0, 1.0)));
        p.push(PathEl::LineTo(Point::new(1.0, 2.0)));
        p.push(PathEl::LineTo(Point::new(1.0, 0.0)));
        p.push(PathEl::ClosePath);
        assert_eq!(to_svg(&p), "M0,1L1,2L1,0Z");
    }

    #[test]
    fn fractions_keep_their_fractional_part() {
        let mut p = BezPath::new();
        p.push(PathEl::MoveTo(Point::new(0.5, -1.25)));
        assert_eq!(to_svg(&p), "M0.5,-1.25");
    }

    #[test]
    fn roundtrips_through_the_parser() {
        let d = "M0,1L1,2L2,1L2,0L1,0L0,0Z";
        assert_eq!(to_svg(&from_svg(d).unwrap()), d);
    }

    #[test]
    fn interpolator_hits_exact_endpoints() {
        let a = "M0,0L10,0Z";
        let b = "M0,0L10,10L20,10Z";
        let interp = PathInterpolator::new(a, b).unwrap();
        assert_eq!(interp.at(1.0), b);
        assert_eq!(interp.at(2.0), b);
    }

    #[test]
    fn interpolator_midpoint_is_between_the_shapes() {
        let a = "M0,0L10,0";
        let b = "M0,10L10,10";
        let interp = PathInterpolator::new(a, b).unwrap();
        let mid = interp.at(0.5);
        // top edge endpoints sit halfway at y=5
        assert!(mid.starts_with("M0,5"));
        assert!(mid.ends_with("10,5"));
    }

    #[test]
    fn empty_source_holds_until_completion() {
        let interp = PathInterpolator::new("", "M0,0L1,1").unwrap();
        assert_eq!(interp.at(0.5), "");
        assert_eq!(interp.at(1.0), "M0,0L1,1");
    }
}
