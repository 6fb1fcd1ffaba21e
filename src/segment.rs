//! Segmentation of a point sequence into contiguous runs.
//!
//! Two passes: first split by definedness (and sequence adjacency),
//! then split each defined run by chunk label, resolving which chunk
//! claims the shared point at a label boundary.

/// A contiguous, non-empty run of points, as an inclusive index range
/// into the original point slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
}

impl Segment {
    fn single(i: usize) -> Self {
        Segment { start: i, end: i }
    }

    /// Number of points in the run. Always at least 1.
    pub fn point_count(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Split the sequence into runs of defined points.
///
/// A run breaks at any point where `defined` is false (the point is
/// dropped), or where `is_next` rejects the previous/current pair
/// (both points are kept, in separate runs).
pub fn compute_defined_segments<D>(
    points: &[D],
    defined: impl Fn(&D) -> bool,
    is_next: impl Fn(&D, &D) -> bool,
) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    let mut start_new = true;

    for (i, d) in points.iter().enumerate() {
        if !defined(d) {
            start_new = true;
            continue;
        }

        if start_new {
            segments.push(Segment::single(i));
            start_new = false;
        } else if let Some(last) = segments.last_mut() {
            if is_next(&points[last.end], d) {
                last.end = i;
            } else {
                segments.push(Segment::single(i));
            }
        }
    }

    segments
}

/// Split each defined run into runs of points claimed by `target`.
///
/// A point whose own label is `target` always joins. A point with a
/// different label can still be annexed to the open run if the resolver,
/// given the previous point's label and its own, picks `target`; or it
/// can open a fresh one-point run if the resolver, given its own label
/// and the next point's, picks `target`. Boundary points may therefore
/// appear in two different labels' outputs. Lookups never cross a
/// defined-run boundary.
pub fn compute_chunked_segments<D>(
    points: &[D],
    target: &str,
    defined_segments: &[Segment],
    chunk_of: impl Fn(&D) -> String,
    resolver: impl Fn(&str, &str, &[String]) -> String,
    order: &[String],
) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::new();

    for seg in defined_segments {
        // whether the most recently pushed run ends at the previous point
        let mut open = false;

        for i in seg.start..=seg.end {
            let name = chunk_of(&points[i]);

            if name == target {
                extend_or_push(&mut out, i, &mut open);
                continue;
            }

            let mut added = false;
            if i > seg.start {
                let prev_name = chunk_of(&points[i - 1]);
                if resolver(&prev_name, &name, order) == target {
                    extend_or_push(&mut out, i, &mut open);
                    added = true;
                }
            }

            if !added {
                if i < seg.end {
                    let next_name = chunk_of(&points[i + 1]);
                    if resolver(&name, &next_name, order) == target {
                        out.push(Segment::single(i));
                        open = true;
                    } else {
                        open = false;
                    }
                } else {
                    open = false;
                }
            }
        }
    }

    out
}

fn extend_or_push(out: &mut Vec<Segment>, i: usize, open: &mut bool) {
    match out.last_mut() {
        Some(last) if *open => last.end = i,
        _ => out.push(Segment::single(i)),
    }
    *open = true;
}

/// Default boundary resolution: the label with the strictly greater
/// index in `order` claims the point; otherwise the right-hand label
/// does. Labels missing from `order` rank below every listed one.
pub fn default_chunk_area_resolver(left: &str, right: &str, order: &[String]) -> String {
    let index_of = |name: &str| -> isize {
        order
            .iter()
            .position(|n| n == name)
            .map(|i| i as isize)
            .unwrap_or(-1)
    };

    if index_of(left) > index_of(right) {
        left.to_string()
    } else {
        right.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label_of(d: &(f64, &str)) -> String {
        d.1.to_string()
    }

    fn order(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn defined_segments_split_on_undefined_points() {
        let data = [1.0, 2.0, f64::NAN, f64::NAN, 1.0, f64::NAN, 2.0, 3.0];
        let segments =
            compute_defined_segments(&data, |d| !d.is_nan(), |_, _| true);
        assert_eq!(
            segments,
            vec![
                Segment { start: 0, end: 1 },
                Segment { start: 4, end: 4 },
                Segment { start: 6, end: 7 },
            ]
        );
    }

    #[test]
    fn defined_segments_split_on_is_next_rejection() {
        let data = [(0.0, 1.0), (1.0, 2.0), (4.0, 1.0), (6.0, 2.0), (7.0, 3.0)];
        let segments = compute_defined_segments(
            &data,
            |_| true,
            |prev: &(f64, f64), curr: &(f64, f64)| curr.0 == prev.0 + 1.0,
        );
        assert_eq!(
            segments,
            vec![
                Segment { start: 0, end: 1 },
                Segment { start: 2, end: 2 },
                Segment { start: 3, end: 4 },
            ]
        );
    }

    #[test]
    fn empty_input_yields_no_segments() {
        let data: [f64; 0] = [];
        assert!(compute_defined_segments(&data, |_| true, |_, _| true).is_empty());
    }

    #[test]
    fn resolver_prefers_later_declared_label() {
        let names = order(&["area", "gap", "chunk1"]);
        assert_eq!(default_chunk_area_resolver("area", "chunk1", &names), "chunk1");
        assert_eq!(default_chunk_area_resolver("chunk1", "area", &names), "chunk1");
        // equal ranks fall to the right-hand label
        assert_eq!(default_chunk_area_resolver("area", "area", &names), "area");
        // unknown labels rank below everything
        assert_eq!(default_chunk_area_resolver("mystery", "area", &names), "area");
    }

    #[test]
    fn boundary_point_is_annexed_by_higher_priority_chunk() {
        // y > 1 maps to chunk1, otherwise area; chunk1 declared after area
        let data: Vec<(f64, &str)> = vec![
            (2.0, "chunk1"),
            (1.0, "area"),
            (2.0, "chunk1"),
        ];
        let defined = vec![Segment { start: 0, end: 2 }];
        let names = order(&["area", "gap", "chunk1"]);

        let area = compute_chunked_segments(
            &data,
            "area",
            &defined,
            label_of,
            default_chunk_area_resolver,
            &names,
        );
        let chunk1 = compute_chunked_segments(
            &data,
            "chunk1",
            &defined,
            label_of,
            default_chunk_area_resolver,
            &names,
        );

        // the middle point stays a one-point area run, and is also
        // claimed by chunk1 on both sides
        assert_eq!(area, vec![Segment { start: 1, end: 1 }]);
        assert_eq!(chunk1, vec![Segment { start: 0, end: 2 }]);
    }

    #[test]
    fn forward_annexation_opens_a_run_before_the_owning_point() {
        let data: Vec<(f64, &str)> = vec![
            (1.0, "area"),
            (2.0, "chunk1"),
            (1.0, "area"),
            (1.0, "area"),
        ];
        let defined = vec![Segment { start: 0, end: 3 }];
        let names = order(&["area", "gap", "chunk1"]);

        let chunk1 = compute_chunked_segments(
            &data,
            "chunk1",
            &defined,
            label_of,
            default_chunk_area_resolver,
            &names,
        );

        // point 0 anticipates point 1, point 2 is annexed backward
        assert_eq!(chunk1, vec![Segment { start: 0, end: 2 }]);
    }

    #[test]
    fn runs_never_cross_defined_segment_boundaries() {
        let data: Vec<(f64, &str)> = vec![
            (2.0, "chunk1"),
            (2.0, "chunk1"),
            (2.0, "chunk1"),
            (2.0, "chunk1"),
        ];
        let defined = vec![
            Segment { start: 0, end: 1 },
            Segment { start: 2, end: 3 },
        ];
        let names = order(&["area", "gap", "chunk1"]);

        let chunk1 = compute_chunked_segments(
            &data,
            "chunk1",
            &defined,
            label_of,
            default_chunk_area_resolver,
            &names,
        );
        assert_eq!(
            chunk1,
            vec![Segment { start: 0, end: 1 }, Segment { start: 2, end: 3 }]
        );
    }
}
