//! Render orchestration.
//!
//! One pass per series: resolve defined points and extents, evaluate
//! styling, then for every chunk label render its outline, markers and
//! clip rectangles against the retained scene, reusing nodes from the
//! previous render. Animated renders only schedule work on the scene's
//! transition queue and return.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::{AreaChart, AREA_LABEL, GAP_LABEL};
use crate::error::RenderError;
use crate::geometry;
use crate::path::{self, fmt_num};
use crate::scene::{Change, NodeId, Surface, TransitionSpec};
use crate::segment;
use crate::shape::{self, AreaPoint};
use crate::style::{self, parse_px, EvaluatedChunk};

/// Class carried by the defined-region outline.
pub const DEFINED_CLASS: &str = "chunked-area-defined";
/// Class carried by the gap-region outline.
pub const UNDEFINED_CLASS: &str = "chunked-area-undefined";
/// Class of the debug overlay group.
pub const DEBUG_CLASS: &str = "chunked-area-debug";

/// Class carried by every chunk's outline.
pub fn chunk_class(label: &str) -> String {
    format!("chunked-area-chunk-{label}")
}

/// Class carried by a chunk's clip-path node.
pub fn clip_class(label: &str) -> String {
    format!("chunked-area-clip-{label}")
}

// Clip-path ids must stay unique across chart instances sharing a
// document, so the discriminator is process-wide.
static CLIP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// How a render call applies its changes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RenderMode {
    /// Apply everything synchronously.
    #[default]
    Immediate,
    /// Schedule everything on the scene's transition queue.
    Animated(TransitionSpec),
}

impl<D: 'static, S: 'static> AreaChart<D, S> {
    /// Render the series under `root`, reconciling against whatever a
    /// previous render left there. Safe to call repeatedly.
    pub fn render<P: Surface>(
        &self,
        scene: &mut P,
        root: NodeId,
        data: &S,
        mode: RenderMode,
    ) -> Result<(), RenderError> {
        self.render_series(scene, root, data, 0, mode)
    }

    /// Like [`render`](Self::render), with an explicit series index
    /// passed to computed style values.
    pub fn render_series<P: Surface>(
        &self,
        scene: &mut P,
        root: NodeId,
        data: &S,
        series_index: usize,
        mode: RenderMode,
    ) -> Result<(), RenderError> {
        if !scene.contains(root) {
            return Err(RenderError::DetachedRoot);
        }

        let points = (self.access_data)(data);
        let initial = scene.select_class(root, DEFINED_CLASS).is_none();

        // extents over defined points only; the baseline is part of
        // the vertical extent so clip padding always covers it
        let mut x_extent = (f64::NAN, f64::NAN);
        let mut y_extent = (f64::NAN, f64::NAN);
        let mut outline_pts: Vec<AreaPoint> = Vec::new();
        for d in points.iter().filter(|d| self.defined.get(d)) {
            let p = AreaPoint {
                x: self.x.get(d),
                y0: self.y0.get(d),
                y1: self.y1.get(d),
            };
            x_extent = extend_extent(x_extent, p.x);
            y_extent = extend_extent(extend_extent(y_extent, p.y0), p.y1);
            outline_pts.push(p);
        }

        // the outline may extend beyond the data; clip extents never do
        if let Some([min_x, max_x]) = self.extend_ends {
            if let (Some(&first), Some(&last)) = (outline_pts.first(), outline_pts.last()) {
                outline_pts.insert(0, AreaPoint { x: min_x, ..first });
                outline_pts.push(AreaPoint { x: max_x, ..last });
            }
        }

        let evaluated = style::evaluate_definitions(self, data, series_index);

        let defined_segments = segment::compute_defined_segments(
            points,
            |d| self.defined.get(d),
            |prev, curr| (self.is_next)(prev, curr),
        );

        if std::env::var("CHUNKED_AREA_DEBUG_SEGMENTS").is_ok() {
            eprintln!(
                "  Segments    {} point(s), {} defined run(s)",
                points.len(),
                defined_segments.len()
            );
        }

        let resolve_order = self.chunk_names(true);

        for (label, styling) in &evaluated {
            let clip = if label == GAP_LABEL {
                None
            } else {
                Some(self.ensure_clip_path(scene, root, label))
            };

            let mut classes = vec![chunk_class(label)];
            if label == AREA_LABEL {
                classes.insert(0, DEFINED_CLASS.to_string());
            } else if label == GAP_LABEL {
                classes.insert(0, UNDEFINED_CLASS.to_string());
            }

            let path_node = self.render_outline(
                scene,
                root,
                &classes,
                clip.as_ref().map(|(_, id)| id.as_str()),
                &outline_pts,
                styling,
                initial,
                mode,
            );

            if let Some((clip_node, _)) = clip {
                let segments = segment::compute_chunked_segments(
                    points,
                    label,
                    &defined_segments,
                    |d| self.chunk.get(d),
                    |left, right, order| (self.chunk_area_resolver)(left, right, order),
                    &resolve_order,
                );

                let spans: Vec<(f64, f64)> = segments
                    .iter()
                    .map(|s| (self.x.get(&points[s.start]), self.x.get(&points[s.end])))
                    .collect();

                let markers: Vec<&D> = segments
                    .iter()
                    .filter(|s| s.point_count() == 1)
                    .map(|s| &points[s.start])
                    .collect();
                self.render_markers(scene, root, &markers, styling, &classes, initial, mode);

                self.render_clip_rects(
                    scene, root, clip_node, &spans, x_extent, y_extent, styling, path_node,
                    mode,
                );
            }
        }

        // markers sit above every outline, whatever the chunk count
        for circle in scene.select_all_tag(root, "circle") {
            scene.raise(circle);
        }

        Ok(())
    }

    /// Create-once lookup of the clip-path node for a label. The id is
    /// minted on first use and stable afterwards.
    fn ensure_clip_path<P: Surface>(
        &self,
        scene: &mut P,
        root: NodeId,
        label: &str,
    ) -> (NodeId, String) {
        let defs = match scene.select_all_tag(root, "defs").into_iter().next() {
            Some(defs) => defs,
            None => scene.append(root, "defs"),
        };

        let class = clip_class(label);
        if let Some(node) = scene.select_class(defs, &class) {
            let id = scene.attr(node, "id").unwrap_or_default();
            return (node, id);
        }

        let node = scene.append(defs, "clipPath");
        scene.add_class(node, &class);
        let id = format!("{}-{}", class, CLIP_COUNTER.fetch_add(1, Ordering::Relaxed));
        scene.set_attr(node, "id", &id);
        (node, id)
    }

    /// Render one label's continuous outline, morphing from the
    /// current shape when animated.
    #[allow(clippy::too_many_arguments)]
    fn render_outline<P: Surface>(
        &self,
        scene: &mut P,
        root: NodeId,
        classes: &[String],
        clip_id: Option<&str>,
        outline_pts: &[AreaPoint],
        styling: &EvaluatedChunk,
        initial: bool,
        mode: RenderMode,
    ) -> NodeId {
        let node = match scene.select_class(root, &classes[0]) {
            Some(node) => node,
            None => scene.append(root, "path"),
        };

        if let Some(id) = clip_id {
            scene.set_attr(node, "clip-path", &format!("url(#{id})"));
        }

        if initial {
            let start = if self.transition_initial {
                shape::flattened_outline(outline_pts, self.curve)
            } else {
                shape::area_outline(outline_pts, self.curve)
            };
            scene.set_attr(node, "d", &path::to_svg(&start));
        }

        apply_properties(scene, node, styling, false);
        for class in classes {
            scene.add_class(node, class);
        }

        let target = path::to_svg(&shape::area_outline(outline_pts, self.curve));
        match mode {
            RenderMode::Animated(spec) => {
                scene.schedule(node, spec, Change::PathMorph { to: target });
            }
            RenderMode::Immediate => scene.set_attr(node, "d", &target),
        }
        node
    }

    /// Render circle markers for single-point segments, keyed by their
    /// x value so survivors update in place.
    #[allow(clippy::too_many_arguments)]
    fn render_markers<P: Surface>(
        &self,
        scene: &mut P,
        root: NodeId,
        markers: &[&D],
        styling: &EvaluatedChunk,
        classes: &[String],
        initial: bool,
        mode: RenderMode,
    ) {
        let point_classes: Vec<String> = classes.iter().map(|c| format!("{c}-point")).collect();
        let existing = scene.select_all_class(root, &point_classes[0]);
        let keys: Vec<f64> = markers.iter().map(|&d| self.x.get(d)).collect();

        for &node in &existing {
            let stays = scene
                .prop(node, "key")
                .map(|k| keys.contains(&k))
                .unwrap_or(false);
            if stays {
                continue;
            }
            match mode {
                RenderMode::Animated(spec) => {
                    let exit_spec = TransitionSpec {
                        duration_ms: spec.duration_ms * 0.05,
                        ..spec
                    };
                    scene.schedule(
                        node,
                        exit_spec,
                        Change::AttrTo { name: "r".to_string(), to: "0.000001".to_string() },
                    );
                    scene.schedule(node, exit_spec, Change::RemoveAfter);
                }
                RenderMode::Immediate => scene.remove(node),
            }
        }

        let r_final = styling
            .point_attrs
            .get("r")
            .cloned()
            .unwrap_or_else(|| "2".to_string());

        for (&d, &key) in markers.iter().zip(&keys) {
            let cx = fmt_num(self.x.get(d));
            let cy = fmt_num(self.y1.get(d));
            let survivor = existing
                .iter()
                .copied()
                .find(|&n| scene.prop(n, "key") == Some(key));

            match survivor {
                None => {
                    let node = scene.append(root, "circle");
                    apply_properties(scene, node, styling, true);
                    for class in &point_classes {
                        scene.add_class(node, class);
                    }
                    scene.set_prop(node, "key", key);
                    scene.set_attr(node, "cx", &cx);
                    scene.set_attr(node, "cy", &cy);
                    scene.set_attr(node, "r", "0.000001");

                    match mode {
                        // grow in over the tail of the transition so the
                        // outline settles first
                        RenderMode::Animated(spec) if !initial || self.transition_initial => {
                            let enter_duration = spec.duration_ms * 0.15;
                            let enter_spec = TransitionSpec {
                                duration_ms: enter_duration,
                                delay_ms: spec.delay_ms + (spec.duration_ms - enter_duration),
                                ease: spec.ease,
                            };
                            scene.schedule(
                                node,
                                enter_spec,
                                Change::AttrTo { name: "r".to_string(), to: r_final.clone() },
                            );
                        }
                        _ => scene.set_attr(node, "r", &r_final),
                    }
                }
                Some(node) => match mode {
                    RenderMode::Animated(spec) => {
                        scene.schedule(
                            node,
                            spec,
                            Change::AttrTo { name: "r".to_string(), to: r_final.clone() },
                        );
                        scene.schedule(node, spec, Change::AttrTo { name: "cx".to_string(), to: cx });
                        scene.schedule(node, spec, Change::AttrTo { name: "cy".to_string(), to: cy });
                    }
                    RenderMode::Immediate => {
                        scene.set_attr(node, "r", &r_final);
                        scene.set_attr(node, "cx", &cx);
                        scene.set_attr(node, "cy", &cy);
                    }
                },
            }
        }
    }

    /// Reconcile one label's clip rectangles (and the debug overlay)
    /// against the new segment spans.
    #[allow(clippy::too_many_arguments)]
    fn render_clip_rects<P: Surface>(
        &self,
        scene: &mut P,
        root: NodeId,
        clip_node: NodeId,
        spans: &[(f64, f64)],
        x_extent: (f64, f64),
        y_extent: (f64, f64),
        styling: &EvaluatedChunk,
        path_node: NodeId,
        mode: RenderMode,
    ) {
        // stroke width: evaluated styles, the node's inline style,
        // evaluated attrs; anything unresolvable pads by nothing
        let stroke_width = styling
            .styles
            .get("stroke-width")
            .and_then(|v| parse_px(v))
            .or_else(|| scene.style(path_node, "stroke-width").as_deref().and_then(parse_px))
            .or_else(|| styling.attrs.get("stroke-width").and_then(|v| parse_px(v)))
            .unwrap_or(0.0);

        let rects = geometry::clip_rects(spans, x_extent, y_extent, stroke_width);
        let existing = scene.children_by_tag(clip_node, "rect");

        match mode {
            RenderMode::Animated(spec) => {
                // what is visible right now, from the persisted attrs
                let prev_visible: Vec<(f64, f64)> = if existing.is_empty() {
                    vec![x_extent]
                } else {
                    existing
                        .iter()
                        .map(|&n| {
                            let x = scene.attr(n, "x").as_deref().and_then(parse_px).unwrap_or(0.0);
                            let w = scene
                                .attr(n, "width")
                                .as_deref()
                                .and_then(parse_px)
                                .unwrap_or(0.0);
                            (x, x + w)
                        })
                        .collect()
                };
                let next_visible: Vec<(f64, f64)> = if spans.is_empty() {
                    vec![(0.0, 0.0)]
                } else {
                    spans.to_vec()
                };

                // exits shrink into whatever stays visible, then go
                for &node in existing.iter().skip(spans.len()) {
                    let old_span = (
                        scene.prop(node, "span-start").unwrap_or(0.0),
                        scene.prop(node, "span-end").unwrap_or(0.0),
                    );
                    let (start, end) = geometry::visible_span(old_span, &next_visible);
                    scene.schedule(
                        node,
                        spec,
                        Change::AttrTo { name: "x".to_string(), to: fmt_num(start) },
                    );
                    scene.schedule(
                        node,
                        spec,
                        Change::AttrTo { name: "width".to_string(), to: fmt_num(end - start) },
                    );
                    scene.schedule(node, spec, Change::RemoveAfter);
                }

                for (i, (&span, rect)) in spans.iter().zip(&rects).enumerate() {
                    let node = match existing.get(i) {
                        Some(&node) => node,
                        None => {
                            // enters grow out of the previously visible region
                            let node = scene.append(clip_node, "rect");
                            let (start, end) = geometry::visible_span(span, &prev_visible);
                            scene.set_attr(node, "x", &fmt_num(start));
                            scene.set_attr(node, "width", &fmt_num(end - start));
                            scene.set_attr(node, "y", &fmt_num(rect.y0));
                            scene.set_attr(node, "height", &fmt_num(rect.height()));
                            node
                        }
                    };
                    scene.set_prop(node, "span-start", span.0);
                    scene.set_prop(node, "span-end", span.1);
                    for (name, value) in rect_attrs(rect) {
                        scene.schedule(node, spec, Change::AttrTo { name, to: value });
                    }
                }
            }
            RenderMode::Immediate => {
                for &node in existing.iter().skip(spans.len()) {
                    scene.remove(node);
                }
                for (i, (&span, rect)) in spans.iter().zip(&rects).enumerate() {
                    let node = match existing.get(i) {
                        Some(&node) => node,
                        None => scene.append(clip_node, "rect"),
                    };
                    scene.set_prop(node, "span-start", span.0);
                    scene.set_prop(node, "span-end", span.1);
                    for (name, value) in rect_attrs(rect) {
                        scene.set_attr(node, &name, &value);
                    }
                }
            }
        }

        self.render_debug_rects(scene, root, &rects);
    }

    /// Mirror the clip rectangles into a visible overlay when debug
    /// mode is on; drop the overlay when it is off.
    fn render_debug_rects<P: Surface>(&self, scene: &mut P, root: NodeId, rects: &[kurbo::Rect]) {
        let group = scene.select_class(root, DEBUG_CLASS);
        if !self.debug {
            if let Some(group) = group {
                scene.remove(group);
            }
            return;
        }

        let group = match group {
            Some(group) => group,
            None => {
                let group = scene.append(root, "g");
                scene.add_class(group, DEBUG_CLASS);
                group
            }
        };

        let existing = scene.children_by_tag(group, "rect");
        for &node in existing.iter().skip(rects.len()) {
            scene.remove(node);
        }
        for (i, rect) in rects.iter().enumerate() {
            let node = match existing.get(i) {
                Some(&node) => node,
                None => {
                    let node = scene.append(group, "rect");
                    scene.set_style(node, "fill", "rgba(255, 0, 0, 0.3)");
                    scene.set_style(node, "stroke", "rgba(255, 0, 0, 0.6)");
                    node
                }
            };
            for (name, value) in rect_attrs(rect) {
                scene.set_attr(node, &name, &value);
            }
        }
    }
}

fn rect_attrs(rect: &kurbo::Rect) -> [(String, String); 4] {
    [
        ("x".to_string(), fmt_num(rect.x0)),
        ("y".to_string(), fmt_num(rect.y0)),
        ("width".to_string(), fmt_num(rect.width())),
        ("height".to_string(), fmt_num(rect.height())),
    ]
}

/// Apply one evaluated definition's attrs then styles to a node.
fn apply_properties<P: Surface>(
    scene: &mut P,
    node: NodeId,
    styling: &EvaluatedChunk,
    point: bool,
) {
    let (attrs, styles) = if point {
        (&styling.point_attrs, &styling.point_styles)
    } else {
        (&styling.attrs, &styling.styles)
    };
    for (name, value) in attrs {
        scene.set_attr(node, name, value);
    }
    for (name, value) in styles {
        scene.set_style(node, name, value);
    }
}

fn extend_extent(extent: (f64, f64), v: f64) -> (f64, f64) {
    let min = if extent.0.is_nan() || v < extent.0 { v } else { extent.0 };
    let max = if extent.1.is_nan() || v > extent.1 { v } else { extent.1 };
    (min, max)
}
