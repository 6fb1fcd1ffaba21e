//! Chart configuration.
//!
//! All knobs in one immutable value object, built up through chained
//! setters and passed by reference into rendering. Anything that can
//! vary per point or per series is a tagged constant-or-computed value
//! resolved through one evaluator, never an ad hoc type check.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::segment::default_chunk_area_resolver;
use crate::shape::Curve;

/// Reserved label for the defined region.
pub const AREA_LABEL: &str = "area";
/// Reserved label for the undefined region. Never produced by a chunk
/// accessor; assigned internally.
pub const GAP_LABEL: &str = "gap";

/// A per-point numeric accessor: a constant or a function of the point.
pub enum Coord<D> {
    Constant(f64),
    Computed(Rc<dyn Fn(&D) -> f64>),
}

impl<D> Coord<D> {
    pub fn constant(v: f64) -> Self {
        Coord::Constant(v)
    }

    pub fn computed(f: impl Fn(&D) -> f64 + 'static) -> Self {
        Coord::Computed(Rc::new(f))
    }

    pub fn get(&self, d: &D) -> f64 {
        match self {
            Coord::Constant(v) => *v,
            Coord::Computed(f) => f(d),
        }
    }
}

impl<D> Clone for Coord<D> {
    fn clone(&self) -> Self {
        match self {
            Coord::Constant(v) => Coord::Constant(*v),
            Coord::Computed(f) => Coord::Computed(Rc::clone(f)),
        }
    }
}

/// A per-point boolean accessor.
pub enum Predicate<D> {
    Constant(bool),
    Computed(Rc<dyn Fn(&D) -> bool>),
}

impl<D> Predicate<D> {
    pub fn constant(v: bool) -> Self {
        Predicate::Constant(v)
    }

    pub fn computed(f: impl Fn(&D) -> bool + 'static) -> Self {
        Predicate::Computed(Rc::new(f))
    }

    pub fn get(&self, d: &D) -> bool {
        match self {
            Predicate::Constant(v) => *v,
            Predicate::Computed(f) => f(d),
        }
    }
}

impl<D> Clone for Predicate<D> {
    fn clone(&self) -> Self {
        match self {
            Predicate::Constant(v) => Predicate::Constant(*v),
            Predicate::Computed(f) => Predicate::Computed(Rc::clone(f)),
        }
    }
}

/// A per-point chunk-label accessor.
pub enum Label<D> {
    Constant(String),
    Computed(Rc<dyn Fn(&D) -> String>),
}

impl<D> Label<D> {
    pub fn constant(v: impl Into<String>) -> Self {
        Label::Constant(v.into())
    }

    pub fn computed(f: impl Fn(&D) -> String + 'static) -> Self {
        Label::Computed(Rc::new(f))
    }

    pub fn get(&self, d: &D) -> String {
        match self {
            Label::Constant(v) => v.clone(),
            Label::Computed(f) => f(d),
        }
    }
}

impl<D> Clone for Label<D> {
    fn clone(&self) -> Self {
        match self {
            Label::Constant(v) => Label::Constant(v.clone()),
            Label::Computed(f) => Label::Computed(Rc::clone(f)),
        }
    }
}

/// A style or attribute value: a constant, or a function of the series
/// datum and series index evaluated once per render.
pub enum Value<S> {
    Constant(String),
    Computed(Rc<dyn Fn(&S, usize) -> String>),
}

impl<S> Value<S> {
    pub fn evaluate(&self, data: &S, index: usize) -> String {
        match self {
            Value::Constant(v) => v.clone(),
            Value::Computed(f) => f(data, index),
        }
    }
}

impl<S> Clone for Value<S> {
    fn clone(&self) -> Self {
        match self {
            Value::Constant(v) => Value::Constant(v.clone()),
            Value::Computed(f) => Value::Computed(Rc::clone(f)),
        }
    }
}

/// An ordered set of style or attribute properties.
pub struct PropertySet<S> {
    entries: Vec<(String, Value<S>)>,
}

impl<S> PropertySet<S> {
    pub fn new() -> Self {
        PropertySet { entries: Vec::new() }
    }

    /// Set a constant-valued property, replacing any previous entry.
    pub fn set(mut self, name: &str, value: impl ToString) -> Self {
        self.put(name, Value::Constant(value.to_string()));
        self
    }

    /// Set a computed property, replacing any previous entry.
    pub fn set_with(mut self, name: &str, f: impl Fn(&S, usize) -> String + 'static) -> Self {
        self.put(name, Value::Computed(Rc::new(f)));
        self
    }

    fn put(&mut self, name: &str, value: Value<S>) {
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| n == name) {
            entry.1 = value;
        } else {
            self.entries.push((name.to_string(), value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value<S>> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evaluate every entry into `out`, overriding per property.
    pub(crate) fn evaluate_into(
        &self,
        data: &S,
        index: usize,
        out: &mut BTreeMap<String, String>,
    ) {
        for (name, value) in &self.entries {
            out.insert(name.clone(), value.evaluate(data, index));
        }
    }
}

impl<S> Clone for PropertySet<S> {
    fn clone(&self) -> Self {
        PropertySet { entries: self.entries.clone() }
    }
}

impl<S> Default for PropertySet<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Styling for one chunk label: area and marker, attributes and styles.
pub struct ChunkDefinition<S> {
    pub(crate) styles: PropertySet<S>,
    pub(crate) attrs: PropertySet<S>,
    pub(crate) point_styles: PropertySet<S>,
    pub(crate) point_attrs: PropertySet<S>,
}

impl<S> ChunkDefinition<S> {
    pub fn new() -> Self {
        ChunkDefinition {
            styles: PropertySet::new(),
            attrs: PropertySet::new(),
            point_styles: PropertySet::new(),
            point_attrs: PropertySet::new(),
        }
    }

    pub fn styles(mut self, styles: PropertySet<S>) -> Self {
        self.styles = styles;
        self
    }

    pub fn attrs(mut self, attrs: PropertySet<S>) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn point_styles(mut self, point_styles: PropertySet<S>) -> Self {
        self.point_styles = point_styles;
        self
    }

    pub fn point_attrs(mut self, point_attrs: PropertySet<S>) -> Self {
        self.point_attrs = point_attrs;
        self
    }
}

impl<S> Clone for ChunkDefinition<S> {
    fn clone(&self) -> Self {
        ChunkDefinition {
            styles: self.styles.clone(),
            attrs: self.attrs.clone(),
            point_styles: self.point_styles.clone(),
            point_attrs: self.point_attrs.clone(),
        }
    }
}

impl<S> Default for ChunkDefinition<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// A gap-aware area chart renderer.
///
/// `D` is the point type, read only through the configured accessors.
/// `S` is the series type the points are extracted from; by default a
/// series is simply `Vec<D>`.
pub struct AreaChart<D, S = Vec<D>> {
    pub(crate) x: Coord<D>,
    pub(crate) y0: Coord<D>,
    pub(crate) y1: Coord<D>,
    pub(crate) defined: Predicate<D>,
    pub(crate) is_next: Rc<dyn Fn(&D, &D) -> bool>,
    pub(crate) chunk: Label<D>,
    #[allow(clippy::type_complexity)]
    pub(crate) chunk_area_resolver: Rc<dyn Fn(&str, &str, &[String]) -> String>,
    pub(crate) chunk_definitions: Vec<(String, ChunkDefinition<S>)>,
    pub(crate) curve: Curve,
    pub(crate) area_styles: PropertySet<S>,
    pub(crate) area_attrs: PropertySet<S>,
    pub(crate) gap_styles: PropertySet<S>,
    pub(crate) gap_attrs: PropertySet<S>,
    pub(crate) point_styles: PropertySet<S>,
    pub(crate) point_attrs: PropertySet<S>,
    pub(crate) transition_initial: bool,
    pub(crate) extend_ends: Option<[f64; 2]>,
    #[allow(clippy::type_complexity)]
    pub(crate) access_data: Rc<dyn for<'a> Fn(&'a S) -> &'a [D]>,
    pub(crate) debug: bool,
}

impl AreaChart<(f64, f64)> {
    /// A chart over `(x, y)` pairs with the conventional accessors.
    pub fn new() -> Self {
        Self::with_xy(|d: &(f64, f64)| d.0, |d: &(f64, f64)| d.1)
    }
}

impl Default for AreaChart<(f64, f64)> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: 'static> AreaChart<D, Vec<D>> {
    /// A chart over any point type, given its x and y accessors.
    pub fn with_xy(
        x: impl Fn(&D) -> f64 + 'static,
        y1: impl Fn(&D) -> f64 + 'static,
    ) -> Self {
        Self::with_accessors(x, y1, |series: &Vec<D>| series.as_slice())
    }
}

impl<D: 'static, S: 'static> AreaChart<D, S> {
    /// A chart over any point and series type. `access_data` extracts
    /// the point slice from a series.
    pub fn with_accessors(
        x: impl Fn(&D) -> f64 + 'static,
        y1: impl Fn(&D) -> f64 + 'static,
        access_data: impl for<'a> Fn(&'a S) -> &'a [D] + 'static,
    ) -> Self {
        AreaChart {
            x: Coord::computed(x),
            y0: Coord::constant(0.0),
            y1: Coord::computed(y1),
            defined: Predicate::constant(true),
            is_next: Rc::new(|_, _| true),
            chunk: Label::constant(AREA_LABEL),
            chunk_area_resolver: Rc::new(|left, right, order| {
                default_chunk_area_resolver(left, right, order)
            }),
            chunk_definitions: Vec::new(),
            curve: Curve::Linear,
            area_styles: PropertySet::new(),
            area_attrs: PropertySet::new()
                .set("fill", "#222")
                .set("stroke", "none")
                .set("stroke-width", 0)
                .set("fill-opacity", 1),
            gap_styles: PropertySet::new(),
            gap_attrs: PropertySet::new().set("fill-opacity", 0.35),
            point_styles: PropertySet::new(),
            point_attrs: PropertySet::new(),
            transition_initial: true,
            extend_ends: None,
            access_data: Rc::new(access_data),
            debug: false,
        }
    }

    pub fn x(mut self, f: impl Fn(&D) -> f64 + 'static) -> Self {
        self.x = Coord::computed(f);
        self
    }

    pub fn x_const(mut self, v: f64) -> Self {
        self.x = Coord::constant(v);
        self
    }

    pub fn y0(mut self, f: impl Fn(&D) -> f64 + 'static) -> Self {
        self.y0 = Coord::computed(f);
        self
    }

    pub fn y0_const(mut self, v: f64) -> Self {
        self.y0 = Coord::constant(v);
        self
    }

    pub fn y1(mut self, f: impl Fn(&D) -> f64 + 'static) -> Self {
        self.y1 = Coord::computed(f);
        self
    }

    pub fn y1_const(mut self, v: f64) -> Self {
        self.y1 = Coord::constant(v);
        self
    }

    pub fn defined(mut self, f: impl Fn(&D) -> bool + 'static) -> Self {
        self.defined = Predicate::computed(f);
        self
    }

    pub fn defined_const(mut self, v: bool) -> Self {
        self.defined = Predicate::constant(v);
        self
    }

    /// Whether `curr` directly follows `prev` in the series. Returning
    /// false opens a gap between explicitly defined points.
    pub fn is_next(mut self, f: impl Fn(&D, &D) -> bool + 'static) -> Self {
        self.is_next = Rc::new(f);
        self
    }

    pub fn is_next_const(mut self, v: bool) -> Self {
        self.is_next = Rc::new(move |_, _| v);
        self
    }

    pub fn chunk(mut self, f: impl Fn(&D) -> String + 'static) -> Self {
        self.chunk = Label::computed(f);
        self
    }

    pub fn chunk_const(mut self, label: impl Into<String>) -> Self {
        self.chunk = Label::constant(label);
        self
    }

    /// Decides which of two adjacent labels claims their shared
    /// boundary point, given the resolution order.
    pub fn chunk_area_resolver(
        mut self,
        f: impl Fn(&str, &str, &[String]) -> String + 'static,
    ) -> Self {
        self.chunk_area_resolver = Rc::new(f);
        self
    }

    /// Declare or replace the styling for one chunk label. Declaration
    /// order doubles as boundary-resolution priority.
    pub fn chunk_definition(mut self, label: impl Into<String>, def: ChunkDefinition<S>) -> Self {
        let label = label.into();
        if let Some(entry) = self.chunk_definitions.iter_mut().find(|(n, _)| *n == label) {
            entry.1 = def;
        } else {
            self.chunk_definitions.push((label, def));
        }
        self
    }

    pub fn curve(mut self, curve: Curve) -> Self {
        self.curve = curve;
        self
    }

    pub fn area_styles(mut self, styles: PropertySet<S>) -> Self {
        self.area_styles = styles;
        self
    }

    pub fn area_attrs(mut self, attrs: PropertySet<S>) -> Self {
        self.area_attrs = attrs;
        self
    }

    pub fn gap_styles(mut self, styles: PropertySet<S>) -> Self {
        self.gap_styles = styles;
        self
    }

    pub fn gap_attrs(mut self, attrs: PropertySet<S>) -> Self {
        self.gap_attrs = attrs;
        self
    }

    pub fn point_styles(mut self, styles: PropertySet<S>) -> Self {
        self.point_styles = styles;
        self
    }

    pub fn point_attrs(mut self, attrs: PropertySet<S>) -> Self {
        self.point_attrs = attrs;
        self
    }

    /// Animate the first render up from a flat baseline.
    pub fn transition_initial(mut self, on: bool) -> Self {
        self.transition_initial = on;
        self
    }

    /// Extend the outline to `[min_x, max_x]`, carrying the nearest
    /// real point's y values. Clip rectangles are never extended.
    pub fn extend_ends(mut self, ends: Option<[f64; 2]>) -> Self {
        self.extend_ends = ends;
        self
    }

    /// Render the internal clip rectangles as a visible overlay.
    pub fn debug(mut self, on: bool) -> Self {
        self.debug = on;
        self
    }

    /// Labels in render order (area and gap always lead), or in
    /// declaration order for boundary resolution (area and gap are
    /// prepended only when the user did not declare them).
    pub(crate) fn chunk_names(&self, use_declaration_order: bool) -> Vec<String> {
        let mut names: Vec<String> = self
            .chunk_definitions
            .iter()
            .map(|(n, _)| n.clone())
            .collect();

        let mut prepend_area = true;
        let mut prepend_gap = true;
        if use_declaration_order {
            prepend_area = !names.iter().any(|n| n == AREA_LABEL);
            prepend_gap = !names.iter().any(|n| n == GAP_LABEL);
        }

        if prepend_gap {
            names.insert(0, GAP_LABEL.to_string());
        }
        if prepend_area {
            names.insert(0, AREA_LABEL.to_string());
        }

        let mut seen = std::collections::HashSet::new();
        names.retain(|n| seen.insert(n.clone()));
        names
    }

    pub(crate) fn chunk_definition_for(&self, label: &str) -> Option<&ChunkDefinition<S>> {
        self.chunk_definitions
            .iter()
            .find(|(n, _)| n == label)
            .map(|(_, def)| def)
    }
}

impl<D, S> Clone for AreaChart<D, S> {
    fn clone(&self) -> Self {
        AreaChart {
            x: self.x.clone(),
            y0: self.y0.clone(),
            y1: self.y1.clone(),
            defined: self.defined.clone(),
            is_next: Rc::clone(&self.is_next),
            chunk: self.chunk.clone(),
            chunk_area_resolver: Rc::clone(&self.chunk_area_resolver),
            chunk_definitions: self.chunk_definitions.clone(),
            curve: self.curve,
            area_styles: self.area_styles.clone(),
            area_attrs: self.area_attrs.clone(),
            gap_styles: self.gap_styles.clone(),
            gap_attrs: self.gap_attrs.clone(),
            point_styles: self.point_styles.clone(),
            point_attrs: self.point_attrs.clone(),
            transition_initial: self.transition_initial,
            extend_ends: self.extend_ends,
            access_data: Rc::clone(&self.access_data),
            debug: self.debug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_accessors_ignore_the_point() {
        let x = Coord::<(f64, f64)>::constant(5.0);
        assert_eq!(x.get(&(9.0, 9.0)), 5.0);

        let defined = Predicate::<(f64, f64)>::constant(false);
        assert!(!defined.get(&(9.0, 9.0)));

        let chunk = Label::<(f64, f64)>::constant("my-chunk");
        assert_eq!(chunk.get(&(9.0, 9.0)), "my-chunk");
    }

    #[test]
    fn computed_values_receive_datum_and_index() {
        let v = Value::<Vec<(f64, f64)>>::Computed(Rc::new(|_, i| {
            if i == 0 { "blue".into() } else { "red".into() }
        }));
        let data = vec![(0.0, 0.0)];
        assert_eq!(v.evaluate(&data, 0), "blue");
        assert_eq!(v.evaluate(&data, 1), "red");
    }

    #[test]
    fn property_set_replaces_per_key() {
        let set = PropertySet::<Vec<(f64, f64)>>::new()
            .set("fill", "red")
            .set("fill", "green")
            .set("stroke-width", 2);
        let mut out = BTreeMap::new();
        set.evaluate_into(&vec![], 0, &mut out);
        assert_eq!(out.get("fill").map(String::as_str), Some("green"));
        assert_eq!(out.get("stroke-width").map(String::as_str), Some("2"));
    }

    #[test]
    fn render_order_always_leads_with_area_and_gap() {
        let chart = AreaChart::new()
            .chunk_definition("chunk1", ChunkDefinition::new())
            .chunk_definition("area", ChunkDefinition::new());
        assert_eq!(chart.chunk_names(false), vec!["area", "gap", "chunk1"]);
    }

    #[test]
    fn resolution_order_preserves_declared_positions() {
        let chart = AreaChart::new()
            .chunk_definition("chunk1", ChunkDefinition::new())
            .chunk_definition("area", ChunkDefinition::new());
        // area keeps its declared slot after chunk1; gap is prepended
        assert_eq!(chart.chunk_names(true), vec!["gap", "chunk1", "area"]);
    }

    #[test]
    fn default_order_is_area_gap() {
        let chart = AreaChart::new();
        assert_eq!(chart.chunk_names(false), vec!["area", "gap"]);
        assert_eq!(chart.chunk_names(true), vec!["area", "gap"]);
    }
}
