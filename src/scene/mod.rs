//! Retained scene port.
//!
//! The rendering core only talks to this minimal interface: create and
//! remove nodes, get/set attributes and inline styles, stash per-node
//! numeric data, reorder, and schedule transitions. `SvgScene` is the
//! bundled in-memory implementation with markup serialization and a
//! virtual-clock transition queue.

pub mod svg;

pub use svg::SvgScene;

/// Handle to a scene node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Easing applied to transition progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ease {
    Linear,
    #[default]
    CubicInOut,
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::CubicInOut => {
                let t = t * 2.0;
                if t <= 1.0 {
                    t * t * t / 2.0
                } else {
                    let t = t - 2.0;
                    (t * t * t + 2.0) / 2.0
                }
            }
        }
    }
}

/// Timing for one scheduled transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionSpec {
    pub duration_ms: f64,
    pub delay_ms: f64,
    pub ease: Ease,
}

impl Default for TransitionSpec {
    fn default() -> Self {
        TransitionSpec {
            duration_ms: 250.0,
            delay_ms: 0.0,
            ease: Ease::CubicInOut,
        }
    }
}

/// One scheduled change on a node. Scheduling a change for an
/// attribute that already has a pending change replaces it.
#[derive(Debug, Clone)]
pub enum Change {
    /// Tween an attribute to a target value (numerically when both
    /// ends parse as numbers, otherwise swapped in at completion).
    AttrTo { name: String, to: String },
    /// Morph the `d` attribute to a target outline string.
    PathMorph { to: String },
    /// Remove the node when the transition window completes.
    RemoveAfter,
}

/// Minimal retained-scene interface consumed by the renderer.
pub trait Surface {
    fn append(&mut self, parent: NodeId, tag: &str) -> NodeId;
    fn remove(&mut self, node: NodeId);
    /// Move the node to the end of its parent's child list.
    fn raise(&mut self, node: NodeId);
    fn contains(&self, node: NodeId) -> bool;

    fn add_class(&mut self, node: NodeId, class: &str);
    /// First descendant of `scope` carrying `class`, in document order.
    fn select_class(&self, scope: NodeId, class: &str) -> Option<NodeId>;
    fn select_all_class(&self, scope: NodeId, class: &str) -> Vec<NodeId>;
    fn select_all_tag(&self, scope: NodeId, tag: &str) -> Vec<NodeId>;
    /// Direct children of `parent` with the given tag.
    fn children_by_tag(&self, parent: NodeId, tag: &str) -> Vec<NodeId>;

    fn set_attr(&mut self, node: NodeId, name: &str, value: &str);
    fn attr(&self, node: NodeId, name: &str) -> Option<String>;
    fn set_style(&mut self, node: NodeId, name: &str, value: &str);
    fn style(&self, node: NodeId, name: &str) -> Option<String>;

    /// Per-node numeric data, never serialized. Stands in for datum
    /// binding: segment spans on clip rects, keys on markers.
    fn set_prop(&mut self, node: NodeId, name: &str, value: f64);
    fn prop(&self, node: NodeId, name: &str) -> Option<f64>;

    /// Schedule a change; it is applied as the owner advances the
    /// scene clock. Last writer wins per node and attribute.
    fn schedule(&mut self, node: NodeId, spec: TransitionSpec, change: Change);
}
