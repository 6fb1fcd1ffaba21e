//! In-memory SVG scene.
//!
//! Arena-backed node tree with deterministic markup serialization and
//! a virtual-clock transition queue. Rendering schedules changes; the
//! owner drives time with `advance` or completes everything with
//! `settle`, so a render call never blocks on an animation.

use std::collections::BTreeMap;
use std::fmt::Write;

use super::{Change, NodeId, Surface, TransitionSpec};
use crate::path::{fmt_num, PathInterpolator};

#[derive(Debug, Clone, Default)]
struct NodeData {
    tag: String,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    styles: BTreeMap<String, String>,
    props: BTreeMap<String, f64>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    alive: bool,
}

#[derive(Debug, Clone)]
enum Tween {
    Attr {
        name: String,
        from: Option<f64>,
        to_num: Option<f64>,
        to: String,
    },
    Path(PathInterpolator),
    Remove,
}

impl Tween {
    fn key(&self) -> &str {
        match self {
            Tween::Attr { name, .. } => name,
            Tween::Path(_) => "d",
            Tween::Remove => "\u{0}remove",
        }
    }
}

#[derive(Debug, Clone)]
struct Scheduled {
    node: NodeId,
    start_ms: f64,
    spec: TransitionSpec,
    tween: Tween,
}

/// An SVG document tree that can be rendered into and serialized.
pub struct SvgScene {
    nodes: Vec<NodeData>,
    clock_ms: f64,
    pending: Vec<Scheduled>,
}

impl SvgScene {
    /// A scene holding a single empty `<svg>` root.
    pub fn new() -> Self {
        let root = NodeData {
            tag: "svg".to_string(),
            alive: true,
            ..NodeData::default()
        };
        SvgScene {
            nodes: vec![root],
            clock_ms: 0.0,
            pending: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.0).filter(|n| n.alive)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id.0).filter(|n| n.alive)
    }

    fn collect_subtree(
        &self,
        scope: NodeId,
        matches: &impl Fn(&NodeData) -> bool,
        out: &mut Vec<NodeId>,
    ) {
        let Some(node) = self.node(scope) else { return };
        for &child in &node.children {
            if let Some(data) = self.node(child) {
                if matches(data) {
                    out.push(child);
                }
                self.collect_subtree(child, matches, out);
            }
        }
    }

    fn kill_subtree(&mut self, id: NodeId) {
        let children = match self.nodes.get_mut(id.0) {
            Some(n) if n.alive => {
                n.alive = false;
                std::mem::take(&mut n.children)
            }
            _ => return,
        };
        for child in children {
            self.kill_subtree(child);
        }
    }

    /// Advance the virtual clock, applying every pending transition at
    /// its new progress. Completed transitions are dropped.
    pub fn advance(&mut self, dt_ms: f64) {
        self.clock_ms += dt_ms;
        let clock = self.clock_ms;
        let pending = std::mem::take(&mut self.pending);
        let mut keep = Vec::new();
        for scheduled in pending {
            let raw = progress(clock, &scheduled);
            self.apply(&scheduled, raw);
            if raw < 1.0 {
                keep.push(scheduled);
            }
        }
        self.pending = keep;
    }

    /// Complete every pending transition immediately.
    pub fn settle(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for scheduled in pending {
            self.apply(&scheduled, 1.0);
        }
    }

    /// Number of transitions still in flight.
    pub fn pending_transitions(&self) -> usize {
        self.pending.len()
    }

    fn apply(&mut self, scheduled: &Scheduled, raw: f64) {
        if self.node(scheduled.node).is_none() {
            return;
        }
        let eased = scheduled.spec.ease.apply(raw);
        match &scheduled.tween {
            Tween::Attr { name, from, to_num, to } => {
                if raw >= 1.0 {
                    self.set_attr(scheduled.node, name, to);
                } else if let (Some(a), Some(b)) = (from, to_num) {
                    let v = a + (b - a) * eased;
                    self.set_attr(scheduled.node, name, &fmt_num(v));
                }
            }
            Tween::Path(interp) => {
                let t = if raw >= 1.0 { 1.0 } else { eased };
                let d = interp.at(t);
                self.set_attr(scheduled.node, "d", &d);
            }
            Tween::Remove => {
                if raw >= 1.0 {
                    self.remove(scheduled.node);
                }
            }
        }
    }

    /// Serialize the whole document.
    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        self.write_node(self.root(), &mut out);
        out
    }

    /// Serialize one node, including its subtree.
    pub fn outer_svg(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_node(node, &mut out);
        out
    }

    /// Serialize a node's children only.
    pub fn inner_svg(&self, node: NodeId) -> String {
        let mut out = String::new();
        if let Some(data) = self.node(node) {
            for &child in &data.children {
                self.write_node(child, &mut out);
            }
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else { return };
        out.push('<');
        out.push_str(&node.tag);
        if !node.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", escape(&node.classes.join(" ")));
        }
        for (name, value) in &node.attrs {
            let _ = write!(out, " {}=\"{}\"", name, escape(value));
        }
        if !node.styles.is_empty() {
            let joined: Vec<String> = node
                .styles
                .iter()
                .map(|(k, v)| format!("{}: {}", k, v))
                .collect();
            let _ = write!(out, " style=\"{}\"", escape(&joined.join("; ")));
        }
        if node.children.is_empty() {
            out.push_str("/>");
        } else {
            out.push('>');
            for &child in &node.children {
                self.write_node(child, out);
            }
            let _ = write!(out, "</{}>", node.tag);
        }
    }
}

impl Default for SvgScene {
    fn default() -> Self {
        Self::new()
    }
}

fn progress(clock: f64, scheduled: &Scheduled) -> f64 {
    if scheduled.spec.duration_ms <= 0.0 {
        return 1.0;
    }
    let elapsed = clock - scheduled.start_ms - scheduled.spec.delay_ms;
    (elapsed / scheduled.spec.duration_ms).clamp(0.0, 1.0)
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

impl Surface for SvgScene {
    fn append(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            tag: tag.to_string(),
            parent: Some(parent),
            alive: true,
            ..NodeData::default()
        });
        if let Some(p) = self.node_mut(parent) {
            p.children.push(id);
        }
        id
    }

    fn remove(&mut self, node: NodeId) {
        let parent = self.node(node).and_then(|n| n.parent);
        if let Some(parent) = parent {
            if let Some(p) = self.node_mut(parent) {
                p.children.retain(|&c| c != node);
            }
        }
        self.kill_subtree(node);
        self.pending.retain(|s| self.nodes[s.node.0].alive);
    }

    fn raise(&mut self, node: NodeId) {
        let Some(parent) = self.node(node).and_then(|n| n.parent) else { return };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|&c| c != node);
            p.children.push(node);
        }
    }

    fn contains(&self, node: NodeId) -> bool {
        self.node(node).is_some()
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(n) = self.node_mut(node) {
            if !n.classes.iter().any(|c| c == class) {
                n.classes.push(class.to_string());
            }
        }
    }

    fn select_class(&self, scope: NodeId, class: &str) -> Option<NodeId> {
        self.select_all_class(scope, class).into_iter().next()
    }

    fn select_all_class(&self, scope: NodeId, class: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_subtree(scope, &|n| n.classes.iter().any(|c| c == class), &mut out);
        out
    }

    fn select_all_tag(&self, scope: NodeId, tag: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_subtree(scope, &|n| n.tag == tag, &mut out);
        out
    }

    fn children_by_tag(&self, parent: NodeId, tag: &str) -> Vec<NodeId> {
        let Some(node) = self.node(parent) else { return Vec::new() };
        node.children
            .iter()
            .copied()
            .filter(|&c| self.node(c).map(|n| n.tag == tag).unwrap_or(false))
            .collect()
    }

    fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(n) = self.node_mut(node) {
            n.attrs.insert(name.to_string(), value.to_string());
        }
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.node(node).and_then(|n| n.attrs.get(name).cloned())
    }

    fn set_style(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(n) = self.node_mut(node) {
            n.styles.insert(name.to_string(), value.to_string());
        }
    }

    fn style(&self, node: NodeId, name: &str) -> Option<String> {
        self.node(node).and_then(|n| n.styles.get(name).cloned())
    }

    fn set_prop(&mut self, node: NodeId, name: &str, value: f64) {
        if let Some(n) = self.node_mut(node) {
            n.props.insert(name.to_string(), value);
        }
    }

    fn prop(&self, node: NodeId, name: &str) -> Option<f64> {
        self.node(node).and_then(|n| n.props.get(name).copied())
    }

    fn schedule(&mut self, node: NodeId, spec: TransitionSpec, change: Change) {
        if self.node(node).is_none() {
            return;
        }
        let tween = match change {
            Change::AttrTo { name, to } => {
                let from = self.attr(node, &name).and_then(|v| v.parse().ok());
                let to_num = to.parse().ok();
                Tween::Attr { name, from, to_num, to }
            }
            Change::PathMorph { to } => {
                let from = self.attr(node, "d").unwrap_or_default();
                match PathInterpolator::new(&from, &to) {
                    Ok(interp) => Tween::Path(interp),
                    // unparseable endpoint: swap in the target at the end
                    Err(_) => Tween::Attr {
                        name: "d".to_string(),
                        from: None,
                        to_num: None,
                        to,
                    },
                }
            }
            Change::RemoveAfter => Tween::Remove,
        };

        let key = tween.key().to_string();
        self.pending
            .retain(|s| !(s.node == node && s.tween.key() == key));
        self.pending.push(Scheduled {
            node,
            start_ms: self.clock_ms,
            spec,
            tween,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Ease;

    #[test]
    fn append_select_and_serialize() {
        let mut scene = SvgScene::new();
        let root = scene.root();
        let g = scene.append(root, "g");
        let path = scene.append(g, "path");
        scene.add_class(path, "outline");
        scene.set_attr(path, "d", "M0,0L1,1");
        scene.set_style(path, "stroke", "red");

        assert_eq!(scene.select_class(root, "outline"), Some(path));
        assert_eq!(
            scene.to_svg(),
            "<svg><g><path class=\"outline\" d=\"M0,0L1,1\" style=\"stroke: red\"/></g></svg>"
        );
    }

    #[test]
    fn remove_detaches_the_subtree() {
        let mut scene = SvgScene::new();
        let root = scene.root();
        let g = scene.append(root, "g");
        let circle = scene.append(g, "circle");
        scene.remove(g);

        assert!(!scene.contains(g));
        assert!(!scene.contains(circle));
        assert_eq!(scene.to_svg(), "<svg/>");
    }

    #[test]
    fn raise_moves_to_end_of_parent() {
        let mut scene = SvgScene::new();
        let root = scene.root();
        let a = scene.append(root, "path");
        let _b = scene.append(root, "circle");
        let c = scene.append(root, "path");
        scene.raise(a);

        assert_eq!(scene.children_by_tag(root, "path"), vec![c, a]);
        assert_eq!(scene.to_svg(), "<svg><circle/><path/><path/></svg>");
    }

    #[test]
    fn numeric_attr_tween_interpolates_and_lands_exactly() {
        let mut scene = SvgScene::new();
        let root = scene.root();
        let rect = scene.append(root, "rect");
        scene.set_attr(rect, "x", "0");
        scene.schedule(
            rect,
            TransitionSpec { duration_ms: 100.0, delay_ms: 0.0, ease: Ease::Linear },
            Change::AttrTo { name: "x".to_string(), to: "10".to_string() },
        );

        scene.advance(50.0);
        assert_eq!(scene.attr(rect, "x").unwrap(), "5");
        scene.advance(50.0);
        assert_eq!(scene.attr(rect, "x").unwrap(), "10");
        assert_eq!(scene.pending_transitions(), 0);
    }

    #[test]
    fn rescheduling_replaces_the_pending_change() {
        let mut scene = SvgScene::new();
        let root = scene.root();
        let rect = scene.append(root, "rect");
        scene.set_attr(rect, "x", "0");
        let spec = TransitionSpec { duration_ms: 100.0, delay_ms: 0.0, ease: Ease::Linear };
        scene.schedule(rect, spec, Change::AttrTo { name: "x".into(), to: "10".into() });
        scene.schedule(rect, spec, Change::AttrTo { name: "x".into(), to: "20".into() });

        assert_eq!(scene.pending_transitions(), 1);
        scene.settle();
        assert_eq!(scene.attr(rect, "x").unwrap(), "20");
    }

    #[test]
    fn remove_after_waits_for_its_window() {
        let mut scene = SvgScene::new();
        let root = scene.root();
        let rect = scene.append(root, "rect");
        scene.schedule(
            rect,
            TransitionSpec { duration_ms: 100.0, delay_ms: 0.0, ease: Ease::Linear },
            Change::RemoveAfter,
        );

        scene.advance(50.0);
        assert!(scene.contains(rect));
        scene.advance(60.0);
        assert!(!scene.contains(rect));
    }

    #[test]
    fn delay_defers_the_start() {
        let mut scene = SvgScene::new();
        let root = scene.root();
        let rect = scene.append(root, "rect");
        scene.set_attr(rect, "x", "0");
        scene.schedule(
            rect,
            TransitionSpec { duration_ms: 100.0, delay_ms: 100.0, ease: Ease::Linear },
            Change::AttrTo { name: "x".into(), to: "10".into() },
        );

        scene.advance(100.0);
        assert_eq!(scene.attr(rect, "x").unwrap(), "0");
        scene.advance(50.0);
        assert_eq!(scene.attr(rect, "x").unwrap(), "5");
    }
}
