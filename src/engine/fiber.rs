//! Fiber - One node of the tracked tree.
//!
//! A fiber pairs a declarative description (kind, key, props) with the state
//! cached from the previous render (output node, kids, hooks). Edges are
//! [`FiberId`] handles into the owning [`FiberTree`](super::FiberTree), so a
//! fiber never holds a reference to another fiber.
//!
//! # Edges
//!
//! ```text
//! parent ──child──▶ kid[n-1] ──sibling──▶ kid[n-2] ── … ──▶ kid[0]
//!                   after: None           after: kid[n-1]
//! ```
//!
//! Kids are linked tail to head: `child` is the last kid and `sibling` walks
//! toward the first. `after` points the other way (next in document order)
//! and is the insertion anchor at commit.

use std::rc::Rc;

use super::FiberId;
use super::hooks::Hooks;
use crate::primitives::{Component, Element, ElementKind, Props};
use crate::types::{Key, Lane, NodeHandle, NodeRef, ROOT_TAG};

/// One node of the rendered tree.
#[derive(Debug)]
pub struct Fiber {
    pub(crate) kind: ElementKind,
    pub(crate) key: Option<Key>,
    pub(crate) props: Rc<Props>,
    pub(crate) old_props: Option<Rc<Props>>,
    pub(crate) node: Option<NodeHandle>,
    pub(crate) parent_node: Option<NodeHandle>,
    pub(crate) node_ref: Option<NodeRef>,

    pub(crate) parent: Option<FiberId>,
    pub(crate) child: Option<FiberId>,
    pub(crate) sibling: Option<FiberId>,
    pub(crate) after: Option<FiberId>,
    pub(crate) kids: Vec<FiberId>,

    pub(crate) hooks: Hooks,
    pub(crate) lane: Lane,

    pub(crate) next_effect: Option<FiberId>,
    pub(crate) next_detach: Option<FiberId>,
}

impl Fiber {
    /// Create a fiber for a freshly inserted element.
    pub(crate) fn from_element(element: Element) -> Self {
        Self {
            kind: element.kind,
            key: element.key,
            props: element.props,
            old_props: None,
            node: None,
            parent_node: None,
            node_ref: element.node_ref,
            parent: None,
            child: None,
            sibling: None,
            after: None,
            kids: Vec::new(),
            hooks: Hooks::default(),
            lane: Lane::INSERT,
            next_effect: None,
            next_detach: None,
        }
    }

    /// Create the synthetic root fiber owning an existing container node.
    pub(crate) fn root(container: NodeHandle, props: Rc<Props>) -> Self {
        let mut fiber = Self::from_element(Element::host(ROOT_TAG));
        fiber.props = props;
        fiber.node = Some(container);
        fiber.lane = Lane::NONE;
        fiber
    }

    /// Take over a matched element, keeping node, kids, hooks and ref.
    ///
    /// Mutations a previous batch never committed (it aborted) are carried
    /// over: a pending INSERT stays set, and a pending UPDATE keeps diffing
    /// against the props last applied to the output.
    pub(crate) fn reuse(&mut self, element: Element, lane: Lane) {
        self.kind = element.kind;
        self.key = element.key;
        if self.node_ref.is_none() {
            self.node_ref = element.node_ref;
        }
        let previous = std::mem::replace(&mut self.props, element.props);
        if !self.lane.contains(Lane::UPDATE) || self.old_props.is_none() {
            self.old_props = Some(previous);
        }
        self.lane = lane | (self.lane & (Lane::DIRTY | Lane::INSERT));
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    pub fn is_component(&self) -> bool {
        self.kind.is_component()
    }

    pub fn component(&self) -> Option<&Component> {
        match &self.kind {
            ElementKind::Component(component) => Some(component),
            ElementKind::Host(_) => None,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        self.kind.tag()
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn old_props(&self) -> Option<&Props> {
        self.old_props.as_deref()
    }

    /// Whether attributes changed since the previous render.
    ///
    /// A fiber without previous props has nothing to diff against: its
    /// attributes were applied when the node was created.
    pub fn props_changed(&self) -> bool {
        self.old_props
            .as_deref()
            .is_some_and(|old| old.attrs_differ(&self.props))
    }

    pub fn node(&self) -> Option<NodeHandle> {
        self.node
    }

    pub fn parent_node(&self) -> Option<NodeHandle> {
        self.parent_node
    }

    pub fn node_ref(&self) -> Option<&NodeRef> {
        self.node_ref.as_ref()
    }

    pub fn lane(&self) -> Lane {
        self.lane
    }

    pub fn is_svg(&self) -> bool {
        self.lane.contains(Lane::SVG)
    }

    pub fn parent(&self) -> Option<FiberId> {
        self.parent
    }

    pub fn child(&self) -> Option<FiberId> {
        self.child
    }

    pub fn sibling(&self) -> Option<FiberId> {
        self.sibling
    }

    /// Next sibling in document order.
    pub fn after(&self) -> Option<FiberId> {
        self.after
    }

    /// Kids in document order, as produced by the last diff.
    pub fn kids(&self) -> &[FiberId] {
        &self.kids
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }
}
