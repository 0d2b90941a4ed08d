//! Fiber Tree - Arena that owns every fiber.
//!
//! Fibers are addressed by generational [`FiberId`] handles. A handle to a
//! released fiber simply stops resolving, so queued work that outlives its
//! fiber is detected instead of dangling.
//!
//! The tree also threads two intrusive singly-linked lists through fibers
//! for the active batch:
//! - the effect chain (host fibers in bubble order, walked by commit)
//! - the detach list (fibers classified REMOVE)

use std::ops::{Index, IndexMut};

use slotmap::SlotMap;

use super::FiberId;
use super::fiber::Fiber;
use crate::types::{Lane, NodeHandle};

// =============================================================================
// FiberList
// =============================================================================

/// Head/tail of an intrusive list threaded through fibers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FiberList {
    head: Option<FiberId>,
    tail: Option<FiberId>,
    len: usize,
}

impl FiberList {
    pub fn head(&self) -> Option<FiberId> {
        self.head
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Iterator over an intrusive list.
pub struct Chain<'a> {
    tree: &'a FiberTree,
    next: Option<FiberId>,
    link: fn(&Fiber) -> Option<FiberId>,
}

impl Iterator for Chain<'_> {
    type Item = FiberId;

    fn next(&mut self) -> Option<FiberId> {
        let current = self.next?;
        self.next = self.tree.get(current).and_then(self.link);
        Some(current)
    }
}

// =============================================================================
// FiberTree
// =============================================================================

/// Arena of fibers.
#[derive(Debug, Default)]
pub struct FiberTree {
    fibers: SlotMap<FiberId, Fiber>,
}

impl FiberTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, fiber: Fiber) -> FiberId {
        self.fibers.insert(fiber)
    }

    pub fn get(&self, id: FiberId) -> Option<&Fiber> {
        self.fibers.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: FiberId) -> Option<&mut Fiber> {
        self.fibers.get_mut(id)
    }

    pub fn contains(&self, id: FiberId) -> bool {
        self.fibers.contains_key(id)
    }

    /// Number of live fibers.
    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fibers.is_empty()
    }

    // -------------------------------------------------------------------------
    // Structural queries
    // -------------------------------------------------------------------------

    /// Output node of the nearest non-component ancestor.
    pub fn parent_host_node(&self, id: FiberId) -> Option<NodeHandle> {
        let mut current = self.get(id)?.parent;
        while let Some(parent) = current {
            let fiber = self.get(parent)?;
            if !fiber.is_component() {
                return fiber.node;
            }
            current = fiber.parent;
        }
        None
    }

    /// First host fiber found by following `child` edges down from a component.
    pub fn tail_host(&self, id: FiberId) -> Option<FiberId> {
        let mut current = self.get(id)?.child;
        while let Some(kid) = current {
            let fiber = self.get(kid)?;
            if !fiber.is_component() {
                return Some(kid);
            }
            current = fiber.child;
        }
        None
    }

    /// First output node of a subtree in document order.
    pub fn first_host_node(&self, id: FiberId) -> Option<NodeHandle> {
        let fiber = self.get(id)?;
        if !fiber.is_component() {
            return fiber.node;
        }
        fiber.kids.iter().find_map(|&kid| self.first_host_node(kid))
    }

    /// Output node that `id` must be inserted before, or `None` to append.
    ///
    /// Walks `after` edges until a sibling with an output node is found.
    /// When the siblings run out inside a component, the walk continues from
    /// that component's own `after`, up to the nearest host parent.
    pub fn anchor(&self, id: FiberId) -> Option<NodeHandle> {
        let mut current = id;
        loop {
            let fiber = self.get(current)?;
            let mut next = fiber.after;
            while let Some(sibling) = next {
                if let Some(node) = self.first_host_node(sibling) {
                    return Some(node);
                }
                next = self.get(sibling)?.after;
            }

            let parent = fiber.parent?;
            if !self.get(parent)?.is_component() {
                return None;
            }
            current = parent;
        }
    }

    /// Top-level output nodes of a subtree (what removal must detach).
    pub fn host_roots(&self, id: FiberId) -> Vec<NodeHandle> {
        self.host_root_fibers(id)
            .into_iter()
            .filter_map(|host| self.get(host).and_then(|fiber| fiber.node))
            .collect()
    }

    /// Outermost host fibers of a subtree, looking through components.
    pub fn host_root_fibers(&self, id: FiberId) -> Vec<FiberId> {
        let mut roots = Vec::new();
        self.collect_host_roots(id, &mut roots);
        roots
    }

    fn collect_host_roots(&self, id: FiberId, roots: &mut Vec<FiberId>) {
        let Some(fiber) = self.get(id) else { return };
        if fiber.is_component() {
            for &kid in &fiber.kids {
                self.collect_host_roots(kid, roots);
            }
        } else {
            roots.push(id);
        }
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Replace `parent`'s kids and relink every edge to match.
    ///
    /// Kids inherit the parent's SVG lane.
    pub(crate) fn link_kids(&mut self, parent: FiberId, kids: Vec<FiberId>) {
        let svg = self[parent].lane & Lane::SVG;
        let mut next_in_order: Option<FiberId> = None;

        self[parent].child = None;
        for &kid in kids.iter().rev() {
            let fiber = &mut self[kid];
            fiber.parent = Some(parent);
            fiber.sibling = None;
            fiber.after = next_in_order;
            fiber.lane |= svg;

            match next_in_order {
                None => self[parent].child = Some(kid),
                Some(previous) => self[previous].sibling = Some(kid),
            }
            next_in_order = Some(kid);
        }
        self[parent].kids = kids;
    }

    pub(crate) fn push_effect(&mut self, list: &mut FiberList, id: FiberId) {
        self[id].next_effect = None;
        match list.tail {
            Some(tail) => self[tail].next_effect = Some(id),
            None => list.head = Some(id),
        }
        list.tail = Some(id);
        list.len += 1;
    }

    pub(crate) fn push_detach(&mut self, list: &mut FiberList, id: FiberId) {
        self[id].next_detach = None;
        match list.tail {
            Some(tail) => self[tail].next_detach = Some(id),
            None => list.head = Some(id),
        }
        list.tail = Some(id);
        list.len += 1;
    }

    /// Walk an effect chain from its head.
    pub fn effects(&self, list: &FiberList) -> Chain<'_> {
        Chain {
            tree: self,
            next: list.head,
            link: |fiber| fiber.next_effect,
        }
    }

    /// Walk a detach list from its head.
    pub fn detached(&self, list: &FiberList) -> Chain<'_> {
        Chain {
            tree: self,
            next: list.head,
            link: |fiber| fiber.next_detach,
        }
    }

    /// Remove a whole subtree from the arena, returning its fibers.
    pub(crate) fn release(&mut self, id: FiberId) -> Vec<Fiber> {
        let mut released = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(fiber) = self.fibers.remove(current) {
                stack.extend(fiber.kids.iter().copied());
                released.push(fiber);
            }
        }
        released
    }
}

impl Index<FiberId> for FiberTree {
    type Output = Fiber;

    fn index(&self, id: FiberId) -> &Fiber {
        &self.fibers[id]
    }
}

impl IndexMut<FiberId> for FiberTree {
    fn index_mut(&mut self, id: FiberId) -> &mut Fiber {
        &mut self.fibers[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{Component, Element};

    fn host(tree: &mut FiberTree, tag: &str, node: u64) -> FiberId {
        let mut fiber = Fiber::from_element(Element::host(tag));
        fiber.node = Some(NodeHandle(node));
        tree.insert(fiber)
    }

    fn component(tree: &mut FiberTree, c: &Component) -> FiberId {
        tree.insert(Fiber::from_element(Element::component(c)))
    }

    #[test]
    fn test_link_kids_edges() {
        let mut tree = FiberTree::new();
        let parent = host(&mut tree, "ul", 1);
        let a = host(&mut tree, "li", 2);
        let b = host(&mut tree, "li", 3);
        let c = host(&mut tree, "li", 4);

        tree.link_kids(parent, vec![a, b, c]);

        assert_eq!(tree[parent].child(), Some(c));
        assert_eq!(tree[c].sibling(), Some(b));
        assert_eq!(tree[b].sibling(), Some(a));
        assert_eq!(tree[a].sibling(), None);

        assert_eq!(tree[a].after(), Some(b));
        assert_eq!(tree[c].after(), None);
        assert_eq!(tree[b].parent(), Some(parent));
        assert_eq!(tree[parent].kids(), &[a, b, c]);

        // Relinking with fewer kids leaves no stale edges
        tree.link_kids(parent, vec![b]);
        assert_eq!(tree[parent].child(), Some(b));
        assert_eq!(tree[b].sibling(), None);
        assert_eq!(tree[b].after(), None);

        tree.link_kids(parent, Vec::new());
        assert_eq!(tree[parent].child(), None);
    }

    #[test]
    fn test_svg_lane_inherited() {
        let mut tree = FiberTree::new();
        let svg = host(&mut tree, "svg", 1);
        tree[svg].lane |= Lane::SVG;
        let path = host(&mut tree, "path", 2);
        tree.link_kids(svg, vec![path]);
        assert!(tree[path].is_svg());
    }

    #[test]
    fn test_host_queries_through_components() {
        let mut tree = FiberTree::new();
        let wrapper = Component::new("Wrapper", |_, _| ());

        let root = host(&mut tree, "div", 1);
        let comp = component(&mut tree, &wrapper);
        let inner = host(&mut tree, "span", 2);
        let tail = host(&mut tree, "b", 3);
        let next = host(&mut tree, "i", 4);

        tree.link_kids(root, vec![comp, next]);
        tree.link_kids(comp, vec![inner, tail]);

        assert_eq!(tree.parent_host_node(inner), Some(NodeHandle(1)));
        assert_eq!(tree.tail_host(comp), Some(tail));
        assert_eq!(tree.first_host_node(comp), Some(NodeHandle(2)));
        assert_eq!(tree.host_roots(comp), vec![NodeHandle(2), NodeHandle(3)]);
        assert_eq!(tree.host_root_fibers(comp), vec![inner, tail]);

        // `inner` is followed by `tail` inside the component
        assert_eq!(tree.anchor(inner), Some(NodeHandle(3)));
        // The component itself is followed by `next`
        assert_eq!(tree.anchor(comp), Some(NodeHandle(4)));
        assert_eq!(tree.anchor(next), None);
    }

    #[test]
    fn test_anchor_climbs_out_of_component() {
        let mut tree = FiberTree::new();
        let outer = Component::new("Outer", |_, _| ());
        let empty = Component::new("Empty", |_, _| ());

        let root = host(&mut tree, "div", 1);
        let comp = component(&mut tree, &outer);
        let head = host(&mut tree, "h1", 2);
        let nothing = component(&mut tree, &empty);
        let next = host(&mut tree, "s", 3);

        tree.link_kids(root, vec![comp, next]);
        tree.link_kids(comp, vec![head, nothing]);

        // The trailing kid renders nothing, so no host carries `comp.after`
        assert_eq!(tree.tail_host(comp), None);
        assert_eq!(tree.anchor(head), Some(NodeHandle(3)));
        assert_eq!(tree.anchor(nothing), Some(NodeHandle(3)));
        assert_eq!(tree.anchor(next), None);
    }

    #[test]
    fn test_lists_and_release() {
        let mut tree = FiberTree::new();
        let parent = host(&mut tree, "div", 1);
        let a = host(&mut tree, "p", 2);
        let b = host(&mut tree, "p", 3);
        tree.link_kids(parent, vec![a, b]);

        let mut effects = FiberList::default();
        tree.push_effect(&mut effects, b);
        tree.push_effect(&mut effects, a);
        tree.push_effect(&mut effects, parent);
        assert_eq!(tree.effects(&effects).collect::<Vec<_>>(), vec![b, a, parent]);
        assert_eq!(effects.len(), 3);

        let released = tree.release(parent);
        assert_eq!(released.len(), 3);
        assert!(tree.is_empty());
        assert!(tree.get(a).is_none());
    }
}
