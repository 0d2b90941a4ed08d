//! In-memory renderer.
//!
//! Keeps a plain node table and counts every mutation, which makes it the
//! reference backend for tests and for embedding without a display.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::rc::Rc;

use super::Renderer;
use crate::engine::Fiber;
use crate::error::CommitError;
use crate::pipeline::CommitView;
use crate::types::{Lane, NodeHandle, PropValue, TEXT_ATTR, TEXT_TAG};

/// One output node.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryNode {
    pub tag: Rc<str>,
    pub attrs: BTreeMap<Rc<str>, PropValue>,
    pub svg: bool,
    pub children: Vec<NodeHandle>,
    pub parent: Option<NodeHandle>,
}

/// Mutation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub created: usize,
    pub updated: usize,
    /// First placement of a node.
    pub inserted: usize,
    /// Re-placement of an already attached node.
    pub moved: usize,
    pub removed: usize,
}

/// Renderer backed by a node table.
#[derive(Debug, Default)]
pub struct MemoryRenderer {
    nodes: HashMap<NodeHandle, MemoryNode>,
    next_id: u64,
    stats: RenderStats,
}

impl MemoryRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a container node to render into.
    pub fn create_container(&mut self, tag: &str) -> NodeHandle {
        self.alloc(MemoryNode {
            tag: Rc::from(tag),
            attrs: BTreeMap::new(),
            svg: false,
            children: Vec::new(),
            parent: None,
        })
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&MemoryNode> {
        self.nodes.get(&handle)
    }

    pub fn children_of(&self, handle: NodeHandle) -> &[NodeHandle] {
        self.nodes
            .get(&handle)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    /// Number of live nodes (containers included).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = RenderStats::default();
    }

    /// Concatenated text of every text leaf under `handle`.
    pub fn text_content(&self, handle: NodeHandle) -> String {
        let mut out = String::new();
        self.collect_text(handle, &mut out);
        out
    }

    /// Markup-like dump of the subtree under `handle`, excluding `handle` itself.
    pub fn serialize(&self, handle: NodeHandle) -> String {
        let mut out = String::new();
        for &child in self.children_of(handle) {
            self.write_node(child, &mut out);
        }
        out
    }

    fn collect_text(&self, handle: NodeHandle, out: &mut String) {
        let Some(node) = self.nodes.get(&handle) else { return };
        if &*node.tag == TEXT_TAG {
            if let Some(value) = node.attrs.get(TEXT_ATTR) {
                let _ = write!(out, "{value}");
            }
            return;
        }
        for &child in &node.children {
            self.collect_text(child, out);
        }
    }

    fn write_node(&self, handle: NodeHandle, out: &mut String) {
        let Some(node) = self.nodes.get(&handle) else { return };
        if &*node.tag == TEXT_TAG {
            if let Some(value) = node.attrs.get(TEXT_ATTR) {
                let _ = write!(out, "{value}");
            }
            return;
        }
        let _ = write!(out, "<{}", node.tag);
        for (name, value) in &node.attrs {
            let _ = write!(out, " {name}=\"{value}\"");
        }
        out.push('>');
        for &child in &node.children {
            self.write_node(child, out);
        }
        let _ = write!(out, "</{}>", node.tag);
    }

    fn alloc(&mut self, node: MemoryNode) -> NodeHandle {
        self.next_id += 1;
        let handle = NodeHandle(self.next_id);
        self.nodes.insert(handle, node);
        handle
    }

    fn node_mut(&mut self, handle: NodeHandle) -> Result<&mut MemoryNode, CommitError> {
        self.nodes.get_mut(&handle).ok_or(CommitError::UnknownNode(handle))
    }

    fn update(&mut self, handle: NodeHandle, fiber: &Fiber) -> Result<(), CommitError> {
        let attrs = collect_attrs(fiber);
        self.node_mut(handle)?.attrs = attrs;
        self.stats.updated += 1;
        Ok(())
    }

    fn insert(
        &mut self,
        parent: NodeHandle,
        handle: NodeHandle,
        anchor: Option<NodeHandle>,
    ) -> Result<(), CommitError> {
        let previous = self.node_mut(handle)?.parent;

        if let Some(old_parent) = previous {
            let siblings = &mut self.node_mut(old_parent)?.children;
            if let Some(index) = siblings.iter().position(|&c| c == handle) {
                // Already right before the anchor: nothing to move
                if old_parent == parent && siblings.get(index + 1).copied() == anchor {
                    return Ok(());
                }
                siblings.remove(index);
            }
        }

        let children = &mut self.node_mut(parent)?.children;
        let at = match anchor {
            Some(anchor) => children
                .iter()
                .position(|&c| c == anchor)
                .ok_or(CommitError::AnchorNotAttached { parent, anchor })?,
            None => children.len(),
        };
        children.insert(at, handle);
        self.node_mut(handle)?.parent = Some(parent);

        if previous.is_some() {
            self.stats.moved += 1;
        } else {
            self.stats.inserted += 1;
        }
        Ok(())
    }

    fn remove(&mut self, handle: NodeHandle) -> Result<(), CommitError> {
        let parent = self.node_mut(handle)?.parent;
        if let Some(parent) = parent {
            self.node_mut(parent)?.children.retain(|&c| c != handle);
        }

        let mut stack = vec![handle];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.children);
            }
        }
        self.stats.removed += 1;
        Ok(())
    }
}

impl Renderer for MemoryRenderer {
    fn create_node(&mut self, fiber: &Fiber) -> Result<NodeHandle, CommitError> {
        let handle = self.alloc(MemoryNode {
            tag: Rc::from(fiber.tag().unwrap_or_default()),
            attrs: collect_attrs(fiber),
            svg: fiber.is_svg(),
            children: Vec::new(),
            parent: None,
        });
        self.stats.created += 1;
        Ok(handle)
    }

    fn commit(&mut self, view: &CommitView<'_>) -> Result<(), CommitError> {
        for id in view.detached() {
            for node in view.host_roots(id) {
                self.remove(node)?;
            }
        }

        for id in view.effects() {
            let Some(fiber) = view.fiber(id) else { continue };
            let Some(node) = fiber.node() else { continue };

            if fiber.lane().contains(Lane::UPDATE) && fiber.props_changed() {
                self.update(node, fiber)?;
            }
            if fiber.lane().contains(Lane::INSERT) {
                let parent = fiber.parent_node().ok_or(CommitError::MissingParent(id))?;
                self.insert(parent, node, view.anchor(id))?;
            }
        }
        Ok(())
    }
}

fn collect_attrs(fiber: &Fiber) -> BTreeMap<Rc<str>, PropValue> {
    fiber
        .props()
        .attrs()
        .map(|(name, value)| (Rc::from(name), value.clone()))
        .collect()
}
