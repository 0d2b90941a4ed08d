//! Work Loop - Resumable capture/bubble traversal.
//!
//! A batch walks the subtree under its root one fiber per step:
//!
//! ```text
//! capture: visit fiber → render (component) or create node (host) → diff kids
//!          descend to `child` if there is one
//! bubble:  otherwise bubble this fiber, move to `sibling`, or climb to
//!          `parent` and bubble it too, until the batch root is reached
//! ```
//!
//! The position between steps lives in [`BatchTask::cursor`], so a batch
//! suspended by the scheduler resumes exactly where it stopped.

use tracing::{debug, trace};

use super::diff::{Slot, diff_children};
use super::mount::Reconciler;
use super::options::DoneFn;
use crate::engine::{Fiber, FiberId, FiberList, RenderCx, run_effects};
use crate::error::ReconcileError;
use crate::primitives::{Element, ElementKind};
use crate::renderer::Renderer;
use crate::scheduler::{Host, Transition};
use crate::types::{Lane, SVG_TAG};

// =============================================================================
// BatchTask
// =============================================================================

/// One scheduled re-render of the subtree under `root`.
pub(crate) struct BatchTask {
    pub(crate) root: FiberId,
    /// Next fiber to visit; `None` once the root has bubbled.
    pub(crate) cursor: Option<FiberId>,
    pub(crate) effects: FiberList,
    pub(crate) detached: FiberList,
    pub(crate) done: Vec<DoneFn>,
}

impl BatchTask {
    pub(crate) fn new(root: FiberId, done: Option<DoneFn>) -> Self {
        Self {
            root,
            cursor: Some(root),
            effects: FiberList::default(),
            detached: FiberList::default(),
            done: done.into_iter().collect(),
        }
    }

    /// Whether any fiber of this batch has been visited yet.
    pub(crate) fn is_started(&self) -> bool {
        self.cursor != Some(self.root) || !self.effects.is_empty() || !self.detached.is_empty()
    }
}

/// Outcome of running a batch for part of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Progress {
    Suspended,
    Complete,
}

// =============================================================================
// Traversal
// =============================================================================

impl<R: Renderer, H: Host> Reconciler<R, H> {
    /// Step through `task` until it finishes or the frame runs out.
    pub(crate) fn run_batch(&mut self, task: &mut BatchTask) -> Result<Progress, ReconcileError> {
        while let Some(wip) = task.cursor {
            if self.scheduler.should_yield(&self.host) {
                debug!(root = ?task.root, cursor = ?wip, "batch suspended");
                return Ok(Progress::Suspended);
            }
            task.cursor = self.capture(task, wip)?;
        }

        self.commit(task)?;
        Ok(Progress::Complete)
    }

    /// Visit `wip` and return the next fiber to visit.
    fn capture(&mut self, task: &mut BatchTask, wip: FiberId) -> Result<Option<FiberId>, ReconcileError> {
        let Some(fiber) = self.tree.get(wip) else {
            debug!(fiber = ?wip, "batch root was released, nothing to do");
            return Ok(None);
        };

        if fiber.is_component() {
            self.update_component(task, wip)?;
        } else {
            self.update_host(task, wip)?;
        }

        if let Some(child) = self.tree[wip].child {
            return Ok(Some(child));
        }

        let mut current = wip;
        loop {
            self.bubble(task, current);
            if current == task.root {
                self.tree[current].lane.remove(Lane::DIRTY);
                trace!(root = ?current, "batch root bubbled");
                return Ok(None);
            }

            let fiber = &self.tree[current];
            if let Some(sibling) = fiber.sibling {
                return Ok(Some(sibling));
            }
            match fiber.parent {
                Some(parent) => current = parent,
                None => return Ok(None),
            }
        }
    }

    fn update_component(&mut self, task: &mut BatchTask, wip: FiberId) -> Result<(), ReconcileError> {
        self.current = Some(wip);

        let fiber = &mut self.tree[wip];
        let ElementKind::Component(component) = &fiber.kind else {
            return Ok(());
        };
        let component = component.clone();
        let props = fiber.props.clone();

        trace!(fiber = ?wip, component = component.name(), "render");
        let children = {
            let mut cx = RenderCx::new(wip, &mut fiber.hooks);
            component.render(&props, &mut cx)?
        };

        self.reconcile_children(task, wip, children.into_elements()?);
        Ok(())
    }

    fn update_host(&mut self, task: &mut BatchTask, wip: FiberId) -> Result<(), ReconcileError> {
        let parent_node = self.tree.parent_host_node(wip);

        let fiber = &mut self.tree[wip];
        fiber.parent_node = parent_node;
        if fiber.tag() == Some(SVG_TAG) {
            fiber.lane |= Lane::SVG;
        }
        if fiber.node.is_none() {
            let node = self.renderer.create_node(fiber)?;
            trace!(fiber = ?wip, tag = ?fiber.tag(), ?node, "node created");
            fiber.node = Some(node);
        }

        let children = fiber.props.children().clone();
        self.reconcile_children(task, wip, children.into_elements()?);
        Ok(())
    }

    /// Diff `elements` against `parent`'s kids and apply the plan.
    fn reconcile_children(&mut self, task: &mut BatchTask, parent: FiberId, elements: Vec<Element>) {
        let old_kids = std::mem::take(&mut self.tree[parent].kids);

        let plan = {
            let old: Vec<Slot<'_>> = old_kids
                .iter()
                .map(|&id| {
                    let fiber = &self.tree[id];
                    Slot { key: fiber.key.as_ref(), kind: &fiber.kind }
                })
                .collect();
            let new: Vec<Slot<'_>> = elements
                .iter()
                .map(|element| Slot { key: element.key.as_ref(), kind: &element.kind })
                .collect();
            diff_children(&old, &new)
        };

        let mut kids = Vec::with_capacity(elements.len());
        for (element, placement) in elements.into_iter().zip(plan.kids.iter().copied()) {
            let id = match placement.reused() {
                Some(old) => {
                    let id = old_kids[old];
                    self.tree[id].reuse(element, placement.lane());
                    id
                }
                None => self.tree.insert(Fiber::from_element(element)),
            };
            kids.push(id);
        }

        for &old in &plan.detached {
            let id = old_kids[old];
            self.tree[id].lane = Lane::REMOVE;
            self.tree.push_detach(&mut task.detached, id);
        }

        if plan.inserted() + plan.moved() + plan.detached.len() > 0 {
            trace!(
                parent = ?parent,
                inserted = plan.inserted(),
                moved = plan.moved(),
                updated = plan.updated(),
                detached = plan.detached.len(),
                "children reconciled"
            );
        }

        self.tree.link_kids(parent, kids);
    }

    /// Finish `id` on the way back up.
    fn bubble(&mut self, task: &mut BatchTask, id: FiberId) {
        if !self.tree[id].is_component() {
            self.tree.push_effect(&mut task.effects, id);
            return;
        }

        // Hand the component's placement to the hosts that represent it
        let (after, lane) = {
            let fiber = &self.tree[id];
            (fiber.after, fiber.lane - Lane::DIRTY)
        };
        if let Some(tail) = self.tree.tail_host(id)
            && after.is_some()
        {
            self.tree[tail].after = after;
        }
        for host in self.tree.host_root_fibers(id) {
            self.tree[host].lane |= lane;
        }
        self.tree[id].lane.remove(Lane::MUTATIONS);

        let (layout, passive) = self.tree[id].hooks.take_pending();
        if !layout.is_empty() {
            run_effects(layout);
        }
        if !passive.is_empty() {
            self.scheduler
                .defer_transition(Transition::Run(Box::new(move || run_effects(passive))));
        }
    }
}
