//! Commit - Hand a finished batch to the renderer, then settle the tree.
//!
//! Commit happens once per batch, after the root has bubbled:
//! 1. The renderer applies removals and the effect chain through a
//!    read-only [`CommitView`].
//! 2. Detached subtrees are released: hook cleanups run, refs are cleared,
//!    arena slots are freed.
//! 3. Refs of committed hosts receive their output node and the fibers'
//!    mutation lanes are cleared.

use tracing::{debug, warn};

use super::mount::Reconciler;
use super::work_loop::BatchTask;
use crate::engine::{Chain, Fiber, FiberId, FiberList, FiberTree};
use crate::error::ReconcileError;
use crate::renderer::Renderer;
use crate::scheduler::Host;
use crate::types::{Lane, NodeHandle};

/// Read-only view of a finished batch.
pub struct CommitView<'a> {
    tree: &'a FiberTree,
    root: FiberId,
    effects: FiberList,
    detached: FiberList,
}

impl<'a> CommitView<'a> {
    pub(crate) fn new(tree: &'a FiberTree, task: &BatchTask) -> Self {
        Self {
            tree,
            root: task.root,
            effects: task.effects,
            detached: task.detached,
        }
    }

    /// Root of the batch.
    pub fn root(&self) -> FiberId {
        self.root
    }

    /// Host fibers in bubble order. Each carries its pending lane.
    pub fn effects(&self) -> Chain<'a> {
        self.tree.effects(&self.effects)
    }

    /// Fibers whose output must be removed.
    pub fn detached(&self) -> Chain<'a> {
        self.tree.detached(&self.detached)
    }

    pub fn fiber(&self, id: FiberId) -> Option<&'a Fiber> {
        self.tree.get(id)
    }

    /// Output node `id` must be inserted before, or `None` to append.
    pub fn anchor(&self, id: FiberId) -> Option<NodeHandle> {
        self.tree.anchor(id)
    }

    /// Top-level output nodes of a (detached) subtree.
    pub fn host_roots(&self, id: FiberId) -> Vec<NodeHandle> {
        self.tree.host_roots(id)
    }

    pub fn tree(&self) -> &'a FiberTree {
        self.tree
    }
}

impl<R: Renderer, H: Host> Reconciler<R, H> {
    pub(crate) fn commit(&mut self, task: &mut BatchTask) -> Result<(), ReconcileError> {
        self.renderer.commit(&CommitView::new(&self.tree, task))?;

        let released = self.release_detached(&task.detached);

        let effects: Vec<FiberId> = self.tree.effects(&task.effects).collect();
        for &id in &effects {
            let fiber = &mut self.tree[id];
            if let (Some(node_ref), Some(node)) = (&fiber.node_ref, fiber.node) {
                node_ref.set(Some(node));
            }
            fiber.lane.remove(Lane::MUTATIONS);
        }

        debug!(
            root = ?task.root,
            effects = effects.len(),
            released,
            "batch committed"
        );
        task.effects = FiberList::default();
        task.detached = FiberList::default();
        Ok(())
    }

    /// Settle what an aborted batch already unlinked.
    ///
    /// Detached kids are gone from their parent's `kids`, so no later batch
    /// can reach them: their output is removed and their fibers released
    /// now. Placements and updates stay pending on the live fibers.
    pub(crate) fn discard(&mut self, task: &mut BatchTask) {
        if task.detached.is_empty() {
            return;
        }

        let mut removals = BatchTask::new(task.root, None);
        removals.detached = task.detached;
        if let Err(err) = self.renderer.commit(&CommitView::new(&self.tree, &removals)) {
            warn!(root = ?task.root, error = %err, "removing detached output failed");
        }

        let released = self.release_detached(&task.detached);
        debug!(root = ?task.root, released, "aborted batch detached fibers released");
        task.effects = FiberList::default();
        task.detached = FiberList::default();
    }

    fn release_detached(&mut self, list: &FiberList) -> usize {
        let detached: Vec<FiberId> = self.tree.detached(list).collect();
        let mut released = 0;
        for id in detached {
            for fiber in self.tree.release(id) {
                if let Some(node_ref) = &fiber.node_ref {
                    node_ref.set(None);
                }
                fiber.hooks.release();
                released += 1;
            }
        }
        released
    }
}
