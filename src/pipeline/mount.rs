//! Mount API - Reconciler lifecycle and event-loop driving.
//!
//! [`Reconciler`] is the entry point. It owns the fiber tree, the scheduler,
//! the renderer and the host clock, and exposes the public surface:
//! render into a container, request updates, and tick.
//!
//! # Example
//!
//! ```ignore
//! use spark_fiber::{Element, MemoryRenderer, Reconciler, RenderOptions};
//!
//! let mut renderer = MemoryRenderer::new();
//! let container = renderer.create_container("body");
//! let mut reconciler = Reconciler::new(renderer);
//!
//! reconciler.render(Element::host("div").children("hello"), container, RenderOptions::default());
//!
//! // Option 1: drain everything now
//! reconciler.run_until_idle();
//!
//! // Option 2: tick from your own loop, one transition at a time
//! while reconciler.tick() {
//!     // handle input between ticks
//! }
//! ```

use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, error, trace};

use super::options::{DoneFn, ReconcilerConfig, RenderOptions};
use super::work_loop::{BatchTask, Progress};
use crate::engine::{FiberId, FiberTree, Fiber};
use crate::error::ReconcileError;
use crate::primitives::{Children, Props};
use crate::renderer::Renderer;
use crate::scheduler::{Host, Scheduler, SystemHost, Transition};
use crate::types::{Lane, NodeHandle};

// =============================================================================
// Reconciler
// =============================================================================

/// Time-sliced fiber reconciler bound to one renderer and host.
pub struct Reconciler<R: Renderer, H: Host = SystemHost> {
    pub(crate) tree: FiberTree,
    pub(crate) scheduler: Scheduler<BatchTask>,
    pub(crate) renderer: R,
    pub(crate) host: H,
    pub(crate) current: Option<FiberId>,
    roots: HashMap<NodeHandle, FiberId>,
}

impl<R: Renderer> Reconciler<R, SystemHost> {
    /// Create a reconciler on the system clock with default settings.
    pub fn new(renderer: R) -> Self {
        Self::with_config(renderer, ReconcilerConfig::default())
    }

    pub fn with_config(renderer: R, config: ReconcilerConfig) -> Self {
        Self::with_host(renderer, SystemHost, config)
    }
}

impl<R: Renderer, H: Host> Reconciler<R, H> {
    /// Create a reconciler driven by a custom host clock.
    pub fn with_host(renderer: R, host: H, config: ReconcilerConfig) -> Self {
        Self {
            tree: FiberTree::new(),
            scheduler: Scheduler::new(config.frame_budget, config.sync),
            renderer,
            host,
            current: None,
            roots: HashMap::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Public surface
    // -------------------------------------------------------------------------

    /// Render `tree` into `container`.
    ///
    /// The first render for a container creates its root fiber. Later
    /// renders into the same container replace the root's children and diff
    /// against what is mounted. Returns the root fiber.
    pub fn render(
        &mut self,
        tree: impl Into<Children>,
        container: NodeHandle,
        options: RenderOptions,
    ) -> FiberId {
        if let Some(sync) = options.sync {
            self.scheduler.set_sync(sync);
        }

        let props = Rc::new(Props::with_children(tree.into()));
        let existing = self
            .roots
            .get(&container)
            .copied()
            .filter(|&root| self.tree.contains(root));

        let root = match existing {
            Some(root) => {
                let fiber = &mut self.tree[root];
                fiber.old_props = Some(std::mem::replace(&mut fiber.props, props));
                root
            }
            None => {
                let root = self.tree.insert(Fiber::root(container, props));
                self.roots.insert(container, root);
                debug!(?container, ?root, "root created");
                root
            }
        };

        self.schedule_update(root, options.done);
        root
    }

    /// Schedule a re-render of the subtree under `fiber`.
    ///
    /// Repeated requests before the batch runs coalesce into one batch.
    /// Released fibers are ignored.
    pub fn request_update(&mut self, fiber: FiberId) {
        self.schedule_update(fiber, None);
    }

    /// Run one host tick: exactly one deferred transition.
    ///
    /// Returns whether another tick is pending.
    pub fn tick(&mut self) -> bool {
        match self.scheduler.next_transition() {
            Some(Transition::Flush) => self.flush_task_queue(),
            Some(Transition::Run(callback)) => {
                trace!("run deferred transition");
                callback();
            }
            None => {}
        }
        self.scheduler.has_pending_tick()
    }

    /// Tick until no work is pending. Returns the number of ticks run.
    pub fn run_until_idle(&mut self) -> usize {
        let mut ticks = 0;
        while self.scheduler.has_pending_tick() {
            self.tick();
            ticks += 1;
        }
        ticks
    }

    /// Component fiber most recently rendered by the in-flight batch.
    pub fn current_fiber(&self) -> Option<FiberId> {
        self.current
    }

    pub fn set_sync(&mut self, sync: bool) {
        self.scheduler.set_sync(sync);
    }

    pub fn is_sync(&self) -> bool {
        self.scheduler.is_sync()
    }

    /// Whether any batch or transition is still waiting.
    pub fn has_pending_work(&self) -> bool {
        self.scheduler.has_tasks() || self.scheduler.transition_count() > 0
    }

    /// Number of batches queued (including a suspended one).
    pub fn pending_batches(&self) -> usize {
        self.scheduler.task_count()
    }

    /// Root fiber mounted into `container`, if any.
    pub fn root_of(&self, container: NodeHandle) -> Option<FiberId> {
        self.roots.get(&container).copied()
    }

    pub fn tree(&self) -> &FiberTree {
        &self.tree
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    // -------------------------------------------------------------------------
    // Scheduling
    // -------------------------------------------------------------------------

    fn schedule_update(&mut self, id: FiberId, done: Option<DoneFn>) {
        let Some(fiber) = self.tree.get_mut(id) else {
            debug!(fiber = ?id, "update for released fiber ignored");
            return;
        };

        // A batch that already visited its root would miss the new props
        if let Some(task) = self
            .scheduler
            .tasks_mut()
            .find(|task| task.root == id && !task.is_started())
        {
            trace!(fiber = ?id, "update coalesced");
            task.done.extend(done);
            return;
        }

        fiber.lane = (fiber.lane & (Lane::SVG | Lane::INSERT)) | Lane::UPDATE | Lane::DIRTY;
        debug!(fiber = ?id, queued = self.scheduler.task_count(), "batch scheduled");
        self.scheduler.schedule_batch(BatchTask::new(id, done));
    }

    /// Run queued batches until the frame budget is spent.
    fn flush_task_queue(&mut self) {
        let now = self.host.now();
        self.scheduler.start_frame(now);

        while !self.scheduler.should_yield(&self.host) {
            let Some(mut task) = self.scheduler.take_head() else {
                break;
            };
            match self.run_batch(&mut task) {
                Ok(Progress::Suspended) => {
                    self.scheduler.restore_head(task);
                    break;
                }
                Ok(Progress::Complete) => self.finish(task),
                Err(err) => self.abort(task, err),
            }
        }

        if self.scheduler.has_tasks() {
            trace!(remaining = self.scheduler.task_count(), "flush continues next tick");
            self.scheduler.defer_flush();
        }
    }

    fn finish(&mut self, task: BatchTask) {
        self.current = None;
        for done in task.done {
            done(Ok(()));
        }
    }

    fn abort(&mut self, mut task: BatchTask, err: ReconcileError) {
        error!(root = ?task.root, error = %err, "batch aborted");
        self.current = None;
        self.discard(&mut task);
        if let Some(root) = self.tree.get_mut(task.root) {
            root.lane.remove(Lane::DIRTY);
        }
        for done in task.done {
            done(Err(&err));
        }
    }
}
