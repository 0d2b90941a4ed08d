//! Hook Store - Per-fiber effect bookkeeping.
//!
//! Every component fiber owns a [`Hooks`] list. During render the component
//! registers effects through [`RenderCx`]; each registration is a triplet of
//! setup, cleanup slot, and [`EffectKind`]. The bubble step drains the
//! pending triplets: layout effects run synchronously, passive effects are
//! deferred to the transition queue.
//!
//! # Dependencies
//!
//! Effects carry a dependency value. It is hashed and compared with the
//! previous render's hash for the same hook slot; the effect is queued only
//! on first render or when the hash changes.
//!
//! ```ignore
//! let counter = Component::new("Counter", |props, cx| {
//!     let count = props.get("count").cloned();
//!     cx.use_effect(count.as_ref().map(|c| c.to_string()), move || {
//!         println!("count changed");
//!         None
//!     });
//!     "..."
//! });
//! ```

use std::cell::{Cell, RefCell};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use super::FiberId;

// =============================================================================
// Effect triplets
// =============================================================================

/// Cleanup returned by an effect setup.
pub type Cleanup = Box<dyn FnOnce()>;

/// Effect body. Returns an optional cleanup for the next run or unmount.
pub type Setup = Box<dyn FnOnce() -> Option<Cleanup>>;

/// Cleanup storage shared between a hook slot and its queued effect.
pub type CleanupSlot = Rc<RefCell<Option<Cleanup>>>;

/// When an effect runs relative to commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// Runs synchronously during the bubble step.
    Layout,
    /// Deferred onto the transition queue.
    Passive,
}

/// A queued `(setup, cleanup slot, kind)` triplet.
pub struct Effect {
    setup: Setup,
    cleanup: CleanupSlot,
    kind: EffectKind,
    released: Rc<Cell<bool>>,
}

impl Effect {
    pub fn kind(&self) -> EffectKind {
        self.kind
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect").field("kind", &self.kind).finish_non_exhaustive()
    }
}

/// Run a group of effects: every pending cleanup first, then every setup.
///
/// Effects whose fiber was released since they were queued are skipped;
/// their cleanups already ran on release.
pub fn run_effects(effects: Vec<Effect>) {
    let effects: Vec<Effect> = effects
        .into_iter()
        .filter(|effect| !effect.released.get())
        .collect();

    for effect in &effects {
        let cleanup = effect.cleanup.borrow_mut().take();
        if let Some(cleanup) = cleanup {
            cleanup();
        }
    }
    for effect in effects {
        let cleanup = (effect.setup)();
        *effect.cleanup.borrow_mut() = cleanup;
    }
}

// =============================================================================
// Hooks
// =============================================================================

struct HookSlot {
    kind: EffectKind,
    deps: u64,
    cleanup: CleanupSlot,
}

/// Opaque per-fiber hook list.
#[derive(Default)]
pub struct Hooks {
    slots: Vec<HookSlot>,
    pending: Vec<Effect>,
    cursor: usize,
    released: Rc<Cell<bool>>,
}

impl Hooks {
    /// Reset the cursor before the owning fiber renders.
    pub fn begin_render(&mut self) {
        self.cursor = 0;
    }

    /// Drain queued effects, split into (layout, passive).
    pub fn take_pending(&mut self) -> (Vec<Effect>, Vec<Effect>) {
        std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|effect| effect.kind == EffectKind::Layout)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Run every stored cleanup (unmount). Pending and deferred setups are
    /// dropped.
    pub fn release(self) {
        self.released.set(true);
        for slot in self.slots {
            let cleanup = slot.cleanup.borrow_mut().take();
            if let Some(cleanup) = cleanup {
                cleanup();
            }
        }
    }

    fn register(&mut self, kind: EffectKind, deps: u64, setup: Setup) {
        let index = self.cursor;
        self.cursor += 1;

        let cleanup = match self.slots.get_mut(index) {
            Some(slot) if slot.kind == kind && slot.deps == deps => return,
            Some(slot) => {
                slot.kind = kind;
                slot.deps = deps;
                slot.cleanup.clone()
            }
            None => {
                let cleanup = CleanupSlot::default();
                self.slots.push(HookSlot {
                    kind,
                    deps,
                    cleanup: cleanup.clone(),
                });
                cleanup
            }
        };
        self.pending.push(Effect {
            setup,
            cleanup,
            kind,
            released: self.released.clone(),
        });
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("slots", &self.slots.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}

// =============================================================================
// RenderCx
// =============================================================================

/// Context handed to a component while it renders.
pub struct RenderCx<'a> {
    fiber: FiberId,
    hooks: &'a mut Hooks,
}

impl<'a> RenderCx<'a> {
    pub(crate) fn new(fiber: FiberId, hooks: &'a mut Hooks) -> Self {
        hooks.begin_render();
        Self { fiber, hooks }
    }

    /// Handle of the fiber being rendered (pass to `request_update`).
    pub fn fiber(&self) -> FiberId {
        self.fiber
    }

    /// Register a passive effect, run on a later tick after commit.
    pub fn use_effect<D, F>(&mut self, deps: D, setup: F)
    where
        D: Hash,
        F: FnOnce() -> Option<Cleanup> + 'static,
    {
        self.hooks
            .register(EffectKind::Passive, hash_deps(&deps), Box::new(setup));
    }

    /// Register a layout effect, run synchronously when the fiber bubbles.
    pub fn use_layout_effect<D, F>(&mut self, deps: D, setup: F)
    where
        D: Hash,
        F: FnOnce() -> Option<Cleanup> + 'static,
    {
        self.hooks
            .register(EffectKind::Layout, hash_deps(&deps), Box::new(setup));
    }
}

fn hash_deps<D: Hash>(deps: &D) -> u64 {
    let mut hasher = DefaultHasher::new();
    deps.hash(&mut hasher);
    hasher.finish()
}
