//! Fiber Engine - Arena, fibers and hooks.
//!
//! The engine owns the tracked tree:
//! - [`FiberTree`]: slot-map arena addressed by [`FiberId`]
//! - [`Fiber`]: one node, with its cached output node, kids and hooks
//! - [`Hooks`] / [`RenderCx`]: per-fiber effect bookkeeping
//!
//! # Architecture
//!
//! Fibers never reference each other directly. Every edge (parent, child,
//! sibling, after) is a generational handle, so freeing a subtree leaves
//! queued handles harmlessly stale:
//!
//! ```text
//! FiberTree
//!   ├── FiberId(1v1) → Fiber { kind: Host("#root"), kids: [2v1] }
//!   ├── FiberId(2v1) → Fiber { kind: Component(App), kids: [3v1, 4v1] }
//!   └── ...
//! ```

mod fiber;
mod hooks;
mod tree;

slotmap::new_key_type! {
    /// Generational handle to a fiber in a [`FiberTree`].
    pub struct FiberId;
}

pub use fiber::Fiber;
pub use hooks::{Cleanup, Effect, EffectKind, Hooks, RenderCx, run_effects};
pub use tree::{Chain, FiberList, FiberTree};
