//! # spark-fiber
//!
//! Time-sliced keyed fiber reconciler for Rust.
//!
//! ## Architecture
//!
//! spark-fiber keeps a tree of fibers in a slot-map arena. Each fiber mirrors
//! one element of the declarative tree and caches what the last render
//! produced (output node, kids, hooks). Re-rendering walks the subtree in
//! small resumable steps, diffs children by key, and hands the finished
//! batch to a [`Renderer`] in one commit:
//!
//! ```text
//! render / request_update → Scheduler → work loop (capture ⇄ bubble) → commit → Renderer
//! ```
//!
//! Work is cooperative: a flush stops when the frame budget is spent or the
//! [`Host`](scheduler::Host) reports pending input, and resumes on the next
//! tick exactly where it stopped.
//!
//! ## Example
//!
//! ```ignore
//! use spark_fiber::{Element, MemoryRenderer, Reconciler, RenderOptions};
//!
//! let mut renderer = MemoryRenderer::new();
//! let body = renderer.create_container("body");
//! let mut reconciler = Reconciler::new(renderer);
//!
//! let list = |order: &[&str]| {
//!     Element::host("ul").children(
//!         order.iter().map(|&k| Element::host("li").key(k).children(k)).collect::<Vec<_>>(),
//!     )
//! };
//!
//! reconciler.render(list(&["a", "b"]), body, RenderOptions::default());
//! reconciler.run_until_idle();
//!
//! reconciler.render(list(&["b", "a"]), body, RenderOptions::default());
//! reconciler.run_until_idle();
//! assert_eq!(reconciler.renderer().text_content(body), "ba");
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Core types (Lane, Key, PropValue, NodeHandle, NodeRef)
//! - [`primitives`] - Elements, props, children, components
//! - [`engine`] - Fiber arena, fibers, hooks
//! - [`scheduler`] - Frame-budget task queue, transitions, host clocks
//! - [`pipeline`] - Reconciler, work loop, child diff, commit
//! - [`renderer`] - Renderer trait and the in-memory renderer

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod primitives;
pub mod renderer;
pub mod scheduler;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use error::{CommitError, DiffError, ReconcileError, RenderError};

pub use engine::{Cleanup, Effect, EffectKind, Fiber, FiberId, FiberTree, Hooks, RenderCx};

pub use primitives::{Children, Component, Element, ElementKind, Props, RenderResult};

pub use pipeline::{
    CommitView, DiffPlan, DoneFn, Placement, Reconciler, ReconcilerConfig, RenderOptions,
    diff_children,
};

pub use renderer::{MemoryNode, MemoryRenderer, RenderStats, Renderer};

pub use scheduler::{
    DEFAULT_FRAME_BUDGET, Host, ManualClock, ManualHost, Scheduler, SystemHost, TerminalHost,
    Transition,
};
