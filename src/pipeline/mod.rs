//! Reconcile Pipeline
//!
//! This module connects element descriptions to renderer mutations.
//!
//! # Pipeline Architecture
//!
//! ```text
//! render / request_update → Scheduler → work loop (capture ⇄ bubble) → commit → Renderer
//!                               ▲                │
//!                               └── transitions ◀┘ (passive effects, next flush)
//! ```
//!
//! ## Stages
//!
//! 1. **mount** - [`Reconciler`]: roots, update requests, host ticks
//! 2. **work_loop** - Resumable traversal, component render, host node creation
//! 3. **diff** - Pure keyed child diff producing a [`DiffPlan`]
//! 4. **commit** - [`CommitView`] handed to the renderer, then tree cleanup

pub mod diff;
pub mod options;

mod commit;
mod mount;
mod work_loop;

pub use commit::CommitView;
pub use diff::{DiffPlan, Placement, Slot, diff_children};
pub use mount::Reconciler;
pub use options::{DoneFn, ReconcilerConfig, RenderOptions};
