//! Renderer - Output side of the reconciler.
//!
//! A renderer owns the output tree. The reconciler asks it for one node per
//! host fiber while a batch runs, and hands it the whole batch at commit.
//!
//! # Commit contract
//!
//! For a [`CommitView`]:
//! 1. Remove the [`host_roots`](CommitView::host_roots) of every detached fiber.
//! 2. Walk [`effects`](CommitView::effects) in order. For each host fiber:
//!    - `Lane::UPDATE` and [`Fiber::props_changed`]: apply the new attributes
//!    - `Lane::INSERT`: place (or move) the node into its `parent_node`,
//!      before [`anchor`](CommitView::anchor), or append when there is none
//!
//! Walking effects in order always finds the anchor already placed.

mod memory;

pub use memory::{MemoryNode, MemoryRenderer, RenderStats};

use crate::engine::Fiber;
use crate::error::CommitError;
use crate::pipeline::CommitView;
use crate::types::NodeHandle;

/// Output tree backend.
pub trait Renderer {
    /// Create the output node for a host fiber (detached, attributes applied).
    fn create_node(&mut self, fiber: &Fiber) -> Result<NodeHandle, CommitError>;

    /// Apply a finished batch.
    fn commit(&mut self, view: &CommitView<'_>) -> Result<(), CommitError>;
}
