//! Error types for the reconciler.
//!
//! Each error aborts only the batch it occurred in; the scheduler keeps
//! processing later batches.

use thiserror::Error;

use crate::engine::FiberId;
use crate::types::NodeHandle;

/// A component failed while rendering.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("component `{component}` failed to render: {message}")]
pub struct RenderError {
    /// Name of the component that failed (filled in by the work loop).
    pub component: String,
    pub message: String,
}

impl RenderError {
    /// Create an error from inside a render function.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            component: String::new(),
            message: message.into(),
        }
    }

    pub(crate) fn in_component(mut self, name: &str) -> Self {
        if self.component.is_empty() {
            self.component = name.to_string();
        }
        self
    }
}

/// A children description could not be reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiffError {
    /// A host element was described with an empty tag.
    #[error("host element has an empty tag")]
    EmptyTag,
    /// A text leaf was given children of its own.
    #[error("text leaf cannot have children")]
    TextWithChildren,
}

/// The renderer failed to apply a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    /// The renderer does not know this output node.
    #[error("unknown output node {0:?}")]
    UnknownNode(NodeHandle),
    /// A host fiber reached commit without a parent output node.
    #[error("fiber {0:?} has no parent output node")]
    MissingParent(FiberId),
    /// The insertion anchor is not a child of the target parent.
    #[error("anchor {anchor:?} is not attached to {parent:?}")]
    AnchorNotAttached { parent: NodeHandle, anchor: NodeHandle },
}

/// Any failure that aborts a batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Diff(#[from] DiffError),
    #[error(transparent)]
    Commit(#[from] CommitError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_error_names_component() {
        let err = RenderError::new("boom").in_component("Counter");
        assert_eq!(
            err.to_string(),
            "component `Counter` failed to render: boom"
        );

        // An inner name is not overwritten by an outer one
        let err = err.in_component("App");
        assert_eq!(err.component, "Counter");
    }

    #[test]
    fn test_reconcile_error_from() {
        let err: ReconcileError = DiffError::EmptyTag.into();
        assert!(matches!(err, ReconcileError::Diff(DiffError::EmptyTag)));
        assert_eq!(err.to_string(), "host element has an empty tag");
    }
}
