//! Configuration - Reconciler construction and per-render options.

use std::fmt;
use std::time::Duration;

use crate::error::ReconcileError;
use crate::scheduler::DEFAULT_FRAME_BUDGET;

/// Callback run once when a batch commits or aborts.
pub type DoneFn = Box<dyn FnOnce(Result<(), &ReconcileError>)>;

/// Reconciler-wide settings.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use spark_fiber::{MemoryRenderer, Reconciler, ReconcilerConfig};
///
/// let config = ReconcilerConfig::default().frame_budget(Duration::from_millis(8));
/// let reconciler = Reconciler::with_config(MemoryRenderer::new(), config);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Time a flush may spend before yielding to the host.
    pub frame_budget: Duration,
    /// Disable time slicing entirely.
    pub sync: bool,
}

impl ReconcilerConfig {
    pub fn frame_budget(mut self, budget: Duration) -> Self {
        self.frame_budget = budget;
        self
    }

    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            frame_budget: DEFAULT_FRAME_BUDGET,
            sync: false,
        }
    }
}

/// Options for one [`Reconciler::render`](super::Reconciler::render) call.
#[derive(Default)]
pub struct RenderOptions {
    /// Switch sync mode for this and later batches. `None` leaves it as is.
    pub sync: Option<bool>,
    /// Run when this render's batch commits or aborts.
    pub done: Option<DoneFn>,
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = Some(sync);
        self
    }

    pub fn done<F>(mut self, done: F) -> Self
    where
        F: FnOnce(Result<(), &ReconcileError>) + 'static,
    {
        self.done = Some(Box::new(done));
        self
    }
}

impl fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderOptions")
            .field("sync", &self.sync)
            .field("done", &self.done.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ReconcilerConfig::default()
            .frame_budget(Duration::from_millis(4))
            .sync(true);
        assert_eq!(config.frame_budget, Duration::from_millis(4));
        assert!(config.sync);
        assert_eq!(ReconcilerConfig::default().frame_budget, DEFAULT_FRAME_BUDGET);
    }

    #[test]
    fn test_render_options() {
        let options = RenderOptions::new().sync(true).done(|_| {});
        assert_eq!(options.sync, Some(true));
        assert!(options.done.is_some());
        assert_eq!(RenderOptions::default().sync, None);
    }
}
