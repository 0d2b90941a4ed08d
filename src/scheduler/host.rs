//! Host - Clock and input probe consumed by the scheduler.
//!
//! The scheduler never reads the clock directly. It asks a [`Host`], which
//! lets the same reconciler run against the system clock, a terminal, or a
//! deterministic manual clock in tests.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use spark_fiber::scheduler::ManualHost;
//!
//! let host = ManualHost::new();
//! let clock = host.clock();
//! clock.advance(Duration::from_millis(20));
//! ```

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Time source and input probe.
pub trait Host {
    /// Current time.
    fn now(&self) -> Instant;

    /// Whether user input is waiting to be handled.
    fn is_input_pending(&self) -> bool {
        false
    }
}

// =============================================================================
// SystemHost
// =============================================================================

/// Monotonic system clock, never reports input.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl Host for SystemHost {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// =============================================================================
// TerminalHost
// =============================================================================

/// System clock that yields when crossterm has an event queued.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalHost;

impl Host for TerminalHost {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn is_input_pending(&self) -> bool {
        crossterm::event::poll(Duration::ZERO).unwrap_or(false)
    }
}

// =============================================================================
// ManualHost
// =============================================================================

/// Deterministic clock for tests and replay.
///
/// Time only moves when a [`ManualClock`] advances it, or by a fixed step on
/// every `now()` call when built with [`ManualHost::with_step`].
#[derive(Debug, Clone)]
pub struct ManualHost {
    origin: Instant,
    step: Duration,
    clock: ManualClock,
}

impl ManualHost {
    pub fn new() -> Self {
        Self::with_step(Duration::ZERO)
    }

    /// Advance the clock by `step` each time it is read.
    pub fn with_step(step: Duration) -> Self {
        Self {
            origin: Instant::now(),
            step,
            clock: ManualClock::default(),
        }
    }

    /// Shared handle for moving time and toggling input from outside.
    pub fn clock(&self) -> ManualClock {
        self.clock.clone()
    }
}

impl Default for ManualHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for ManualHost {
    fn now(&self) -> Instant {
        let elapsed = self.clock.elapsed.get();
        self.clock.elapsed.set(elapsed + self.step);
        self.origin + elapsed
    }

    fn is_input_pending(&self) -> bool {
        self.clock.input.get()
    }
}

/// Handle controlling a [`ManualHost`].
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    elapsed: Rc<Cell<Duration>>,
    input: Rc<Cell<bool>>,
}

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }

    pub fn set_input_pending(&self, pending: bool) {
        self.input.set(pending);
    }
}
