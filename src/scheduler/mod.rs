//! Scheduler - Frame-budget task queue and transition list.
//!
//! Two queues drive all work:
//!
//! ```text
//! tasks:        [batch A (suspended)] [batch B] ...     FIFO, head resumes
//! transitions:  [Flush] [Run(passive effects)] ...      one per tick
//! ```
//!
//! Scheduling a batch defers a single `Flush` transition. Each host tick pops
//! exactly one transition. A flush runs task-queue work until the frame
//! deadline passes (or the host reports input), then defers another flush if
//! anything is left.
//!
//! The scheduler is generic over the task type and does not run tasks
//! itself; the reconciler drives it with [`Scheduler::take_head`] and
//! [`Scheduler::restore_head`] so task execution can borrow the fiber tree.

mod host;

pub use host::{Host, ManualClock, ManualHost, SystemHost, TerminalHost};

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use tracing::trace;

/// Default frame budget: one frame at 60 Hz.
pub const DEFAULT_FRAME_BUDGET: Duration = Duration::from_nanos(16_666_667);

// =============================================================================
// Transition
// =============================================================================

/// Deferred unit of work, run one per tick.
pub enum Transition {
    /// Drain the task queue for one frame.
    Flush,
    /// Arbitrary deferred callback (passive effects).
    Run(Box<dyn FnOnce()>),
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flush => f.write_str("Flush"),
            Self::Run(_) => f.write_str("Run(..)"),
        }
    }
}

// =============================================================================
// Scheduler
// =============================================================================

/// Cooperative scheduler state.
pub struct Scheduler<T> {
    tasks: VecDeque<T>,
    transitions: VecDeque<Transition>,
    deadline: Option<Instant>,
    frame_budget: Duration,
    sync: bool,
    tick_pending: bool,
    flush_pending: bool,
    tick_requests: u64,
}

impl<T> Scheduler<T> {
    pub fn new(frame_budget: Duration, sync: bool) -> Self {
        Self {
            tasks: VecDeque::new(),
            transitions: VecDeque::new(),
            deadline: None,
            frame_budget,
            sync,
            tick_pending: false,
            flush_pending: false,
            tick_requests: 0,
        }
    }

    // -------------------------------------------------------------------------
    // Tasks
    // -------------------------------------------------------------------------

    /// Enqueue a task and make sure a flush is coming.
    pub fn schedule_batch(&mut self, task: T) {
        self.tasks.push_back(task);
        self.defer_flush();
    }

    /// Remove the head task so the caller can run it.
    pub fn take_head(&mut self) -> Option<T> {
        self.tasks.pop_front()
    }

    /// Put a suspended task back into the head slot.
    pub fn restore_head(&mut self, task: T) {
        self.tasks.push_front(task);
    }

    pub fn has_tasks(&self) -> bool {
        !self.tasks.is_empty()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn tasks(&self) -> impl Iterator<Item = &T> {
        self.tasks.iter()
    }

    pub fn tasks_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.tasks.iter_mut()
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    /// Append a transition, requesting a tick if the list was idle.
    pub fn defer_transition(&mut self, transition: Transition) {
        trace!(?transition, queued = self.transitions.len(), "defer transition");
        let was_empty = self.transitions.is_empty();
        self.transitions.push_back(transition);
        if was_empty {
            self.request_tick();
        }
    }

    /// Defer a flush unless one is already queued.
    pub fn defer_flush(&mut self) {
        if !self.flush_pending {
            self.flush_pending = true;
            self.defer_transition(Transition::Flush);
        }
    }

    /// Pop the oldest transition for this tick.
    ///
    /// Requests another tick when more transitions remain.
    pub fn next_transition(&mut self) -> Option<Transition> {
        self.tick_pending = false;
        let transition = self.transitions.pop_front()?;
        if matches!(transition, Transition::Flush) {
            self.flush_pending = false;
        }
        if !self.transitions.is_empty() {
            self.request_tick();
        }
        Some(transition)
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    /// Whether the host owes the scheduler a tick.
    pub fn has_pending_tick(&self) -> bool {
        self.tick_pending
    }

    /// Total ticks requested from the host so far.
    pub fn tick_requests(&self) -> u64 {
        self.tick_requests
    }

    fn request_tick(&mut self) {
        if !self.tick_pending {
            self.tick_pending = true;
            self.tick_requests += 1;
        }
    }

    // -------------------------------------------------------------------------
    // Frame budget
    // -------------------------------------------------------------------------

    /// Open a frame: the deadline becomes `now + frame_budget`.
    pub fn start_frame(&mut self, now: Instant) {
        self.deadline = Some(now + self.frame_budget);
    }

    /// Whether work should stop for this frame.
    ///
    /// Never in sync mode. Otherwise when input is pending, the deadline has
    /// passed, or no frame is open.
    pub fn should_yield<H: Host>(&self, host: &H) -> bool {
        if self.sync {
            return false;
        }
        if host.is_input_pending() {
            return true;
        }
        self.deadline.is_none_or(|deadline| host.now() >= deadline)
    }

    pub fn frame_budget(&self) -> Duration {
        self.frame_budget
    }

    pub fn set_frame_budget(&mut self, budget: Duration) {
        self.frame_budget = budget;
    }

    pub fn set_sync(&mut self, sync: bool) {
        self.sync = sync;
    }

    pub fn is_sync(&self) -> bool {
        self.sync
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_BUDGET, false)
    }
}

impl<T> fmt::Debug for Scheduler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("tasks", &self.tasks.len())
            .field("transitions", &self.transitions)
            .field("frame_budget", &self.frame_budget)
            .field("sync", &self.sync)
            .field("tick_pending", &self.tick_pending)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_default_budget() {
        let scheduler: Scheduler<()> = Scheduler::default();
        assert_eq!(scheduler.frame_budget(), Duration::from_nanos(16_666_667));
        assert!(!scheduler.is_sync());
    }

    #[test]
    fn test_schedule_coalesces_flush() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule_batch(1);
        scheduler.schedule_batch(2);

        assert_eq!(scheduler.task_count(), 2);
        assert_eq!(scheduler.transition_count(), 1);
        assert_eq!(scheduler.tick_requests(), 1);

        assert!(matches!(scheduler.next_transition(), Some(Transition::Flush)));
        assert!(!scheduler.has_pending_tick());

        // Once the flush is consumed a new one can be queued
        scheduler.schedule_batch(3);
        assert_eq!(scheduler.transition_count(), 1);
    }

    #[test]
    fn test_one_transition_per_tick_fifo() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler: Scheduler<()> = Scheduler::default();

        for name in ["a", "b", "c"] {
            let log = log.clone();
            scheduler.defer_transition(Transition::Run(Box::new(move || {
                log.borrow_mut().push(name);
            })));
        }
        assert_eq!(scheduler.tick_requests(), 1);

        let mut ticks = 0;
        while scheduler.has_pending_tick() {
            ticks += 1;
            if let Some(Transition::Run(callback)) = scheduler.next_transition() {
                callback();
            }
        }

        assert_eq!(ticks, 3);
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_should_yield_after_budget() {
        let host = ManualHost::new();
        let clock = host.clock();
        let mut scheduler: Scheduler<()> = Scheduler::new(Duration::from_millis(10), false);

        // No frame open yet
        assert!(scheduler.should_yield(&host));

        scheduler.start_frame(host.now());
        assert!(!scheduler.should_yield(&host));

        clock.advance(Duration::from_millis(9));
        assert!(!scheduler.should_yield(&host));

        clock.advance(Duration::from_millis(1));
        assert!(scheduler.should_yield(&host));

        scheduler.set_sync(true);
        assert!(!scheduler.should_yield(&host));
    }

    #[test]
    fn test_should_yield_on_input() {
        let host = ManualHost::new();
        let mut scheduler: Scheduler<()> = Scheduler::default();
        scheduler.start_frame(host.now());
        assert!(!scheduler.should_yield(&host));

        host.clock().set_input_pending(true);
        assert!(scheduler.should_yield(&host));
    }

    #[test]
    fn test_restore_head_keeps_slot() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule_batch("first");
        scheduler.schedule_batch("second");

        let head = scheduler.take_head();
        assert_eq!(head, Some("first"));
        scheduler.restore_head("first");
        assert_eq!(scheduler.tasks().copied().collect::<Vec<_>>(), vec!["first", "second"]);
    }
}
