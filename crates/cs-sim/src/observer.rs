//! Simulation observer trait for reporting and data collection.

use cs_core::SimTime;
use cs_model::{Crew, Crewman, SimPhase, Task, TaskOccurrence};

/// Callbacks invoked by [`Simulator::run`][crate::Simulator::run] during a
/// replication.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.  Observers never influence the outcome of a
/// replication.
///
/// # Example — error counter
///
/// ```rust,ignore
/// struct ErrorCounter(usize);
///
/// impl SimObserver for ErrorCounter {
///     fn on_task_error(&mut self, _time: SimTime, _phase: Option<&SimPhase>, _task: &Task) {
///         self.0 += 1;
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called when leaving `previous` for `next`, before pending occurrences
    /// are carried over.  `previous` is `None` at the start of the scenario,
    /// `next` is `None` at its end.
    fn on_phase_transition_begin(
        &mut self,
        _time:     SimTime,
        _previous: Option<&SimPhase>,
        _next:     Option<&SimPhase>,
    ) {}

    /// Called once pending occurrences have been carried over into `next`.
    fn on_phase_transition_end(
        &mut self,
        _time:     SimTime,
        _previous: Option<&SimPhase>,
        _next:     Option<&SimPhase>,
    ) {}

    /// An occurrence of `task` failed: it could not be staffed, or it was
    /// stopped under a policy that counts this as an error.  `phase` is `None`
    /// for tasks rejected before the first phase.
    fn on_task_error(&mut self, _time: SimTime, _phase: Option<&SimPhase>, _task: &Task) {}

    /// Free-text data errors and warnings found while preparing a replication.
    fn on_error_message(&mut self, _text: &str) {}

    /// An assignment changed.  `crewman` is `None` for an occurrence that
    /// needs no crew; `occurrence` is `None` when the crewman was released.
    fn on_task_assignment(
        &mut self,
        _time:       SimTime,
        _phase:      Option<&SimPhase>,
        _crewman:    Option<&Crewman>,
        _occurrence: Option<&TaskOccurrence>,
    ) {}

    /// Called once after the final phase transition, with the crew's
    /// bookkeeping refreshed to `time`.
    fn on_replication_end(&mut self, _time: SimTime, _crew: &Crew) {}
}

/// A [`SimObserver`] that does nothing.  Use when you need to call `run` but
/// don't want callbacks.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
