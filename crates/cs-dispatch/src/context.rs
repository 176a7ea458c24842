//! The engine side of the dispatcher contract.

use cs_core::{CrewmanId, OccurrenceId, SimTime, TaskId};
use cs_model::{Crewman, SimPhase, TaskOccurrence};

use crate::DispatchResult;

/// Mutable view of a running replication, handed to every
/// [`Dispatcher`](crate::Dispatcher) call.
///
/// Every mutation keeps `TaskOccurrence::assigned` and
/// `Crewman::tasks_assigned` in agreement, so a dispatcher cannot break the
/// relation by construction.
pub trait AssignmentContext {
    /// Current simulation time.
    fn now(&self) -> SimTime;

    /// The phase being simulated.
    fn phase(&self) -> &SimPhase;

    fn occurrence(&self, id: OccurrenceId) -> Option<&TaskOccurrence>;

    fn crewman(&self, id: CrewmanId) -> Option<&Crewman>;

    /// Crew with a non-zero qualification for `task`, as `(crewman, percent)`
    /// in ascending crewman order.
    fn qualified_crew(&self, task: TaskId) -> &[(CrewmanId, u8)];

    /// Bring the crewman's cumulated work time up to [`now`](Self::now).
    fn refresh_crewman(&mut self, id: CrewmanId);

    /// Put `crewman` on `occurrence`.  Assigning twice is a no-op.
    fn assign(&mut self, crewman: CrewmanId, occurrence: OccurrenceId) -> DispatchResult<()>;

    /// Take `crewman` off `occurrence`.
    fn dismiss(&mut self, crewman: CrewmanId, occurrence: OccurrenceId) -> DispatchResult<()>;

    /// Take `crewman` off everything.
    fn dismiss_all(&mut self, crewman: CrewmanId) -> DispatchResult<()>;

    /// Pre-empt running occurrences so their crew can be reused.
    ///
    /// Each occurrence is handled by its own interruption policy; with
    /// `try_again_now` the ones that may continue are queued for reassignment
    /// as soon as possible.  With `recursive`, their parallel tasks are
    /// interrupted too.  Occurrences without a pending event (such as the
    /// one being assigned) are left alone.
    fn interrupt(
        &mut self,
        occurrences:   &[OccurrenceId],
        try_again_now: bool,
        recursive:     bool,
    ) -> DispatchResult<()>;

    /// Report an assignment change to the observers.  `crewman` is `None`
    /// when an occurrence needs no crew, `occurrence` is `None` when the
    /// crewman was released.
    fn notify_assignment(&mut self, crewman: Option<CrewmanId>, occurrence: Option<OccurrenceId>);
}
