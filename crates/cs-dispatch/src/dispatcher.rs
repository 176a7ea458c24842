//! The `Dispatcher` trait — the assignment strategy plugged into the engine.

use cs_core::{OccurrenceId, SimTime};

use crate::{AssignmentContext, DispatchError, DispatchResult};

/// Returned by [`Dispatcher::task_assignment`] when the occurrence could not
/// be staffed.  Any negative time means the same.
pub const ASSIGNMENT_FAILED: SimTime = SimTime::MIN;

/// Returned by [`Dispatcher::task_assignment`] for an assignment that never
/// needs reconsidering.
pub const NEVER_EXPIRES: SimTime = SimTime::MAX;

/// Pluggable crew assignment strategy.
///
/// # Example
///
/// ```rust,ignore
/// struct FirstQualified;
///
/// impl Dispatcher for FirstQualified {
///     fn task_assignment(&self, occ: OccurrenceId, ctx: &mut dyn AssignmentContext) -> DispatchResult<SimTime> {
///         let task = ctx.occurrence(occ).ok_or(DispatchError::UnknownOccurrence(occ))?.task_id();
///         let Some(&(crewman, _)) = ctx.qualified_crew(task).first() else {
///             return Ok(ASSIGNMENT_FAILED);
///         };
///         ctx.assign(crewman, occ)?;
///         Ok(NEVER_EXPIRES)
///     }
/// }
/// ```
pub trait Dispatcher: Send + Sync {
    /// Staff `occurrence` at `ctx.now()`.
    ///
    /// Returns the time at which the assignment should be reconsidered, or a
    /// negative time (typically [`ASSIGNMENT_FAILED`]) when not enough crew
    /// could be freed.  On failure the occurrence must be left unstaffed.
    fn task_assignment(
        &self,
        occurrence: OccurrenceId,
        ctx:        &mut dyn AssignmentContext,
    ) -> DispatchResult<SimTime>;

    /// Release every crew member from `occurrence`.
    ///
    /// Default: dismiss each assigned crewman and report the release.
    fn task_dismiss(
        &self,
        occurrence: OccurrenceId,
        ctx:        &mut dyn AssignmentContext,
    ) -> DispatchResult<()> {
        let assigned = ctx
            .occurrence(occurrence)
            .ok_or(DispatchError::UnknownOccurrence(occurrence))?
            .assigned
            .clone();
        for crewman in assigned {
            ctx.dismiss(crewman, occurrence)?;
            ctx.notify_assignment(Some(crewman), None);
        }
        Ok(())
    }
}
