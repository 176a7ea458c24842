//! `BasicDispatcher` — picks the best-scoring qualified crew.
//!
//! A crewman is a candidate for an occurrence when idle, when holding only
//! work of a lower priority class (`priority / 100`), or when already on this
//! very occurrence.  Candidates score
//!
//! ```text
//! 5 × qualification − cumulated work hours
//! ```
//!
//! and the `crew_needed` best ones are taken, pre-empting whatever they were
//! doing.  One crewman works on one occurrence at a time.

use std::cmp::Ordering;

use cs_core::{CrewmanId, OccurrenceId, SimTime};
use cs_schedule::BinaryHeap;
use tracing::trace;

use crate::{
    ASSIGNMENT_FAILED, AssignmentContext, DispatchError, DispatchResult, Dispatcher, NEVER_EXPIRES,
};

const QUALIFICATION_WEIGHT: f64 = 5.0;
const WORK_HOURS_WEIGHT: f64 = -1.0;

#[derive(Clone, Debug)]
pub struct BasicDispatcher {
    /// How long an assignment holds before the occurrence is re-dispatched,
    /// possibly to other crew.
    pub assignment_expiry: SimTime,
}

impl Default for BasicDispatcher {
    fn default() -> Self {
        Self { assignment_expiry: SimTime::hours(4.0) }
    }
}

impl BasicDispatcher {
    pub fn new(assignment_expiry: SimTime) -> Self {
        Self { assignment_expiry }
    }
}

/// Heap entry; the minimum is the weakest candidate kept so far.
#[derive(Clone, Copy, Debug)]
struct Score {
    score:   f64,
    crewman: CrewmanId,
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.crewman.cmp(&self.crewman))
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Score {}

impl Dispatcher for BasicDispatcher {
    fn task_assignment(
        &self,
        occurrence: OccurrenceId,
        ctx:        &mut dyn AssignmentContext,
    ) -> DispatchResult<SimTime> {
        let time = ctx.now();
        let task = ctx
            .occurrence(occurrence)
            .ok_or(DispatchError::UnknownOccurrence(occurrence))?
            .task_arc()
            .clone();
        debug_assert!(task.is_allowed_time(time), "{task} assigned outside its daily hours");

        let needed = task.crew_needed as usize;
        if needed == 0 {
            ctx.notify_assignment(None, Some(occurrence));
            return Ok(NEVER_EXPIRES);
        }

        let priority_class = task.priority / 100;
        let mut best: BinaryHeap<Score> = BinaryHeap::with_capacity(needed);
        let qualified = ctx.qualified_crew(task.id).to_vec();
        for (id, qualification) in qualified {
            let Some(crewman) = ctx.crewman(id) else {
                continue;
            };
            let current_priority = crewman
                .tasks_assigned()
                .first()
                .and_then(|&o| ctx.occurrence(o))
                .map_or(0, |o| o.task().priority);
            let holds_it = crewman.tasks_assigned().contains(&occurrence);
            if current_priority != 0 && priority_class <= current_priority / 100 && !holds_it {
                continue;
            }
            ctx.refresh_crewman(id);
            let hours = ctx.crewman(id).map_or(0.0, |c| c.cumulated_work_time().total_hours());
            let entry = Score {
                score:   f64::from(qualification) * QUALIFICATION_WEIGHT + hours * WORK_HOURS_WEIGHT,
                crewman: id,
            };
            if best.len() < needed {
                best.push(entry);
            } else if best.peek().is_some_and(|weakest| weakest.score < entry.score) {
                best.pop();
                best.push(entry);
            }
        }

        if best.len() < needed {
            trace!(task = %task, found = best.len(), needed, "not enough crew available");
            return Ok(ASSIGNMENT_FAILED);
        }

        for entry in best.into_sorted_vec().into_iter().rev() {
            let held: Vec<OccurrenceId> = ctx
                .crewman(entry.crewman)
                .map(|c| c.tasks_assigned().to_vec())
                .unwrap_or_default();
            if !held.is_empty() {
                ctx.interrupt(&held, true, true)?;
                ctx.dismiss_all(entry.crewman)?;
            }
            ctx.assign(entry.crewman, occurrence)?;
            trace!(task = %task, crewman = %entry.crewman, score = entry.score, "assigned");
            ctx.notify_assignment(Some(entry.crewman), Some(occurrence));
        }
        Ok(time + self.assignment_expiry)
    }
}
