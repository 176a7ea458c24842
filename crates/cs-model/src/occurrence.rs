//! `TaskOccurrence` — one concrete instance of a task during a replication.
//!
//! The definition is shared through an `Arc<Task>`; the occurrence owns copies
//! of the three distributions so that sampling caches a realized value per
//! occurrence, plus the progress bookkeeping:
//!
//! ```text
//! remaining    work still to do
//! last_process instant up to which `remaining` has been accounted
//! arrives      (virtual) arrival time; setting it also resets last_process
//! assigned     crew currently working on it
//! ```

use std::fmt;
use std::sync::Arc;

use cs_core::{CrewmanId, OccurrenceId, SimRng, SimTime, TaskId, TimeDistribution, TimeUnit};

use crate::task::Task;

#[derive(Clone, Debug)]
pub struct TaskOccurrence {
    pub id:          OccurrenceId,
    task:            Arc<Task>,
    pub start_date:  TimeDistribution,
    pub duration:    TimeDistribution,
    pub date_offset: TimeDistribution,
    remaining:       SimTime,
    last_process:    SimTime,
    arrives:         SimTime,
    /// Crew currently assigned, kept symmetric with `Crewman::tasks_assigned`.
    pub assigned:    Vec<CrewmanId>,
}

impl TaskOccurrence {
    pub fn new(id: OccurrenceId, task: Arc<Task>) -> Self {
        let arrives = SimTime::new(TimeUnit::Seconds, -1.0);
        Self {
            id,
            start_date: task.start_date,
            duration: task.duration,
            date_offset: task.date_offset,
            task,
            remaining: SimTime::ZERO,
            last_process: arrives,
            arrives,
            assigned: Vec::new(),
        }
    }

    #[inline]
    pub fn task(&self) -> &Task {
        &self.task
    }

    #[inline]
    pub fn task_arc(&self) -> &Arc<Task> {
        &self.task
    }

    #[inline]
    pub fn task_id(&self) -> TaskId {
        self.task.id
    }

    // ── Progress ─────────────────────────────────────────────────────────

    #[inline]
    pub fn arrives(&self) -> SimTime {
        self.arrives
    }

    /// Set the arrival time; progress is accounted from there on.
    pub fn set_arrives(&mut self, t: SimTime) {
        self.arrives = t;
        self.last_process = t;
    }

    #[inline]
    pub fn remaining(&self) -> SimTime {
        self.remaining
    }

    pub fn set_remaining(&mut self, remaining: SimTime) {
        debug_assert!(!remaining.is_negative(), "remaining duration must not be negative");
        self.remaining = if remaining.is_negative() { SimTime::ZERO } else { remaining };
    }

    #[inline]
    pub fn last_process(&self) -> SimTime {
        self.last_process
    }

    #[inline]
    pub fn completed(&self) -> bool {
        !self.remaining.is_positive()
    }

    #[inline]
    pub fn is_staffed(&self) -> bool {
        self.assigned.len() >= self.task.crew_needed as usize
    }

    /// Draw the start date and duration of a fresh occurrence.
    pub fn sample(&mut self, rng: &mut SimRng) {
        self.start_date.next_value(rng);
        self.duration.next_value(rng);
    }

    /// Reset the remaining work to the sampled duration.
    pub fn prepare_for_next_occurrence(&mut self) {
        self.remaining = self.duration.x_value();
        self.last_process = self.arrives;
    }

    /// Account the work done since the last call, if the occurrence is fully
    /// staffed.  Returns the duration accounted.
    pub fn process_until_now(&mut self, now: SimTime) -> SimTime {
        let previous = self.last_process;
        self.last_process = now;
        if self.is_staffed() {
            let d = now - previous;
            if d.is_positive() {
                self.consume(d);
                return d;
            }
        }
        SimTime::ZERO
    }

    /// Skip the time since the last call without doing any work.
    #[inline]
    pub fn sleep_until_now(&mut self, now: SimTime) {
        self.last_process = now;
    }

    /// Count the time since the last call as done, staffed or not.
    pub fn discard_until_now(&mut self, now: SimTime) {
        let d = now - self.last_process;
        if d.is_positive() {
            self.consume(d);
        }
        self.last_process = now;
    }

    fn consume(&mut self, d: SimTime) {
        let r = self.remaining - d;
        self.remaining = if r.is_negative() { SimTime::ZERO } else { r };
    }

    // ── Calendar ─────────────────────────────────────────────────────────

    #[inline]
    pub fn next_possible_resume(&self, t: SimTime, allow_current: bool) -> SimTime {
        self.task.next_possible_resume(t, allow_current)
    }

    #[inline]
    pub fn is_allowed_time(&self, t: SimTime) -> bool {
        self.task.is_allowed_time(t)
    }
}

impl fmt::Display for TaskOccurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.task, self.id.0)
    }
}
