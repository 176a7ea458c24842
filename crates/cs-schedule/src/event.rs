//! Task events and their total order.
//!
//! The order of [`EventSubtype`] variants is load-bearing: at equal time the
//! lower subtype is consumed first, so every stop-like event (Killed first of
//! all) precedes every start-like one.

use std::cmp::Ordering;
use std::fmt;

use cs_core::{OccurrenceId, SimTime, TaskId};

// ── EventSubtype ──────────────────────────────────────────────────────────────

/// Lifecycle step of a task occurrence.
///
/// The discriminants are single bits so that meta-groups can be expressed as
/// masks; declaration order equals numeric order, which the derived `Ord`
/// relies on.
#[repr(u32)]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub enum EventSubtype {
    #[default]
    Undefined       = 0,
    /// Removed immediately without completing.
    Killed          = 2,
    /// Aborted before it started.
    Cancelled       = 4,
    /// Natural end after completion.
    Ends            = 8,
    /// Put aside while the current phase excludes it.
    Hibernated      = 16,
    /// Reached the end of its daily window or a Sunday.
    Adjourned       = 32,
    /// The assigned crew is given a chance to leave.
    WorkInterrupted = 64,
    /// Reassignment attempt after an interruption.
    WorkContinues   = 128,
    /// Resumption after an adjournment.
    Resumes         = 256,
    /// Resumption after a hibernation.
    Awakes          = 512,
    Arrives         = 1024,
    /// Occurrence set to start at a precise future time.
    Planned         = 2048,
    /// Occurrence waiting for the next phase.
    ForNextPhase    = 4096,
}

impl EventSubtype {
    #[inline(always)]
    pub const fn bits(self) -> u32 {
        self as u32
    }

    #[inline]
    pub fn is_start(self) -> bool {
        EventGroup::META_START.contains(self)
    }

    #[inline]
    pub fn is_stop(self) -> bool {
        EventGroup::META_STOP.contains(self)
    }

    #[inline]
    pub fn is_not_started(self) -> bool {
        EventGroup::META_NOT_STARTED.contains(self)
    }
}

impl fmt::Display for EventSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A bit mask over [`EventSubtype`]s.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct EventGroup(u32);

impl EventGroup {
    pub const META_START: EventGroup = EventGroup(
        EventSubtype::Arrives.bits()
            | EventSubtype::Awakes.bits()
            | EventSubtype::Planned.bits()
            | EventSubtype::Resumes.bits()
            | EventSubtype::WorkContinues.bits(),
    );

    pub const META_STOP: EventGroup = EventGroup(
        EventSubtype::Adjourned.bits()
            | EventSubtype::Cancelled.bits()
            | EventSubtype::Ends.bits()
            | EventSubtype::Hibernated.bits()
            | EventSubtype::Killed.bits()
            | EventSubtype::WorkInterrupted.bits(),
    );

    pub const META_NOT_STARTED: EventGroup =
        EventGroup(EventSubtype::Planned.bits() | EventSubtype::ForNextPhase.bits());

    /// `Undefined` belongs to no group.
    #[inline]
    pub fn contains(self, subtype: EventSubtype) -> bool {
        let s = subtype.bits();
        s != 0 && (s & self.0) == s
    }
}

// ── TaskRank ──────────────────────────────────────────────────────────────────

/// The task-dependent part of the event order, cached on each event so that
/// comparisons never touch the task table.
///
/// `Ord` puts the occurrence that must be served first *first*: higher
/// priority, then more crew needed, then more parallel tasks, then lower task
/// id, then earlier arrival.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct TaskRank {
    pub priority:       i32,
    pub crew_needed:    u32,
    pub parallel_count: u32,
    pub task_id:        TaskId,
    pub arrives:        SimTime,
}

impl Default for TaskRank {
    fn default() -> Self {
        Self {
            priority:       0,
            crew_needed:    0,
            parallel_count: 0,
            task_id:        TaskId::INVALID,
            arrives:        SimTime::ZERO,
        }
    }
}

impl Ord for TaskRank {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.crew_needed.cmp(&self.crew_needed))
            .then_with(|| other.parallel_count.cmp(&self.parallel_count))
            .then_with(|| self.task_id.cmp(&other.task_id))
            .then_with(|| self.arrives.cmp(&other.arrives))
    }
}

impl PartialOrd for TaskRank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ── TaskEvent ─────────────────────────────────────────────────────────────────

/// One pending lifecycle step of one task occurrence.
///
/// Order: time, subtype, [`TaskRank`], and finally the occurrence index so
/// that two distinct events never compare equal.
#[derive(Copy, Clone, Debug)]
pub struct TaskEvent {
    pub time:       SimTime,
    pub subtype:    EventSubtype,
    pub occurrence: OccurrenceId,
    pub rank:       TaskRank,
}

impl TaskEvent {
    pub fn new(occurrence: OccurrenceId, rank: TaskRank, time: SimTime, subtype: EventSubtype) -> Self {
        Self { time, subtype, occurrence, rank }
    }

    #[inline]
    pub fn task_id(&self) -> TaskId {
        self.rank.task_id
    }

    /// The time-independent order used by the ASAP queue.
    #[inline]
    pub fn asap_cmp(&self, other: &Self) -> Ordering {
        self.rank.cmp(&other.rank).then_with(|| self.occurrence.cmp(&other.occurrence))
    }
}

impl PartialEq for TaskEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TaskEvent {}

impl Ord for TaskEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            .then_with(|| self.subtype.cmp(&other.subtype))
            .then_with(|| self.asap_cmp(other))
    }
}

impl PartialOrd for TaskEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TaskEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.time, self.subtype, self.rank.task_id)
    }
}
