//! Task definitions and their scheduling and interruption policies.
//!
//! Every policy enum keeps the stable integer code of the data format
//! (`code()`), and parses from its name case-insensitively.  Parsing ignores
//! anything after the first space, accepts the numeric code, and falls back
//! to `Undefined` for unknown input, so a malformed data set never aborts a
//! load.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use cs_core::{SimTime, TaskId, TimeDistribution, TypeCode};

/// Name-or-code parser shared by every policy enum.
macro_rules! policy_enum {
    (
        $(#[$attr:meta])*
        pub enum $name:ident {
            $( $(#[$vattr:meta])* $variant:ident = $code:expr ),+ $(,)?
        }
        aliases { $( $alias:literal => $target:ident ),* $(,)? }
    ) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum $name {
            #[default]
            $( $(#[$vattr])* $variant ),+
        }

        impl $name {
            /// Integer code used by the data format.
            pub const fn code(self) -> i32 {
                match self {
                    $( $name::$variant => $code ),+
                }
            }

            pub fn from_code(code: i32) -> Option<Self> {
                match code {
                    $( c if c == $code => Some($name::$variant), )+
                    _ => None,
                }
            }
        }

        impl FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let word = s.trim().split(' ').next().unwrap_or_default();
                $( if word == $alias { return Ok($name::$target); } )*
                if let Ok(code) = word.parse::<i32>() {
                    return Ok(Self::from_code(code).unwrap_or_default());
                }
                $( if word.eq_ignore_ascii_case(stringify!($variant)) { return Ok($name::$variant); } )+
                Ok($name::default())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Debug::fmt(self, f)
            }
        }
    };
}

policy_enum! {
    /// What the start date of an occurrence is relative to.
    pub enum RelativeDateType {
        Undefined = 0,
        /// Start counted backwards from the end of the phase.
        RelativeStopFromEndOfPhase = -2,
        RelativeStartFromStartOfPhase = 1,
        RelativeStartFromEndOfPhase = 2,
        /// Periodic: each occurrence is chained off the previous one.
        Frequency = 3,
        RelativeStartFromPreviousStart = 5,
        /// Only ever started by a master task.
        TriggeredByAnEvent = 9,
        AbsoluteStartWeekDay = 12,
        AbsoluteStartMonthDay = 13,
    }
    aliases {
        "RelativeStartFromPreviousStartOccurrence" => Frequency,
        "RelativeStartFromPreviousStartOccurence" => Frequency,
        "RelativeStartFromPreviousEndOccurence" => Frequency,
    }
}

policy_enum! {
    /// How the daily hour window constrains an occurrence.
    pub enum RelativeTimeType {
        Undefined = 0,
        AbsoluteStopTime = -1,
        AbsoluteStartTime = 1,
        TimeWindow = 3,
    }
    aliases {}
}

policy_enum! {
    /// What happens when another task takes the crew away.
    pub enum TaskInterruptionPolicy {
        Undefined = 0,
        DropWithError = 2,
        DropWithoutError = 4,
        ContinueOrDropWithError = 8,
        ContinueOrDropWithoutError = 16,
        ContinueOrResumeWithError = 32,
        ContinueOrResumeWithoutError = 64,
    }
    aliases {}
}

policy_enum! {
    /// What happens to a pending occurrence when the phase changes.
    pub enum PhaseInterruptionPolicy {
        Undefined = 0,
        /// The phase cannot end before the occurrence does.
        Obligatory = 1,
        /// Runs to completion once started, ignoring daily windows.
        DoNotInterrupt = 2,
        WholePhase = 3,
        ResumeOrDropWithError = 4,
        ContinueOrDropWithError = 6,
        DropWithError = 7,
        ResumeOrDropWithoutError = 14,
        ContinueOrDropWithoutError = 16,
        DropWithoutError = 17,
    }
    aliases {
        "DontInterrupt" => DoNotInterrupt,
        "ResumeAndComplete" => ResumeOrDropWithError,
    }
}

policy_enum! {
    /// What happens to a pending occurrence when the scenario ends.
    pub enum ScenarioInterruptionPolicy {
        Undefined = 0,
        DropWithError = 7,
        DropWithoutError = 17,
    }
    aliases {}
}

policy_enum! {
    /// What happens when an occurrence arrives while another one of the same
    /// task is still active.
    pub enum TaskDuplicatesPolicy {
        /// Same as `MergeDuplicates`.
        Undefined = 0,
        KeepDuplicates = 1,
        /// The old occurrence is stopped and its remaining work added to the new one.
        MergeDuplicates = 2,
        /// The old occurrence is stopped and its remaining work discarded.
        KillOldDuplicates = 3,
        /// The new occurrence is cancelled.
        RejectNewDuplicates = 4,
    }
    aliases {}
}

/// Task type codes with a meaning for the engine.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum StandardTaskType {
    Idle              = 0,
    Rest              = 3,
    ExternalCondition = 4,
    CriticalEvents    = 5,
    InternalWait      = 49,
}

impl StandardTaskType {
    #[inline]
    pub const fn code(self) -> TypeCode {
        TypeCode(self as i32)
    }
}

/// The three relation kinds between tasks.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RelationKind {
    /// Symmetric and transitively closed.
    Parallel,
    /// `a` Slave `b`: `b` is a slave of `a`.
    Slave,
    /// `a` Master `b`: `b` is a master of `a`.
    Master,
}

impl RelationKind {
    pub const fn code(self) -> i32 {
        match self {
            RelationKind::Parallel => 4,
            RelationKind::Slave => 7,
            RelationKind::Master => -7,
        }
    }
}

impl FromStr for RelationKind {
    type Err = cs_core::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let word = s.trim().split(' ').next().unwrap_or_default();
        match word.to_ascii_lowercase().as_str() {
            "parallel" | "4" => Ok(RelationKind::Parallel),
            "slave" | "7" => Ok(RelationKind::Slave),
            "master" | "-7" => Ok(RelationKind::Master),
            _ => Err(cs_core::CoreError::Parse(format!("unknown task relation '{s}'"))),
        }
    }
}

// ── Task ──────────────────────────────────────────────────────────────────────

/// Definition of a unit of work.
///
/// Relations are stored as id sets and only edited through
/// [`TaskTable`](crate::TaskTable), which keeps them symmetric.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Task {
    pub id:          TaskId,
    pub name:        String,
    pub description: String,
    pub task_type:   TypeCode,
    pub enabled:     bool,
    /// Instantiate one copy per crew member when the data set is expanded.
    pub auto_expand: bool,
    /// Set on the copies produced by auto-expansion.
    pub expanded_from: Option<TaskId>,

    pub priority:    i32,
    pub crew_needed: u32,

    pub relative_date: RelativeDateType,
    pub relative_time: RelativeTimeType,
    pub start_date:    TimeDistribution,
    /// Offset of the first occurrence of a periodic task.
    pub date_offset:   TimeDistribution,
    pub duration:      TimeDistribution,
    pub daily_hour_start: SimTime,
    pub daily_hour_end:   SimTime,
    pub on_holidays:      bool,
    /// Reassignment interval; zero for none.
    pub rotation:         SimTime,

    pub task_interruption:     TaskInterruptionPolicy,
    pub phase_interruption:    PhaseInterruptionPolicy,
    pub scenario_interruption: ScenarioInterruptionPolicy,
    pub duplicates:            TaskDuplicatesPolicy,

    /// Phase types in which the task may run.
    pub phase_types:   Vec<TypeCode>,
    pub crewman_types: Vec<TypeCode>,

    pub(crate) parallels: BTreeSet<TaskId>,
    pub(crate) slaves:    BTreeSet<TaskId>,
    pub(crate) masters:   BTreeSet<TaskId>,
}

impl Task {
    pub fn new(id: TaskId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            task_type: TypeCode::NONE,
            enabled: true,
            auto_expand: false,
            expanded_from: None,
            priority: 0,
            crew_needed: 1,
            relative_date: RelativeDateType::Undefined,
            relative_time: RelativeTimeType::Undefined,
            start_date: TimeDistribution::ZERO,
            date_offset: TimeDistribution::ZERO,
            duration: TimeDistribution::ZERO,
            daily_hour_start: SimTime::ZERO,
            daily_hour_end: SimTime::ZERO,
            on_holidays: true,
            rotation: SimTime::ZERO,
            task_interruption: TaskInterruptionPolicy::ContinueOrResumeWithoutError,
            phase_interruption: PhaseInterruptionPolicy::Undefined,
            scenario_interruption: ScenarioInterruptionPolicy::DropWithoutError,
            duplicates: TaskDuplicatesPolicy::Undefined,
            phase_types: Vec::new(),
            crewman_types: Vec::new(),
            parallels: BTreeSet::new(),
            slaves: BTreeSet::new(),
            masters: BTreeSet::new(),
        }
    }

    // ── Relations ────────────────────────────────────────────────────────

    pub fn parallels(&self) -> &BTreeSet<TaskId> {
        &self.parallels
    }

    pub fn slaves(&self) -> &BTreeSet<TaskId> {
        &self.slaves
    }

    pub fn masters(&self) -> &BTreeSet<TaskId> {
        &self.masters
    }

    pub fn relations(&self, kind: RelationKind) -> &BTreeSet<TaskId> {
        match kind {
            RelationKind::Parallel => &self.parallels,
            RelationKind::Slave => &self.slaves,
            RelationKind::Master => &self.masters,
        }
    }

    pub(crate) fn relations_mut(&mut self, kind: RelationKind) -> &mut BTreeSet<TaskId> {
        match kind {
            RelationKind::Parallel => &mut self.parallels,
            RelationKind::Slave => &mut self.slaves,
            RelationKind::Master => &mut self.masters,
        }
    }

    pub(crate) fn clear_relations(&mut self) {
        self.parallels.clear();
        self.slaves.clear();
        self.masters.clear();
    }

    // ── Classification ───────────────────────────────────────────────────

    /// Legacy flag: "no duplicate" meant killing the old occurrence.
    pub fn set_no_duplicate(&mut self, no_duplicate: bool) {
        self.duplicates = if no_duplicate {
            TaskDuplicatesPolicy::KillOldDuplicates
        } else {
            TaskDuplicatesPolicy::KeepDuplicates
        };
    }

    /// `true` unless duplicates are explicitly kept.
    #[inline]
    pub fn needs_duplicate_management(&self) -> bool {
        self.duplicates != TaskDuplicatesPolicy::KeepDuplicates
    }

    /// Start dates relative to the current phase; such tasks are enqueued
    /// afresh by every phase rather than chained across phases.
    #[inline]
    pub fn is_phase_dependent(&self) -> bool {
        matches!(
            self.relative_date,
            RelativeDateType::RelativeStartFromStartOfPhase
                | RelativeDateType::RelativeStartFromEndOfPhase
                | RelativeDateType::RelativeStopFromEndOfPhase
        )
    }

    #[inline]
    pub fn is_triggered(&self) -> bool {
        self.relative_date == RelativeDateType::TriggeredByAnEvent
    }

    /// Whether assigned crew accumulate work time.
    pub fn is_work(&self) -> bool {
        let t = self.task_type;
        t.0 > 0
            && t != StandardTaskType::InternalWait.code()
            && t.sub_code(1) != StandardTaskType::Rest.code().0
    }

    #[inline]
    pub fn is_obligatory(&self) -> bool {
        self.phase_interruption == PhaseInterruptionPolicy::Obligatory
    }

    /// Whether the task may run in a phase of type `phase_type`.
    pub fn allowed_in(&self, phase_type: TypeCode) -> bool {
        phase_type.matches_any(&self.phase_types)
    }

    // ── Validation ───────────────────────────────────────────────────────

    /// Normalize distributions and clamp the rotation into `[0, 24 h]`.
    pub fn validate(&mut self) {
        self.start_date.validate();
        self.date_offset.validate();
        self.duration.validate();
        if self.rotation.is_negative() {
            self.rotation = SimTime::ZERO;
        } else if self.rotation > SimTime::ONE_DAY {
            self.rotation = SimTime::ONE_DAY;
        }
    }

    /// First configuration error, if any.
    pub fn error_message(&self) -> Option<String> {
        if self.relative_date == RelativeDateType::Undefined {
            return Some("The relative date type of this task is not set!".into());
        }
        if self.relative_date == RelativeDateType::Frequency && !self.start_date.max_possible().is_positive() {
            return Some("A periodic task must have a positive frequency!".into());
        }
        let day = SimTime::ONE_DAY;
        if self.daily_hour_start.is_negative()
            || self.daily_hour_end.is_negative()
            || self.daily_hour_start > day
            || self.daily_hour_end > day
        {
            return Some("The daily hours of this task must be within 0h and 24h!".into());
        }
        None
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.error_message().is_none()
    }

    // ── Calendar ─────────────────────────────────────────────────────────

    /// Whether work may happen at `t`: inside the daily window, and not on a
    /// Sunday unless the task runs on holidays.  Sunday 00:00 still counts
    /// as Saturday's end.
    pub fn is_allowed_time(&self, t: SimTime) -> bool {
        t.in_day_time_interval(self.daily_hour_start, self.daily_hour_end)
            && (self.on_holidays || !t.is_sunday() || !t.next_down().is_sunday())
    }

    /// Earliest instant at or after `t` (strictly after when `allow_current`
    /// is false) at which work may resume.
    pub fn next_possible_resume(&self, t: SimTime, allow_current: bool) -> SimTime {
        let mut t = self.window_resume(t, allow_current);
        if !self.on_holidays && t.is_sunday() {
            t = t.next_week_time(SimTime::ONE_DAY, false);
            t = self.window_resume(t, true);
        }
        t
    }

    fn window_resume(&self, t: SimTime, allow_current: bool) -> SimTime {
        let work_start = t.next_day_time(self.daily_hour_start, allow_current);
        let work_end = t.next_day_time(self.daily_hour_end, allow_current);
        if work_start < work_end || t >= work_end {
            work_start
        } else if !allow_current {
            t.next_up()
        } else {
            t
        }
    }

    /// A copy for one crew member, with a fresh id and no relations.
    pub fn expanded_copy(&self, id: TaskId, crewman_label: &str) -> Task {
        let mut copy = self.clone();
        copy.id = id;
        copy.name = format!("{} | {}", self.name, crewman_label);
        copy.auto_expand = false;
        copy.expanded_from = Some(self.id);
        copy.clear_relations();
        copy
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.id.0, self.name)
    }
}
