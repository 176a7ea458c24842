//! Phases, references to them, and the per-replication phase snapshot.
//!
//! A [`Phase`] is a shared, immutable origin.  A scenario holds
//! [`PhaseRef`]s: the origin behind an `Arc` plus a [`PhaseOverrides`]
//! record, so several scenario slots can reuse one phase definition and
//! differ only in what they override.  The engine works on [`SimPhase`], the
//! resolved form of one slot.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use cs_core::{DistributionKind, PhaseId, SimTime, TaskId, TimeDistribution, TypeCode};

use crate::overrides::TaskRef;
use crate::table::TaskTable;
use crate::task::Task;

/// Shortest phase duration accepted by validation.
pub const ARBITRARY_MIN_DURATION: SimTime = SimTime::with_unit(
    6 * cs_core::time::TICKS_PER_MINUTE,
    cs_core::TimeUnit::Minutes,
);

/// Longest phase duration; also the engine's hard cap on a phase.
pub const ARBITRARY_MAX_DURATION: SimTime = SimTime::with_unit(
    61 * cs_core::time::TICKS_PER_DAY,
    cs_core::TimeUnit::Days,
);

// ── Phase ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Phase {
    pub name:        String,
    pub description: String,
    pub phase_type:  TypeCode,
    pub duration:    TimeDistribution,
    /// Tasks scheduled by this phase regardless of their phase types.
    pub tasks:       BTreeMap<TaskId, TaskRef>,
}

impl Phase {
    pub fn new(name: impl Into<String>, phase_type: TypeCode, duration: TimeDistribution) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            phase_type,
            duration,
            tasks: BTreeMap::new(),
        }
    }

    pub fn with_task(mut self, task_ref: TaskRef) -> Self {
        self.tasks.insert(task_ref.task, task_ref);
        self
    }

    /// System phases (name starting with `!`) are kept first and are not
    /// copied when scenarios are appended.
    #[inline]
    pub fn is_system(&self) -> bool {
        self.name.starts_with('!')
    }

    pub fn error_message(&self) -> Option<String> {
        phase_error(self.phase_type, &self.duration)
    }
}

/// Validation shared by origins and resolved references.
fn phase_error(phase_type: TypeCode, duration: &TimeDistribution) -> Option<String> {
    if phase_type.0 <= 0 {
        return Some("The type of this phase is not set!".into());
    }
    if duration.kind() == DistributionKind::Exponential {
        return Some(
            "A phase must not have a duration defined as an exponential distribution (0, mean, 0)!".into(),
        );
    }
    if duration.min_possible() < ARBITRARY_MIN_DURATION {
        return Some(format!(
            "This phase must have a minimum duration of at least {} minutes!",
            ARBITRARY_MIN_DURATION.total_minutes()
        ));
    }
    if duration.max_possible() > ARBITRARY_MAX_DURATION {
        return Some(format!(
            "The duration of this phase must not exceed {} days!",
            ARBITRARY_MAX_DURATION.total_days()
        ));
    }
    None
}

// ── PhaseRef ──────────────────────────────────────────────────────────────────

/// Fields a scenario slot may override on its phase.
#[derive(Clone, Debug, Default)]
pub struct PhaseOverrides {
    pub duration:    Option<TimeDistribution>,
    pub description: Option<String>,
    /// Task references added by auto-expansion.
    pub expanded_tasks: BTreeMap<TaskId, TaskRef>,
}

/// One slot of a scenario.
#[derive(Clone, Debug)]
pub struct PhaseRef {
    /// Sequential id, assigned before the first simulation.
    pub id:        PhaseId,
    origin:        Arc<Phase>,
    pub overrides: PhaseOverrides,
}

impl PhaseRef {
    pub fn new(origin: Arc<Phase>) -> Self {
        Self { id: PhaseId::INVALID, origin, overrides: PhaseOverrides::default() }
    }

    #[inline]
    pub fn origin(&self) -> &Arc<Phase> {
        &self.origin
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.origin.name
    }

    #[inline]
    pub fn phase_type(&self) -> TypeCode {
        self.origin.phase_type
    }

    pub fn duration(&self) -> TimeDistribution {
        self.overrides.duration.unwrap_or(self.origin.duration)
    }

    pub fn description(&self) -> &str {
        self.overrides.description.as_deref().unwrap_or(&self.origin.description)
    }

    #[inline]
    pub fn is_system(&self) -> bool {
        self.origin.is_system()
    }

    /// Phase-specific task references, origin first.
    pub fn tasks(&self) -> impl Iterator<Item = &TaskRef> {
        self.origin.tasks.values().chain(self.overrides.expanded_tasks.values())
    }

    pub fn contains_task(&self, id: TaskId) -> bool {
        self.origin.tasks.contains_key(&id) || self.overrides.expanded_tasks.contains_key(&id)
    }

    pub fn error_message(&self) -> Option<String> {
        phase_error(self.phase_type(), &self.duration())
    }

    /// Resolve against `table` into an engine snapshot.  References to tasks
    /// missing from the table are skipped.
    pub fn to_sim_phase(&self, table: &TaskTable) -> SimPhase {
        let tasks = self
            .tasks()
            .filter_map(|r| table.get(r.task).and_then(|base| r.resolve(base)))
            .map(Arc::new)
            .collect();
        SimPhase {
            id: self.id,
            name: self.origin.name.clone(),
            phase_type: self.phase_type(),
            duration: self.duration(),
            tasks,
            begin: SimTime::ZERO,
        }
    }
}

impl fmt::Display for PhaseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.id.0, self.origin.name)
    }
}

// ── SimPhase ──────────────────────────────────────────────────────────────────

/// A scenario slot as the engine sees it during one replication.
#[derive(Clone, Debug)]
pub struct SimPhase {
    pub id:         PhaseId,
    pub name:       String,
    pub phase_type: TypeCode,
    /// Sampled once per replication.
    pub duration:   TimeDistribution,
    /// Resolved phase-specific tasks.
    pub tasks:      Vec<Arc<Task>>,
    /// Simulation time at which the phase began.
    pub begin:      SimTime,
}

impl SimPhase {
    pub fn contains_task(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    /// Whether `task` may run during this phase: by type, or as one of its
    /// specific tasks.
    pub fn allows(&self, task: &Task) -> bool {
        task.allowed_in(self.phase_type) || self.contains_task(task.id)
    }
}

impl fmt::Display for SimPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.id.0, self.name)
    }
}
