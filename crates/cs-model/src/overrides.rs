//! Phase-specific task references.
//!
//! A phase lists the tasks it schedules on its own (beyond those matching its
//! type) as [`TaskRef`]s: the id of a task in the table plus the fields that
//! differ for this phase.  The effective task is resolved on demand from the
//! table entry, so editing the base task is immediately visible through every
//! reference that does not override the edited field.

use cs_core::{SimTime, TaskId, TimeDistribution};

use crate::task::{RelativeDateType, Task};

/// Fields a phase may override on a referenced task.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TaskOverrides {
    pub start_date:       Option<TimeDistribution>,
    /// Ignored unless the task is periodic.
    pub date_offset:      Option<TimeDistribution>,
    pub daily_hour_start: Option<SimTime>,
    pub daily_hour_end:   Option<SimTime>,
    pub on_holidays:      Option<bool>,
    pub duration:         Option<TimeDistribution>,
    pub priority:         Option<i32>,
    pub crew_needed:      Option<u32>,
    /// Clamped into `[0, 24 h]` when applied.
    pub rotation:         Option<SimTime>,
    pub description:      Option<String>,
}

impl TaskOverrides {
    pub fn is_empty(&self) -> bool {
        *self == TaskOverrides::default()
    }

    /// Apply to a copy of `base`.
    pub fn apply(&self, base: &Task) -> Task {
        let mut task = base.clone();
        if let Some(d) = self.start_date {
            task.start_date = d;
        }
        if task.relative_date == RelativeDateType::Frequency {
            if let Some(d) = self.date_offset {
                task.date_offset = d;
            }
        }
        if let Some(t) = self.daily_hour_start {
            task.daily_hour_start = t;
        }
        if let Some(t) = self.daily_hour_end {
            task.daily_hour_end = t;
        }
        if let Some(b) = self.on_holidays {
            task.on_holidays = b;
        }
        if let Some(d) = self.duration {
            task.duration = d;
        }
        if let Some(p) = self.priority {
            task.priority = p;
        }
        if let Some(n) = self.crew_needed {
            task.crew_needed = n;
        }
        if let Some(r) = self.rotation {
            task.rotation = r;
        }
        if let Some(desc) = &self.description {
            task.description.clone_from(desc);
        }
        task.validate();
        task
    }
}

/// A phase's reference to a task of the table.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TaskRef {
    pub task:      TaskId,
    pub overrides: TaskOverrides,
}

impl TaskRef {
    pub fn new(task: TaskId) -> Self {
        Self { task, overrides: TaskOverrides::default() }
    }

    pub fn with_overrides(task: TaskId, overrides: TaskOverrides) -> Self {
        Self { task, overrides }
    }

    /// The effective task; `None` when `base` is not the referenced task.
    pub fn resolve(&self, base: &Task) -> Option<Task> {
        (base.id == self.task).then(|| self.overrides.apply(base))
    }
}
