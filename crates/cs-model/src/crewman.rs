//! Crew members and their lazily refreshed work-time bookkeeping.

use std::collections::BTreeMap;
use std::fmt;

use cs_core::{CrewmanId, OccurrenceId, SimTime, TaskId, TypeCode};

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Crewman {
    pub id:             CrewmanId,
    pub name:           String,
    pub description:    String,
    pub crewman_type:   TypeCode,
    /// Task id → percentage in `0..=100`.
    pub qualifications: BTreeMap<TaskId, u8>,

    cumulated_work_time: SimTime,
    current_load:        u32,
    tasks_assigned:      Vec<OccurrenceId>,
    last_refresh:        SimTime,
}

impl Crewman {
    pub fn new(id: CrewmanId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            crewman_type: TypeCode::NONE,
            qualifications: BTreeMap::new(),
            cumulated_work_time: SimTime::ZERO,
            current_load: 0,
            tasks_assigned: Vec::new(),
            last_refresh: SimTime::MIN,
        }
    }

    pub fn with_qualification(mut self, task: TaskId, percent: u8) -> Self {
        self.qualifications.insert(task, percent.min(100));
        self
    }

    #[inline]
    pub fn qualification(&self, task: TaskId) -> u8 {
        self.qualifications.get(&task).copied().unwrap_or(0)
    }

    // ── Simulation state ─────────────────────────────────────────────────

    /// Work time up to the last refresh.  Call [`Crewman::refresh_status`]
    /// first for an up-to-date value.
    #[inline]
    pub fn cumulated_work_time(&self) -> SimTime {
        self.cumulated_work_time
    }

    /// Number of assigned occurrences that count as work.
    #[inline]
    pub fn current_load(&self) -> u32 {
        self.current_load
    }

    #[inline]
    pub fn tasks_assigned(&self) -> &[OccurrenceId] {
        &self.tasks_assigned
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.tasks_assigned.is_empty()
    }

    #[inline]
    pub fn last_refresh(&self) -> SimTime {
        self.last_refresh
    }

    /// Advance the cumulated work time to `time`.  Returns `false` when
    /// already up to date.
    pub fn refresh_status(&mut self, time: SimTime) -> bool {
        debug_assert!(self.last_refresh <= time, "crewman {} refreshed back in time", self.id);
        if time == self.last_refresh {
            return false;
        }
        if self.current_load > 0 {
            let offset = time - self.last_refresh;
            if offset.is_positive() {
                self.cumulated_work_time += offset;
            }
        }
        self.last_refresh = time;
        true
    }

    /// Record an assignment.  The caller keeps the occurrence's own list of
    /// assigned crew in sync.
    pub fn assign_task(&mut self, time: SimTime, occurrence: OccurrenceId, is_work: bool) {
        self.refresh_status(time);
        self.tasks_assigned.push(occurrence);
        if is_work {
            self.current_load += 1;
        }
    }

    /// Record the end of an assignment.
    pub fn dismiss_task(&mut self, time: SimTime, occurrence: OccurrenceId, is_work: bool) {
        self.refresh_status(time);
        if let Some(i) = self.tasks_assigned.iter().position(|&o| o == occurrence) {
            self.tasks_assigned.remove(i);
            if is_work {
                debug_assert!(self.current_load > 0, "crewman {} load underflow", self.id);
                self.current_load = self.current_load.saturating_sub(1);
            }
        }
    }

    /// Forget every assignment.  Returns the occurrences that were assigned,
    /// so the caller can update their side of the relation.
    pub fn dismiss_all_tasks(&mut self, time: SimTime) -> Vec<OccurrenceId> {
        self.refresh_status(time);
        self.current_load = 0;
        std::mem::take(&mut self.tasks_assigned)
    }

    pub fn prepare_for_next_replication(&mut self) {
        self.last_refresh = SimTime::MIN;
        self.cumulated_work_time = SimTime::ZERO;
        self.current_load = 0;
        self.tasks_assigned.clear();
    }
}

impl fmt::Display for Crewman {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.id.0, self.name)
    }
}
