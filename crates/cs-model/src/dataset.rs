//! `DataSet` — everything one simulation needs, and its preparation steps.
//!
//! The base task table is what the user edits.  Before simulating,
//! [`DataSet::auto_expand_tasks`] derives the *expanded* table in which every
//! auto-expand task is replaced by one copy per crew member; the engine only
//! ever reads the expanded table.  The base table is never modified by the
//! expansion, and [`DataSet::clean_auto_expanded_tasks`] undoes what it added
//! to the crew and the scenario.
//!
//! Preparation order:
//!
//! ```text
//! auto_expand_tasks → prepare_for_first_simulation → (prepare_for_next_replication → run)*
//! ```

use std::collections::BTreeMap;
use std::fmt;

use cs_core::{CrewmanId, PhaseId, TaskId};
use tracing::warn;

use crate::constructors::Constructors;
use crate::crew::Crew;
use crate::crewman::Crewman;
use crate::error::ModelResult;
use crate::overrides::TaskRef;
use crate::phase::PhaseRef;
use crate::scenario::Scenario;
use crate::table::TaskTable;
use crate::task::{RelationKind, Task};
use crate::workplace::Workplace;

/// First id tried for expanded copies.
pub const FIRST_AUTO_ID: i32 = 5000;

/// Expanded ids of one task are grouped into blocks of this size.
const AUTO_ID_BLOCK: i32 = 50;

#[derive(Clone, Debug, Default)]
pub struct DataSet {
    pub workplace:    Workplace,
    pub tasks:        TaskTable,
    pub scenario:     Scenario,
    pub crew:         Crew,
    pub constructors: Constructors,

    expanded:  TaskTable,
    /// Task id → crew with a non-zero qualification, ascending by crewman id.
    qualified: BTreeMap<TaskId, Vec<(CrewmanId, u8)>>,
}

impl DataSet {
    pub fn new(workplace: Workplace, tasks: TaskTable, scenario: Scenario, crew: Crew) -> Self {
        Self { workplace, tasks, scenario, crew, ..Self::default() }
    }

    /// Empty data set describing `workplace`.
    pub fn with_workplace(workplace: Workplace) -> Self {
        Self { workplace, ..Self::default() }
    }

    pub fn with_constructors(mut self, constructors: Constructors) -> Self {
        self.constructors = constructors;
        self
    }

    // ── Construction through callbacks ───────────────────────────────────

    /// Add a task built by the task constructor, with the next free id.
    pub fn create_task(&mut self, name: &str) -> ModelResult<TaskId> {
        let id = self.tasks.next_task_id();
        self.tasks.insert((self.constructors.task)(id, name))?;
        Ok(id)
    }

    /// Add a crew member built by the crewman constructor, with the next
    /// free id.
    pub fn create_crewman(&mut self, name: &str) -> CrewmanId {
        let id = self.crew.next_crewman_id();
        self.crew.insert((self.constructors.crewman)(id, name));
        id
    }

    /// Append the phase `name` to the scenario, loading it through the phase
    /// loader unless the scenario already uses it.
    pub fn add_phase(&mut self, name: &str) -> ModelResult<&mut PhaseRef> {
        let loader = &self.constructors.phase;
        self.scenario.add_phase(name, |n| loader(n))
    }

    // ── Expansion ────────────────────────────────────────────────────────

    /// The table the engine simulates; empty until
    /// [`DataSet::auto_expand_tasks`] has run.
    #[inline]
    pub fn expanded_tasks(&self) -> &TaskTable {
        &self.expanded
    }

    #[inline]
    pub fn expanded_tasks_mut(&mut self) -> &mut TaskTable {
        &mut self.expanded
    }

    /// Build the expanded table.
    ///
    /// Each auto-expand task is replaced by one copy per crew member.  A copy
    /// is fully qualified for its crew member only, inherits the parallel and
    /// slave relations of its original towards tasks present in the expanded
    /// table, and is referenced by every phase that references the original.
    pub fn auto_expand_tasks(&mut self) -> ModelResult<()> {
        self.clean_auto_expanded_tasks();
        let mut expanded = self.tasks.clone();
        let originals: Vec<TaskId> =
            self.tasks.iter().filter(|t| t.auto_expand).map(|t| t.id).collect();
        for &id in &originals {
            expanded.remove(id);
        }

        let mut pending: Vec<(TaskId, RelationKind, TaskId)> = Vec::new();
        let mut auto_id = FIRST_AUTO_ID;
        for &original_id in &originals {
            let Some(original) = self.tasks.get(original_id) else {
                continue;
            };
            for crewman in self.crew.iter_mut() {
                while expanded.contains(TaskId(auto_id)) || self.tasks.contains(TaskId(auto_id)) {
                    auto_id += 1;
                }
                let copy_id = TaskId(auto_id);
                let label = format!("{}-{:02}.{}", original.id.0, crewman.id.0, crewman.name);
                expanded.insert(original.expanded_copy(copy_id, &label))?;
                pending.extend(original.parallels().iter().map(|&t| (copy_id, RelationKind::Parallel, t)));
                pending.extend(original.slaves().iter().map(|&t| (copy_id, RelationKind::Slave, t)));
                crewman.qualifications.insert(copy_id, 100);

                for phase in &mut self.scenario.phases {
                    let source = phase
                        .origin()
                        .tasks
                        .get(&original_id)
                        .or_else(|| phase.overrides.expanded_tasks.get(&original_id))
                        .map(|r| r.overrides.clone());
                    if let Some(overrides) = source {
                        if !phase.contains_task(copy_id) {
                            phase
                                .overrides
                                .expanded_tasks
                                .insert(copy_id, TaskRef::with_overrides(copy_id, overrides));
                        }
                    }
                }
            }
            auto_id = (auto_id + AUTO_ID_BLOCK - 1) / AUTO_ID_BLOCK * AUTO_ID_BLOCK;
        }

        for (from, kind, to) in pending {
            if expanded.contains(to) {
                // Rejected relations (cycles) are skipped like in a manual edit.
                let _ = expanded.add_relation(from, kind, to);
            }
        }
        self.expanded = expanded;
        Ok(())
    }

    /// Remove everything [`DataSet::auto_expand_tasks`] added: the expanded
    /// table, the qualifications for expanded copies, and the phase
    /// references to them.
    pub fn clean_auto_expanded_tasks(&mut self) {
        let copies: Vec<TaskId> =
            self.expanded.iter().filter(|t| t.expanded_from.is_some()).map(|t| t.id).collect();
        for crewman in self.crew.iter_mut() {
            for id in &copies {
                crewman.qualifications.remove(id);
            }
        }
        for phase in &mut self.scenario.phases {
            phase.overrides.expanded_tasks.clear();
        }
        self.expanded.clear();
        self.qualified.clear();
    }

    // ── Preparation ──────────────────────────────────────────────────────

    /// Number the phases and cache who is qualified for what.
    pub fn prepare_for_first_simulation(&mut self) {
        for (i, phase) in self.scenario.phases.iter_mut().enumerate() {
            phase.id = PhaseId(i as i32 + 1);
        }
        self.qualified.clear();
        for crewman in self.crew.iter() {
            for (&task, &percent) in crewman.qualifications.iter().filter(|(_, p)| **p > 0) {
                if self.expanded.contains(task) {
                    self.qualified.entry(task).or_default().push((crewman.id, percent));
                } else if !self.tasks.contains(task) {
                    warn!(task = %task, crewman = %crewman, "qualification for an unknown task");
                }
            }
        }
    }

    pub fn prepare_for_next_replication(&mut self) {
        self.crew.prepare_for_next_replication();
    }

    /// Crew qualified for `task`, cached by
    /// [`DataSet::prepare_for_first_simulation`].
    pub fn qualified_crew(&self, task: TaskId) -> &[(CrewmanId, u8)] {
        self.qualified.get(&task).map_or(&[], Vec::as_slice)
    }

    #[inline]
    pub fn crewman(&self, id: CrewmanId) -> Option<&Crewman> {
        self.crew.get(id)
    }

    // ── Diagnostics ──────────────────────────────────────────────────────

    /// Whether `task` can ever be scheduled: through its phase types, as the
    /// slave of a master, or as a phase-specific task.
    pub fn task_is_used(&self, task: &Task) -> bool {
        !task.phase_types.is_empty()
            || !task.masters().is_empty()
            || self.scenario.phases.iter().any(|p| p.contains_task(task.id))
    }

    /// One line per invalid part, or `None` when the data set can be
    /// simulated.
    pub fn error_message(&self) -> Option<String> {
        let table = if self.expanded.is_empty() { &self.tasks } else { &self.expanded };
        let lines: Vec<String> = [
            table
                .error_message()
                .map(|e| format!("✗ Some of the tasks are invalid! First error: {e}")),
            self.scenario
                .error_message()
                .map(|e| format!("✗ The scenario is invalid! First error: {e}")),
            self.crew.error_message(table).map(|e| {
                format!("✗ Some of the tasks are not assigned to enough crew-members! First error: {e}")
            }),
        ]
        .into_iter()
        .flatten()
        .collect();
        (!lines.is_empty()).then(|| lines.join("\n"))
    }

    /// Base tasks that nothing would ever schedule.
    pub fn warning_message(&self) -> Option<String> {
        let unused: Vec<String> = self
            .tasks
            .iter()
            .filter(|t| !self.task_is_used(t))
            .map(|t| format!("{t}; "))
            .collect();
        (!unused.is_empty()).then(|| format!("The following tasks are not used: {}", unused.concat()))
    }
}

impl fmt::Display for DataSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {} {}, {}",
            self.workplace, self.scenario.name, self.scenario.duration(), self.crew.name
        )
    }
}
