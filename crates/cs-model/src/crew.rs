//! `Crew` — the crew members of a data set, keyed by id.

use std::collections::BTreeMap;

use cs_core::{CrewmanId, SimTime, TaskId};

use crate::crewman::Crewman;
use crate::error::{ModelError, ModelResult};
use crate::table::TaskTable;
use crate::task::Task;

#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Crew {
    pub name:        String,
    pub description: String,
    members:         BTreeMap<CrewmanId, Crewman>,
}

impl Crew {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn insert(&mut self, crewman: Crewman) -> Option<Crewman> {
        self.members.insert(crewman.id, crewman)
    }

    pub fn remove(&mut self, id: CrewmanId) -> Option<Crewman> {
        self.members.remove(&id)
    }

    #[inline]
    pub fn get(&self, id: CrewmanId) -> Option<&Crewman> {
        self.members.get(&id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: CrewmanId) -> Option<&mut Crewman> {
        self.members.get_mut(&id)
    }

    pub fn try_get_mut(&mut self, id: CrewmanId) -> ModelResult<&mut Crewman> {
        self.members.get_mut(&id).ok_or(ModelError::UnknownCrewman(id))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Crew members in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Crewman> {
        self.members.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Crewman> {
        self.members.values_mut()
    }

    /// One more than the largest id, or 1 for an empty crew.
    pub fn next_crewman_id(&self) -> CrewmanId {
        self.members.keys().next_back().map_or(CrewmanId(1), |id| CrewmanId(id.0 + 1))
    }

    /// Crew members with a non-zero qualification for `task`.
    pub fn qualified_count(&self, task: TaskId) -> usize {
        self.members.values().filter(|c| c.qualification(task) > 0).count()
    }

    /// Whether `task` needs staffing that the crew cannot provide.
    pub fn is_understaffed(&self, task: &Task) -> bool {
        task.enabled && !task.auto_expand && self.qualified_count(task.id) < task.crew_needed as usize
    }

    /// First task of `tasks` that the crew cannot staff.
    pub fn error_message(&self, tasks: &TaskTable) -> Option<String> {
        tasks
            .iter()
            .find(|t| self.is_understaffed(t))
            .map(|t| format!("Task “{t}” is not correctly assigned!"))
    }

    /// Bring every crew member's work time up to `time`.
    pub fn refresh_all(&mut self, time: SimTime) {
        for c in self.members.values_mut() {
            c.refresh_status(time);
        }
    }

    pub fn prepare_for_next_replication(&mut self) {
        for c in self.members.values_mut() {
            c.prepare_for_next_replication();
        }
    }
}

impl<'a> IntoIterator for &'a Crew {
    type Item = &'a Crewman;
    type IntoIter = std::collections::btree_map::Values<'a, CrewmanId, Crewman>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.values()
    }
}
