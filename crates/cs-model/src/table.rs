//! `TaskTable` — the task arena and its relation graph.
//!
//! Tasks refer to each other by id only.  The table is the single place that
//! edits relations, and it maintains these invariants explicitly:
//!
//! - parallel relations form a complete graph per group: if `a ∥ b` and
//!   `b ∥ c` then `a ∥ c`, and every edge exists in both directions;
//! - `b ∈ a.slaves` exactly when `a ∈ b.masters`;
//! - no task relates to itself.

use std::collections::BTreeMap;

use cs_core::TaskId;

use crate::error::{ModelError, ModelResult};
use crate::task::{RelationKind, Task};

#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TaskTable {
    tasks: BTreeMap<TaskId, Task>,
}

impl TaskTable {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Arena ────────────────────────────────────────────────────────────

    /// Insert a task without relations.  Relations carried by `task` are
    /// dropped; add them through [`TaskTable::add_relation`].
    pub fn insert(&mut self, mut task: Task) -> ModelResult<()> {
        if self.tasks.contains_key(&task.id) {
            return Err(ModelError::DuplicateTask(task.id));
        }
        task.clear_relations();
        self.tasks.insert(task.id, task);
        Ok(())
    }

    /// Remove a task and every relation pointing at it.
    pub fn remove(&mut self, id: TaskId) -> Option<Task> {
        let mut task = self.tasks.remove(&id)?;
        for other in self.tasks.values_mut() {
            other.parallels.remove(&id);
            other.slaves.remove(&id);
            other.masters.remove(&id);
        }
        task.clear_relations();
        Some(task)
    }

    #[inline]
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Mutable access to the task's own fields.  Relations are read-only
    /// outside the table.
    #[inline]
    pub fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(&id)
    }

    #[inline]
    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Task> {
        self.tasks.values_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.tasks.keys().copied()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// One more than the largest id, or 1 for an empty table.
    pub fn next_task_id(&self) -> TaskId {
        self.tasks.keys().next_back().map_or(TaskId(1), |id| TaskId(id.0 + 1))
    }

    // ── Relations ────────────────────────────────────────────────────────

    /// Relate `a` to `b`.
    ///
    /// Parallel relations merge the two parallel groups into one complete
    /// graph.  Self relations and master/slave cycles of length two are
    /// rejected.
    pub fn add_relation(&mut self, a: TaskId, kind: RelationKind, b: TaskId) -> ModelResult<()> {
        let (ta, tb) = match (self.tasks.get(&a), self.tasks.get(&b)) {
            (Some(ta), Some(tb)) => (ta, tb),
            (None, _) => return Err(ModelError::UnknownTask(a)),
            (_, None) => return Err(ModelError::UnknownTask(b)),
        };
        let invalid = Err(ModelError::InvalidRelation { from: a, kind, to: b });
        if a == b {
            return invalid;
        }
        match kind {
            RelationKind::Parallel => {
                let mut group: Vec<TaskId> = vec![a, b];
                group.extend(ta.parallels.iter().copied());
                group.extend(tb.parallels.iter().copied());
                group.sort_unstable();
                group.dedup();
                for &x in &group {
                    if let Some(t) = self.tasks.get_mut(&x) {
                        t.parallels.extend(group.iter().copied().filter(|&y| y != x));
                    }
                }
            }
            RelationKind::Slave => {
                if ta.masters.contains(&b) || tb.slaves.contains(&a) {
                    return invalid;
                }
                self.link(a, RelationKind::Slave, b);
                self.link(b, RelationKind::Master, a);
            }
            RelationKind::Master => {
                if ta.slaves.contains(&b) || tb.masters.contains(&a) {
                    return invalid;
                }
                self.link(a, RelationKind::Master, b);
                self.link(b, RelationKind::Slave, a);
            }
        }
        Ok(())
    }

    fn link(&mut self, from: TaskId, kind: RelationKind, to: TaskId) {
        if let Some(t) = self.tasks.get_mut(&from) {
            t.relations_mut(kind).insert(to);
        }
    }

    fn unlink(&mut self, from: TaskId, kind: RelationKind, to: TaskId) {
        if let Some(t) = self.tasks.get_mut(&from) {
            t.relations_mut(kind).remove(&to);
        }
    }

    /// Drop every `kind` relation of `id`, on both sides.
    ///
    /// Removing a task from a parallel group leaves the rest of the group
    /// intact.
    pub fn remove_relations(&mut self, id: TaskId, kind: RelationKind) -> ModelResult<()> {
        let others: Vec<TaskId> = self
            .tasks
            .get(&id)
            .ok_or(ModelError::UnknownTask(id))?
            .relations(kind)
            .iter()
            .copied()
            .collect();
        let mirror = match kind {
            RelationKind::Parallel => RelationKind::Parallel,
            RelationKind::Slave => RelationKind::Master,
            RelationKind::Master => RelationKind::Slave,
        };
        for other in others {
            self.unlink(other, mirror, id);
        }
        if let Some(t) = self.tasks.get_mut(&id) {
            t.relations_mut(kind).clear();
        }
        Ok(())
    }

    /// Replace the `kind` relations of `id` with relations to `targets`.
    ///
    /// Unknown targets and rejected relations are skipped; the number of
    /// relations actually added is returned.
    pub fn update_relations(
        &mut self,
        id: TaskId,
        kind: RelationKind,
        targets: &[TaskId],
    ) -> ModelResult<usize> {
        self.remove_relations(id, kind)?;
        if kind == RelationKind::Parallel {
            // The new targets leave their old groups.
            for &t in targets {
                if t != id && self.tasks.contains_key(&t) {
                    self.remove_relations(t, RelationKind::Parallel)?;
                }
            }
        }
        let mut added = 0;
        for &t in targets {
            if self.add_relation(id, kind, t).is_ok() {
                added += 1;
            }
        }
        Ok(added)
    }

    // ── Validation ───────────────────────────────────────────────────────

    /// Normalize every task.
    pub fn validate(&mut self) {
        for task in self.tasks.values_mut() {
            task.validate();
        }
    }

    /// First error among the enabled tasks.
    pub fn error_message(&self) -> Option<String> {
        self.tasks
            .values()
            .filter(|t| t.enabled)
            .find_map(|t| t.error_message().map(|msg| format!("Invalid task “{t}”: {msg}")))
    }
}

impl<'a> IntoIterator for &'a TaskTable {
    type Item = &'a Task;
    type IntoIter = std::collections::btree_map::Values<'a, TaskId, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.values()
    }
}
