//! Per-entity construction callbacks.
//!
//! Domains customize the records a data set creates by swapping these
//! callbacks, e.g. to give every new task a default phase-type set or every
//! crew member a type code.  [`Constructors::default`] builds plain records
//! and loads no phase.

use std::fmt;
use std::sync::Arc;

use cs_core::{CrewmanId, TaskId};

use crate::crewman::Crewman;
use crate::phase::Phase;
use crate::task::Task;

pub type TaskConstructor = Arc<dyn Fn(TaskId, &str) -> Task + Send + Sync>;
pub type CrewmanConstructor = Arc<dyn Fn(CrewmanId, &str) -> Crewman + Send + Sync>;
/// Resolves a phase name to a phase definition.
pub type PhaseLoader = Arc<dyn Fn(&str) -> Option<Phase> + Send + Sync>;

#[derive(Clone)]
pub struct Constructors {
    pub task:    TaskConstructor,
    pub crewman: CrewmanConstructor,
    pub phase:   PhaseLoader,
}

impl Constructors {
    pub fn with_task(mut self, f: impl Fn(TaskId, &str) -> Task + Send + Sync + 'static) -> Self {
        self.task = Arc::new(f);
        self
    }

    pub fn with_crewman(
        mut self,
        f: impl Fn(CrewmanId, &str) -> Crewman + Send + Sync + 'static,
    ) -> Self {
        self.crewman = Arc::new(f);
        self
    }

    pub fn with_phase_loader(
        mut self,
        f: impl Fn(&str) -> Option<Phase> + Send + Sync + 'static,
    ) -> Self {
        self.phase = Arc::new(f);
        self
    }
}

impl Default for Constructors {
    fn default() -> Self {
        Self {
            task:    Arc::new(|id, name: &str| Task::new(id, name)),
            crewman: Arc::new(|id, name: &str| Crewman::new(id, name)),
            phase:   Arc::new(|_| None),
        }
    }
}

impl fmt::Debug for Constructors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructors").finish_non_exhaustive()
    }
}
