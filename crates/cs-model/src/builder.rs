//! Fluent builder for assembling a [`DataSet`] in one expression.
//!
//! # Usage
//!
//! ```rust
//! use cs_core::{CrewmanId, SimTime, TaskId, TimeDistribution, TypeCode};
//! use cs_model::{Crewman, DataSetBuilder, Phase, RelativeDateType, Task};
//!
//! let mut watch = Task::new(TaskId(1), "Watch");
//! watch.relative_date = RelativeDateType::RelativeStartFromStartOfPhase;
//! watch.duration = TimeDistribution::constant(SimTime::hours(8.0));
//! watch.phase_types.push(TypeCode(1));
//!
//! let data = DataSetBuilder::new("Ship")
//!     .task(watch)
//!     .crewman(Crewman::new(CrewmanId(1), "Alice").with_qualification(TaskId(1), 100))
//!     .phase(Phase::new("Transit", TypeCode(1), TimeDistribution::constant(SimTime::days(1.0))))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(data.scenario.phases.len(), 1);
//! assert!(data.error_message().is_none());
//! ```

use std::collections::BTreeMap;

use cs_core::TaskId;

use crate::constructors::Constructors;
use crate::crewman::Crewman;
use crate::dataset::DataSet;
use crate::error::ModelResult;
use crate::phase::Phase;
use crate::task::{RelationKind, Task};
use crate::workplace::Workplace;

/// Collects tasks, crew, relations and phases; [`build`](Self::build) inserts
/// them in that order so relations may name tasks added later.
pub struct DataSetBuilder {
    data:      DataSet,
    tasks:     Vec<Task>,
    relations: Vec<(TaskId, RelationKind, TaskId)>,
    /// Phase definitions by name, consulted before the phase loader.
    library:   BTreeMap<String, Phase>,
    sequence:  Vec<String>,
}

impl DataSetBuilder {
    pub fn new(workplace: impl Into<String>) -> Self {
        Self {
            data: DataSet::with_workplace(Workplace::new(workplace)),
            tasks: Vec::new(),
            relations: Vec::new(),
            library: BTreeMap::new(),
            sequence: Vec::new(),
        }
    }

    pub fn constructors(mut self, constructors: Constructors) -> Self {
        self.data.constructors = constructors;
        self
    }

    pub fn scenario_name(mut self, name: impl Into<String>) -> Self {
        self.data.scenario.name = name.into();
        self
    }

    pub fn crew_name(mut self, name: impl Into<String>) -> Self {
        self.data.crew.name = name.into();
        self
    }

    pub fn task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn relation(mut self, a: TaskId, kind: RelationKind, b: TaskId) -> Self {
        self.relations.push((a, kind, b));
        self
    }

    pub fn crewman(mut self, crewman: Crewman) -> Self {
        self.data.crew.insert(crewman);
        self
    }

    /// Define `phase` and append it to the scenario.
    pub fn phase(mut self, phase: Phase) -> Self {
        self.sequence.push(phase.name.clone());
        self.library.insert(phase.name.clone(), phase);
        self
    }

    /// Append an already defined phase again, or one the phase loader knows.
    pub fn repeat_phase(mut self, name: impl Into<String>) -> Self {
        self.sequence.push(name.into());
        self
    }

    pub fn build(self) -> ModelResult<DataSet> {
        let Self { mut data, tasks, relations, library, sequence } = self;
        for task in tasks {
            data.tasks.insert(task)?;
        }
        for (a, kind, b) in relations {
            data.tasks.add_relation(a, kind, b)?;
        }
        let loader = data.constructors.phase.clone();
        for name in &sequence {
            data.scenario
                .add_phase(name, |n| library.get(n).cloned().or_else(|| loader(n)))?;
        }
        data.tasks.validate();
        Ok(data)
    }
}
