//! `cs-model` — the passive records of a manning simulation.
//!
//! The engine consults and mutates these; nothing here schedules anything.
//!
//! # Crate layout
//!
//! | Module           | Contents                                                      |
//! |------------------|---------------------------------------------------------------|
//! | [`task`]         | `Task`, policy enums, `StandardTaskType`, `RelationKind`      |
//! | [`overrides`]    | `TaskOverrides`, `TaskRef` (phase-specific task references)   |
//! | [`table`]        | `TaskTable` (task arena and relation graph)                   |
//! | [`occurrence`]   | `TaskOccurrence` (one running instance of a task)             |
//! | [`crewman`]      | `Crewman`                                                     |
//! | [`crew`]         | `Crew`                                                        |
//! | [`phase`]        | `Phase`, `PhaseRef`, `PhaseOverrides`, `SimPhase`             |
//! | [`scenario`]     | `Scenario`                                                    |
//! | [`workplace`]    | `Workplace`                                                   |
//! | [`constructors`] | `Constructors` (per-entity construction callbacks)            |
//! | [`dataset`]      | `DataSet` (auto-expansion, preparation, diagnostics)          |
//! | [`builder`]      | `DataSetBuilder`                                              |
//! | [`error`]        | `ModelError`, `ModelResult`                                   |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                        |
//! |---------|---------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on the public value types.  |

pub mod builder;
pub mod constructors;
pub mod crew;
pub mod crewman;
pub mod dataset;
pub mod error;
pub mod occurrence;
pub mod overrides;
pub mod phase;
pub mod scenario;
pub mod table;
pub mod task;
pub mod workplace;

#[cfg(test)]
mod tests;

pub use builder::DataSetBuilder;
pub use constructors::Constructors;
pub use crew::Crew;
pub use crewman::Crewman;
pub use dataset::DataSet;
pub use error::{ModelError, ModelResult};
pub use occurrence::TaskOccurrence;
pub use overrides::{TaskOverrides, TaskRef};
pub use phase::{ARBITRARY_MAX_DURATION, ARBITRARY_MIN_DURATION, Phase, PhaseOverrides, PhaseRef, SimPhase};
pub use scenario::{MAX_PHASES, Scenario};
pub use table::TaskTable;
pub use task::{
    PhaseInterruptionPolicy, RelationKind, RelativeDateType, RelativeTimeType,
    ScenarioInterruptionPolicy, StandardTaskType, Task, TaskDuplicatesPolicy,
    TaskInterruptionPolicy,
};
pub use workplace::Workplace;
