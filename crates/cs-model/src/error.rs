//! Error type for structural misuse of the model.
//!
//! Configuration problems inside a well-formed data set are not errors here:
//! they are reported as text by the `error_message()` predicates.

use cs_core::{CoreError, CrewmanId, TaskId};
use thiserror::Error;

use crate::task::RelationKind;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown task {0}")]
    UnknownTask(TaskId),

    #[error("unknown crewman {0}")]
    UnknownCrewman(CrewmanId),

    #[error("task {0} already exists")]
    DuplicateTask(TaskId),

    #[error("cannot add {kind:?} relation from {from} to {to}")]
    InvalidRelation {
        from: TaskId,
        kind: RelationKind,
        to:   TaskId,
    },

    #[error("no phase “{name}” at index {index}")]
    PhaseMismatch { index: usize, name: String },

    #[error("no phase named “{0}” could be loaded")]
    UnknownPhase(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Shorthand result type for `cs-model`.
pub type ModelResult<T> = Result<T, ModelError>;
