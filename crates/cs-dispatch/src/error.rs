use cs_core::OccurrenceId;
use cs_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unknown task occurrence {0}")]
    UnknownOccurrence(OccurrenceId),

    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type DispatchResult<T> = Result<T, DispatchError>;
