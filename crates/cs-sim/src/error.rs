use cs_core::CoreError;
use cs_dispatch::DispatchError;
use cs_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("the scenario has no phase to simulate")]
    EmptyScenario,

    #[error("the data set has no expanded task table")]
    NotExpanded,

    #[error("dispatcher error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type SimResult<T> = Result<T, SimError>;
