//! Fluent builder for constructing a [`Simulator`].

use cs_model::DataSet;
use tracing::debug;

use crate::{SimError, SimResult, Simulator};

/// Fluent builder for [`Simulator`].
///
/// # Required inputs
///
/// - [`DataSet`]: tasks, crew and scenario, e.g. from
///   [`cs_model::DataSetBuilder`]
///
/// # Optional inputs (have defaults)
///
/// | Method                | Default                                  |
/// |-----------------------|------------------------------------------|
/// | `.auto_expand(b)`     | `true`: build the expanded task table    |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(data).build()?;
/// let mut rng = SimRng::new(42);
/// sim.run(SimTime::ZERO, &BasicDispatcher::default(), &mut NoopObserver, &mut rng)?;
/// ```
pub struct SimBuilder {
    data:   DataSet,
    expand: bool,
}

impl SimBuilder {
    pub fn new(data: DataSet) -> Self {
        Self { data, expand: true }
    }

    /// Whether [`build`](Self::build) runs [`DataSet::auto_expand_tasks`].
    ///
    /// Turn it off only for a data set whose expanded table was already
    /// built (and possibly edited) by the caller.
    pub fn auto_expand(mut self, expand: bool) -> Self {
        self.expand = expand;
        self
    }

    /// Validate inputs and construct the [`Simulator`].
    ///
    /// # Errors
    ///
    /// - [`SimError::EmptyScenario`] if the scenario has no phase.
    /// - [`SimError::NotExpanded`] if expansion is off and the data set has
    ///   tasks but no expanded table.
    /// - [`SimError::Model`] if expansion fails.
    pub fn build(self) -> SimResult<Simulator> {
        let mut data = self.data;
        if data.scenario.phases.is_empty() {
            return Err(SimError::EmptyScenario);
        }
        if self.expand {
            data.auto_expand_tasks()?;
        } else if data.expanded_tasks().is_empty() && !data.tasks.is_empty() {
            return Err(SimError::NotExpanded);
        }
        data.prepare_for_first_simulation();
        debug!(
            data_set = %data,
            tasks = data.expanded_tasks().len(),
            phases = data.scenario.phases.len(),
            "simulator ready"
        );
        Ok(Simulator::new(data))
    }
}
