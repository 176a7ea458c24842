//! Run-level configuration.

use crate::{CoreError, CoreResult, SimTime};

/// Parameters shared by every replication of a run.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunConfig {
    /// Simulation time at which each replication starts.  Tick 0 is a Monday
    /// at 00:00, so the origin fixes the weekday the scenario begins on.
    pub time_origin: SimTime,

    /// Root RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Number of independent replications.
    pub replications: u32,

    /// Worker thread count passed to Rayon.  `None` uses all logical cores.
    pub num_threads: Option<usize>,

    /// Bin width of the phase-duration histograms.
    pub histogram_resolution: SimTime,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            time_origin:          SimTime::ZERO,
            seed:                 42,
            replications:         1,
            num_threads:          None,
            histogram_resolution: SimTime::ONE_HOUR,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.replications == 0 {
            return Err(CoreError::Config("at least one replication is required".into()));
        }
        if !self.histogram_resolution.is_positive() {
            return Err(CoreError::Config(format!(
                "histogram resolution must be positive, got {}",
                self.histogram_resolution
            )));
        }
        if self.num_threads == Some(0) {
            return Err(CoreError::Config("num_threads must be at least 1".into()));
        }
        Ok(())
    }
}
