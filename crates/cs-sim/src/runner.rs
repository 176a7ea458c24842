//! Multi-replication driver.
//!
//! Each replication gets its own generator seeded from
//! [`SimRng::replication_seed`], so results depend only on the root seed and
//! the replication index, never on the thread that ran it.  With the
//! `parallel` feature, replications run on a dedicated Rayon pool sized by
//! [`RunConfig::num_threads`], each worker on its own [`Simulator`] clone.

use cs_core::{RunConfig, SimRng};
use cs_dispatch::Dispatcher;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "parallel")]
use crate::SimError;
use crate::{SimObserver, SimResult, Simulator};

/// What one replication produced.
#[derive(Debug)]
pub struct ReplicationOutcome<O> {
    pub index:            u32,
    pub seed:             u64,
    /// `false` when the data set reported configuration errors.
    pub success:          bool,
    pub event_insertions: u64,
    pub observer:         O,
}

/// Run `config.replications` replications of `simulator`'s data set.
///
/// `make_observer` builds a fresh observer per replication from its index;
/// outcomes come back in index order.
pub fn run_replications<O, F>(
    simulator:     &Simulator,
    config:        &RunConfig,
    dispatcher:    &dyn Dispatcher,
    make_observer: F,
) -> SimResult<Vec<ReplicationOutcome<O>>>
where
    O: SimObserver + Send,
    F: Fn(u32) -> O + Sync,
{
    config.validate()?;
    debug!(replications = config.replications, seed = config.seed, "starting run");

    let run_one = |sim: &mut Simulator, index: u32| -> SimResult<ReplicationOutcome<O>> {
        let seed = SimRng::replication_seed(config.seed, u64::from(index));
        let mut rng = SimRng::new(seed);
        let mut observer = make_observer(index);
        let success = sim.run(config.time_origin, dispatcher, &mut observer, &mut rng)?;
        Ok(ReplicationOutcome {
            index,
            seed,
            success,
            event_insertions: sim.event_insertions(),
            observer,
        })
    };

    #[cfg(feature = "parallel")]
    {
        let mut pool = rayon::ThreadPoolBuilder::new();
        if let Some(n) = config.num_threads {
            pool = pool.num_threads(n);
        }
        let pool = pool.build().map_err(|e| SimError::Config(e.to_string()))?;
        pool.install(|| {
            (0..config.replications)
                .into_par_iter()
                .map_init(|| simulator.clone(), |sim, index| run_one(sim, index))
                .collect()
        })
    }

    #[cfg(not(feature = "parallel"))]
    {
        let mut sim = simulator.clone();
        (0..config.replications).map(|index| run_one(&mut sim, index)).collect()
    }
}
