//! The `Simulator` struct: the prepared data set plus the engine state that
//! one replication mutates.

use std::collections::BTreeMap;
use std::sync::Arc;

use cs_core::{PhaseId, SimRng, SimTime, TaskId, TimeDistribution, TypeCode};
use cs_dispatch::Dispatcher;
use cs_model::{DataSet, SimPhase, Task, TaskOccurrence};
use cs_schedule::{AsapQueue, BinaryHeap, TaskEvent};

use crate::replication::Replication;
use crate::{SimObserver, SimResult};

#[cfg(feature = "fx-hash")]
pub(crate) type TaskIdSet = rustc_hash::FxHashSet<TaskId>;
#[cfg(not(feature = "fx-hash"))]
pub(crate) type TaskIdSet = std::collections::HashSet<TaskId>;

/// Initial capacity of the main event queue.
const QUEUE_CAPACITY: usize = 128;

// ── EngineState ───────────────────────────────────────────────────────────────

/// Everything a replication mutates besides the data set.
#[derive(Clone, Debug)]
pub(crate) struct EngineState {
    pub now: SimTime,

    /// Task definitions for the current replication, with their date offset
    /// sampled and invalid tasks disabled.
    pub tasks: BTreeMap<TaskId, Arc<Task>>,

    /// Scenario phases resolved against the expanded table.
    pub phases: Vec<SimPhase>,

    /// Index into `phases` of the phase being simulated.
    pub phase: Option<usize>,

    /// Stand-in handed to dispatchers outside of any phase.
    pub outside: SimPhase,

    /// Occurrence arena, indexed by `OccurrenceId`.  Cleared per replication.
    pub occurrences: Vec<TaskOccurrence>,

    pub queue: BinaryHeap<TaskEvent>,
    pub asap:  AsapQueue,

    /// Ids of tasks with a started occurrence.
    pub active: TaskIdSet,

    /// Obligatory occurrences still pending; the phase ends when it drops
    /// to zero.
    pub obligatory: usize,

    pub insertions: u64,

    /// The data set reported an error while preparing the replication.
    pub data_error: bool,
}

impl EngineState {
    fn new() -> Self {
        Self {
            now:         SimTime::ZERO,
            tasks:       BTreeMap::new(),
            phases:      Vec::new(),
            phase:       None,
            outside:     SimPhase {
                id:         PhaseId(0),
                name:       String::new(),
                phase_type: TypeCode::NONE,
                duration:   TimeDistribution::ZERO,
                tasks:      Vec::new(),
                begin:      SimTime::ZERO,
            },
            occurrences: Vec::new(),
            queue:       BinaryHeap::with_capacity(QUEUE_CAPACITY),
            asap:        AsapQueue::new(),
            active:      TaskIdSet::default(),
            obligatory:  0,
            insertions:  0,
            data_error:  false,
        }
    }

    #[inline]
    pub fn current_phase(&self) -> Option<&SimPhase> {
        self.phase.map(|i| &self.phases[i])
    }

    #[inline]
    pub fn phase_or_outside(&self) -> &SimPhase {
        self.current_phase().unwrap_or(&self.outside)
    }
}

// ── Simulator ─────────────────────────────────────────────────────────────────

/// The discrete-event engine.
///
/// A `Simulator` owns its [`DataSet`] (already expanded and prepared) and
/// runs any number of replications over it, one at a time.  Each call to
/// [`Simulator::run`] starts from a clean state, so the same instance can be
/// reused; run replications in parallel on separate clones.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
#[derive(Clone, Debug)]
pub struct Simulator {
    data:  DataSet,
    state: EngineState,
}

impl Simulator {
    pub(crate) fn new(data: DataSet) -> Self {
        Self { data, state: EngineState::new() }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Run one replication of the whole scenario from `origin`.
    ///
    /// Returns `Ok(false)` when the data set reported configuration errors;
    /// the replication is still simulated and the errors are passed to
    /// [`SimObserver::on_error_message`].  `Err` means the dispatcher broke
    /// its contract.
    pub fn run<O: SimObserver>(
        &mut self,
        origin:     SimTime,
        dispatcher: &dyn Dispatcher,
        observer:   &mut O,
        rng:        &mut SimRng,
    ) -> SimResult<bool> {
        let mut replication = Replication {
            data: &mut self.data,
            st: &mut self.state,
            dispatcher,
            observer,
            rng,
        };
        Ok(replication.run(origin)?)
    }

    /// [`Simulator::run`] with a generator seeded from OS entropy.
    pub fn run_unseeded<O: SimObserver>(
        &mut self,
        origin:     SimTime,
        dispatcher: &dyn Dispatcher,
        observer:   &mut O,
    ) -> SimResult<bool> {
        let mut rng = SimRng::from_entropy();
        self.run(origin, dispatcher, observer, &mut rng)
    }

    /// Number of insertions into the main queue during the last run.
    #[inline]
    pub fn event_insertions(&self) -> u64 {
        self.state.insertions
    }

    /// Simulation time reached by the last run.
    #[inline]
    pub fn now(&self) -> SimTime {
        self.state.now
    }

    /// Task occurrences created by the last run, indexed by `OccurrenceId`.
    #[inline]
    pub fn occurrences(&self) -> &[TaskOccurrence] {
        &self.state.occurrences
    }

    #[inline]
    pub fn data_set(&self) -> &DataSet {
        &self.data
    }

    pub fn into_data_set(self) -> DataSet {
        self.data
    }
}
