//! Plain data row types written by output backends.  Durations are in hours.

/// Aggregate of every completed phase of one phase type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseTypeRow {
    pub phase_type:  i32,
    pub occurrences: u64,
    pub total_hours: f64,
    pub mean_hours:  f64,
    pub task_errors: u64,
}

/// One non-empty bin of a phase-type duration histogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramRow {
    pub phase_type: i32,
    /// Lower bound of the bin.
    pub bin_hours:  f64,
    pub count:      u64,
}

/// One task error as reported by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskErrorRow {
    pub replication: u32,
    pub time_hours:  f64,
    /// Empty for tasks rejected before the first phase.
    pub phase:       String,
    pub task_id:     i32,
    pub task_name:   String,
}

/// Work time of one crew member, averaged over replications.
#[derive(Debug, Clone, PartialEq)]
pub struct CrewRow {
    pub crewman_id:      i32,
    pub name:            String,
    pub replications:    u32,
    pub mean_work_hours: f64,
}
