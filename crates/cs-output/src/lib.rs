//! `cs-output` — replication statistics and report writers for the crewsim
//! workspace.
//!
//! [`StatisticsObserver`] implements `cs_sim::SimObserver` and aggregates,
//! per phase type, the number and duration of completed phases (with a
//! histogram binned by `RunConfig::histogram_resolution`) and the task errors
//! reported in them, plus the cumulated work time of every crew member.
//! Per-replication observers are merged, then written through any
//! [`OutputWriter`].
//!
//! | Backend      | Files created                                                     |
//! |--------------|-------------------------------------------------------------------|
//! | [`CsvWriter`]| `phase_types.csv`, `phase_histogram.csv`, `task_errors.csv`, `crew.csv` |
//!
//! # Usage
//!
//! ```rust,ignore
//! use cs_output::{CsvWriter, StatisticsObserver};
//!
//! let outcomes = run_replications(&sim, &config, &dispatcher, |i| StatisticsObserver::new(&config, i))?;
//! let stats = StatisticsObserver::merge_all(outcomes.into_iter().map(|o| o.observer)).unwrap();
//! let mut writer = CsvWriter::new(Path::new("./output"))?;
//! stats.write_to(&mut writer)?;
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(test)]
mod tests;

pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::{CrewStats, PhaseTypeStats, StatisticsObserver, TaskErrorRecord};
pub use row::{CrewRow, HistogramRow, PhaseTypeRow, TaskErrorRow};
pub use writer::OutputWriter;
