//! Integration tests for cs-output.

use cs_core::{CrewmanId, OccurrenceId, PhaseId, RunConfig, SimTime, TaskId, TimeDistribution, TypeCode};
use cs_model::{Crew, Crewman, SimPhase, Task};
use cs_sim::SimObserver;
use tempfile::TempDir;

use crate::*;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn tmp() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}

fn h(hours: f64) -> SimTime {
    SimTime::hours(hours)
}

fn sim_phase(id: i32, name: &str, phase_type: i32, begin: f64) -> SimPhase {
    SimPhase {
        id:         PhaseId(id),
        name:       name.to_owned(),
        phase_type: TypeCode(phase_type),
        duration:   TimeDistribution::ZERO,
        tasks:      Vec::new(),
        begin:      h(begin),
    }
}

/// A crew whose only member worked `hours`.
fn crew_with_work(hours: f64) -> Crew {
    let mut alice = Crewman::new(CrewmanId(1), "Alice");
    alice.assign_task(SimTime::ZERO, OccurrenceId(0), true);
    alice.dismiss_task(h(hours), OccurrenceId(0), true);
    let mut crew = Crew::new("Crew");
    crew.insert(alice);
    crew
}

fn observer(index: u32) -> StatisticsObserver {
    StatisticsObserver::new(&RunConfig::default(), index)
}

// ── StatisticsObserver ────────────────────────────────────────────────────────

#[cfg(test)]
mod observer_tests {
    use super::*;

    #[test]
    fn completed_phases_are_aggregated_by_type() {
        let mut obs = observer(0);
        let transit = sim_phase(1, "Transit", 1, 0.0);
        let harbour = sim_phase(2, "Harbour", 2, 10.5);
        let again = sim_phase(3, "Transit", 1, 12.0);
        obs.on_phase_transition_begin(SimTime::ZERO, None, Some(&transit));
        obs.on_phase_transition_begin(h(10.5), Some(&transit), Some(&harbour));
        obs.on_phase_transition_begin(h(12.0), Some(&harbour), Some(&again));
        obs.on_phase_transition_begin(h(16.0), Some(&again), None);

        let stats = obs.phase_type(TypeCode(1)).unwrap();
        assert_eq!(stats.occurrences, 2);
        assert_eq!(stats.total, h(14.5));
        assert_eq!(stats.mean(), h(7.25));
        assert_eq!(stats.histogram.get(&10), Some(&1));
        assert_eq!(stats.histogram.get(&4), Some(&1));
        assert_eq!(obs.phase_type(TypeCode(2)).unwrap().total, h(1.5));
    }

    #[test]
    fn task_errors_count_against_their_phase_type() {
        let mut obs = observer(3);
        let transit = sim_phase(1, "Transit", 1, 0.0);
        let task = Task::new(TaskId(7), "Watch");
        obs.on_task_error(h(2.0), Some(&transit), &task);
        obs.on_task_error(SimTime::ZERO, None, &task);

        assert_eq!(obs.phase_type(TypeCode(1)).unwrap().task_errors, 1);
        assert_eq!(obs.task_errors().len(), 2);
        assert_eq!(obs.task_errors()[0].replication, 3);
        assert_eq!(obs.task_errors()[0].phase.as_deref(), Some("Transit"));
        assert_eq!(obs.task_errors()[1].phase, None);
    }

    #[test]
    fn merge_adds_up_replications() {
        let mut first = observer(0);
        first.on_replication_end(h(24.0), &crew_with_work(4.0));
        first.on_error_message("missing crew");
        let mut second = observer(1);
        second.on_replication_end(h(24.0), &crew_with_work(6.0));

        let merged = StatisticsObserver::merge_all([first, second]).unwrap();
        let alice = merged.crewman(CrewmanId(1)).unwrap();
        assert_eq!(alice.replications, 2);
        assert_eq!(alice.total_work, h(10.0));
        assert_eq!(merged.crew_rows()[0].mean_work_hours, 5.0);
        assert_eq!(merged.messages(), ["missing crew"]);
    }

    #[test]
    fn merge_all_of_nothing_is_none() {
        assert!(StatisticsObserver::merge_all(Vec::new()).is_none());
    }
}

// ── CsvWriter ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod csv_tests {
    use super::*;

    fn headers(dir: &TempDir, file: &str) -> Vec<String> {
        let mut rdr = ::csv::Reader::from_path(dir.path().join(file)).unwrap();
        rdr.headers().unwrap().iter().map(str::to_owned).collect()
    }

    #[test]
    fn csv_files_created_with_headers() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();

        assert_eq!(headers(&dir, "phase_types.csv"), ["phase_type", "occurrences", "total_hours", "mean_hours", "task_errors"]);
        assert_eq!(headers(&dir, "phase_histogram.csv"), ["phase_type", "bin_hours", "count"]);
        assert_eq!(headers(&dir, "task_errors.csv"), ["replication", "time_hours", "phase", "task_id", "task_name"]);
        assert_eq!(headers(&dir, "crew.csv"), ["crewman_id", "name", "replications", "mean_work_hours"]);
    }

    #[test]
    fn csv_task_error_rows_written() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_task_errors(&[TaskErrorRow {
            replication: 2,
            time_hours:  1.5,
            phase:       "Transit".into(),
            task_id:     7,
            task_name:   "Watch, bridge".into(),
        }])
        .unwrap();
        w.finish().unwrap();

        let mut rdr = ::csv::Reader::from_path(dir.path().join("task_errors.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "2");
        assert_eq!(&rows[0][1], "1.5");
        assert_eq!(&rows[0][4], "Watch, bridge");
    }

    #[test]
    fn csv_finish_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tmp();
        let result = CsvWriter::new(&dir.path().join("absent"));
        assert!(result.is_err());
    }

    #[test]
    fn integration_csv() {
        use cs_dispatch::BasicDispatcher;
        use cs_model::{DataSetBuilder, Phase, RelativeDateType};
        use cs_sim::{SimBuilder, run_replications};

        let mut watch = Task::new(TaskId(1), "Watch");
        watch.relative_date = RelativeDateType::RelativeStartFromStartOfPhase;
        watch.task_type = TypeCode(1);
        watch.duration = TimeDistribution::constant(h(8.0));
        watch.phase_types.push(TypeCode(1));
        let data = DataSetBuilder::new("Ship")
            .task(watch)
            .crewman(Crewman::new(CrewmanId(1), "Alice").with_qualification(TaskId(1), 100))
            .phase(Phase::new("Transit", TypeCode(1), TimeDistribution::constant(h(24.0))))
            .build()
            .unwrap();
        let sim = SimBuilder::new(data).build().unwrap();
        let config = RunConfig { replications: 2, ..RunConfig::default() };
        let outcomes = run_replications(&sim, &config, &BasicDispatcher::new(SimTime::days(1.0)), |i| {
            StatisticsObserver::new(&config, i)
        })
        .unwrap();
        let stats = StatisticsObserver::merge_all(outcomes.into_iter().map(|o| o.observer)).unwrap();

        let dir = tmp();
        let mut writer = CsvWriter::new(dir.path()).unwrap();
        stats.write_to(&mut writer).unwrap();

        let mut rdr = ::csv::Reader::from_path(dir.path().join("phase_types.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "1");
        assert_eq!(&rows[0][1], "2");
        assert_eq!(rows[0][3].parse::<f64>().unwrap(), 24.0);
        assert_eq!(&rows[0][4], "0");

        let mut rdr = ::csv::Reader::from_path(dir.path().join("crew.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(&rows[0][1], "Alice");
        assert_eq!(rows[0][3].parse::<f64>().unwrap(), 8.0);
    }
}
