//! `StatisticsObserver` — collects phase, task-error and crew statistics.

use std::collections::BTreeMap;

use cs_core::{CrewmanId, RunConfig, SimTime, TaskId, TypeCode};
use cs_model::{Crew, SimPhase, Task};
use cs_sim::SimObserver;
use tracing::debug;

use crate::row::{CrewRow, HistogramRow, PhaseTypeRow, TaskErrorRow};
use crate::writer::OutputWriter;
use crate::OutputResult;

/// Completed phases of one phase type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseTypeStats {
    pub occurrences: u64,
    pub total:       SimTime,
    /// Bin index (duration / resolution) to count.
    pub histogram:   BTreeMap<i64, u64>,
    pub task_errors: u64,
}

impl PhaseTypeStats {
    pub fn mean(&self) -> SimTime {
        if self.occurrences == 0 {
            SimTime::ZERO
        } else {
            self.total / self.occurrences as i64
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrewStats {
    pub name:         String,
    /// Sum over replications of the cumulated work time at scenario end.
    pub total_work:   SimTime,
    pub replications: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskErrorRecord {
    pub replication: u32,
    pub time:        SimTime,
    pub phase:       Option<String>,
    pub task_id:     TaskId,
    pub task_name:   String,
}

/// A [`SimObserver`] aggregating what a report needs.
///
/// Use one observer per replication (e.g. from the
/// [`run_replications`](cs_sim::run_replications) factory) and
/// [`merge`](Self::merge) them afterwards; the totals do not depend on the
/// order of merging.
#[derive(Debug, Clone)]
pub struct StatisticsObserver {
    replication: u32,
    resolution:  SimTime,
    phase_types: BTreeMap<TypeCode, PhaseTypeStats>,
    crew:        BTreeMap<CrewmanId, CrewStats>,
    task_errors: Vec<TaskErrorRecord>,
    messages:    Vec<String>,
}

impl StatisticsObserver {
    /// Observer for replication `replication`, binning phase durations by
    /// `config.histogram_resolution`.
    pub fn new(config: &RunConfig, replication: u32) -> Self {
        Self {
            replication,
            resolution:  config.histogram_resolution,
            phase_types: BTreeMap::new(),
            crew:        BTreeMap::new(),
            task_errors: Vec::new(),
            messages:    Vec::new(),
        }
    }

    pub fn phase_type(&self, phase_type: TypeCode) -> Option<&PhaseTypeStats> {
        self.phase_types.get(&phase_type)
    }

    pub fn crewman(&self, id: CrewmanId) -> Option<&CrewStats> {
        self.crew.get(&id)
    }

    pub fn task_errors(&self) -> &[TaskErrorRecord] {
        &self.task_errors
    }

    /// Data errors and warnings reported while preparing replications.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Fold `other` into `self`.
    pub fn merge(&mut self, other: StatisticsObserver) {
        for (phase_type, stats) in other.phase_types {
            let entry = self.phase_types.entry(phase_type).or_default();
            entry.occurrences += stats.occurrences;
            entry.total += stats.total;
            entry.task_errors += stats.task_errors;
            for (bin, count) in stats.histogram {
                *entry.histogram.entry(bin).or_default() += count;
            }
        }
        for (id, stats) in other.crew {
            match self.crew.get_mut(&id) {
                Some(entry) => {
                    entry.total_work += stats.total_work;
                    entry.replications += stats.replications;
                }
                None => {
                    self.crew.insert(id, stats);
                }
            }
        }
        self.task_errors.extend(other.task_errors);
        self.messages.extend(other.messages);
    }

    /// Merge a sequence of per-replication observers.  `None` if empty.
    pub fn merge_all(observers: impl IntoIterator<Item = StatisticsObserver>) -> Option<StatisticsObserver> {
        let mut iter = observers.into_iter();
        let mut first = iter.next()?;
        for other in iter {
            first.merge(other);
        }
        Some(first)
    }

    // ── Rows ─────────────────────────────────────────────────────────────

    pub fn phase_type_rows(&self) -> Vec<PhaseTypeRow> {
        self.phase_types
            .iter()
            .map(|(phase_type, s)| PhaseTypeRow {
                phase_type:  phase_type.0,
                occurrences: s.occurrences,
                total_hours: s.total.total_hours(),
                mean_hours:  s.mean().total_hours(),
                task_errors: s.task_errors,
            })
            .collect()
    }

    pub fn histogram_rows(&self) -> Vec<HistogramRow> {
        let width = self.resolution.total_hours();
        self.phase_types
            .iter()
            .flat_map(|(phase_type, s)| {
                s.histogram.iter().map(move |(&bin, &count)| HistogramRow {
                    phase_type: phase_type.0,
                    bin_hours: bin as f64 * width,
                    count,
                })
            })
            .collect()
    }

    pub fn task_error_rows(&self) -> Vec<TaskErrorRow> {
        self.task_errors
            .iter()
            .map(|e| TaskErrorRow {
                replication: e.replication,
                time_hours:  e.time.total_hours(),
                phase:       e.phase.clone().unwrap_or_default(),
                task_id:     e.task_id.0,
                task_name:   e.task_name.clone(),
            })
            .collect()
    }

    pub fn crew_rows(&self) -> Vec<CrewRow> {
        self.crew
            .iter()
            .map(|(id, s)| CrewRow {
                crewman_id:      id.0,
                name:            s.name.clone(),
                replications:    s.replications,
                mean_work_hours: s.total_work.total_hours() / f64::from(s.replications.max(1)),
            })
            .collect()
    }

    /// Write every table to `writer` and finish it.
    pub fn write_to<W: OutputWriter>(&self, writer: &mut W) -> OutputResult<()> {
        writer.write_phase_types(&self.phase_type_rows())?;
        writer.write_histogram(&self.histogram_rows())?;
        writer.write_task_errors(&self.task_error_rows())?;
        writer.write_crew(&self.crew_rows())?;
        writer.finish()?;
        debug!(
            phase_types = self.phase_types.len(),
            task_errors = self.task_errors.len(),
            crew = self.crew.len(),
            "report written"
        );
        Ok(())
    }

    fn record_phase(&mut self, phase_type: TypeCode, duration: SimTime) {
        let bin = duration.ticks / self.resolution.ticks.max(1);
        let entry = self.phase_types.entry(phase_type).or_default();
        entry.occurrences += 1;
        entry.total += duration;
        *entry.histogram.entry(bin).or_default() += 1;
    }
}

impl SimObserver for StatisticsObserver {
    fn on_phase_transition_begin(&mut self, time: SimTime, previous: Option<&SimPhase>, _next: Option<&SimPhase>) {
        if let Some(phase) = previous {
            self.record_phase(phase.phase_type, time - phase.begin);
        }
    }

    fn on_task_error(&mut self, time: SimTime, phase: Option<&SimPhase>, task: &Task) {
        if let Some(phase) = phase {
            self.phase_types.entry(phase.phase_type).or_default().task_errors += 1;
        }
        self.task_errors.push(TaskErrorRecord {
            replication: self.replication,
            time,
            phase: phase.map(|p| p.name.clone()),
            task_id: task.id,
            task_name: task.name.clone(),
        });
    }

    fn on_error_message(&mut self, text: &str) {
        self.messages.push(text.to_owned());
    }

    fn on_replication_end(&mut self, _time: SimTime, crew: &Crew) {
        for crewman in crew.iter() {
            let entry = self.crew.entry(crewman.id).or_insert_with(|| CrewStats {
                name:         crewman.name.clone(),
                total_work:   SimTime::ZERO,
                replications: 0,
            });
            entry.total_work += crewman.cumulated_work_time();
            entry.replications += 1;
        }
    }
}
