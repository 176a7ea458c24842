//! CSV output backend.
//!
//! Creates four files in the configured output directory:
//! - `phase_types.csv`
//! - `phase_histogram.csv`
//! - `task_errors.csv`
//! - `crew.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{CrewRow, HistogramRow, OutputResult, PhaseTypeRow, TaskErrorRow};

/// Writes a statistics report to four CSV files.
pub struct CsvWriter {
    phase_types: Writer<File>,
    histogram:   Writer<File>,
    task_errors: Writer<File>,
    crew:        Writer<File>,
    finished:    bool,
}

impl CsvWriter {
    /// Open (or create) the CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut phase_types = Writer::from_path(dir.join("phase_types.csv"))?;
        phase_types.write_record(["phase_type", "occurrences", "total_hours", "mean_hours", "task_errors"])?;

        let mut histogram = Writer::from_path(dir.join("phase_histogram.csv"))?;
        histogram.write_record(["phase_type", "bin_hours", "count"])?;

        let mut task_errors = Writer::from_path(dir.join("task_errors.csv"))?;
        task_errors.write_record(["replication", "time_hours", "phase", "task_id", "task_name"])?;

        let mut crew = Writer::from_path(dir.join("crew.csv"))?;
        crew.write_record(["crewman_id", "name", "replications", "mean_work_hours"])?;

        Ok(Self {
            phase_types,
            histogram,
            task_errors,
            crew,
            finished: false,
        })
    }
}

impl OutputWriter for CsvWriter {
    fn write_phase_types(&mut self, rows: &[PhaseTypeRow]) -> OutputResult<()> {
        for row in rows {
            self.phase_types.write_record(&[
                row.phase_type.to_string(),
                row.occurrences.to_string(),
                row.total_hours.to_string(),
                row.mean_hours.to_string(),
                row.task_errors.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_histogram(&mut self, rows: &[HistogramRow]) -> OutputResult<()> {
        for row in rows {
            self.histogram.write_record(&[
                row.phase_type.to_string(),
                row.bin_hours.to_string(),
                row.count.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_task_errors(&mut self, rows: &[TaskErrorRow]) -> OutputResult<()> {
        for row in rows {
            self.task_errors.write_record(&[
                row.replication.to_string(),
                row.time_hours.to_string(),
                row.phase.clone(),
                row.task_id.to_string(),
                row.task_name.clone(),
            ])?;
        }
        Ok(())
    }

    fn write_crew(&mut self, rows: &[CrewRow]) -> OutputResult<()> {
        for row in rows {
            self.crew.write_record(&[
                row.crewman_id.to_string(),
                row.name.clone(),
                row.replications.to_string(),
                row.mean_work_hours.to_string(),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.phase_types.flush()?;
        self.histogram.flush()?;
        self.task_errors.flush()?;
        self.crew.flush()?;
        Ok(())
    }
}
