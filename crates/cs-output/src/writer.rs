//! The `OutputWriter` trait implemented by report backends.

use crate::{CrewRow, HistogramRow, OutputResult, PhaseTypeRow, TaskErrorRow};

/// A sink for the rows of a statistics report.
pub trait OutputWriter {
    fn write_phase_types(&mut self, rows: &[PhaseTypeRow]) -> OutputResult<()>;

    fn write_histogram(&mut self, rows: &[HistogramRow]) -> OutputResult<()>;

    fn write_task_errors(&mut self, rows: &[TaskErrorRow]) -> OutputResult<()>;

    fn write_crew(&mut self, rows: &[CrewRow]) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent: safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
