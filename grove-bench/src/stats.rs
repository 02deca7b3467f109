//! Per-iteration metrics and the end-of-run rollup.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::time::Duration;

use grove_result::Result;

/// Header of the per-iteration CSV report.
pub const REPORT_HEADER: &str = "Test Name,Table Name,Column Name,Records Deleted,\
Checkpoint time,Num Checkpoints,Running Duration,Data File Size,Metadata File Size";

/// Metrics of one workload iteration. Durations accumulate; sizes hold
/// the value observed after the last counted checkpoint.
#[derive(Debug, Clone, Default)]
pub struct TestCaseStat {
    pub test_name: String,
    pub table_name: String,
    pub column_name: String,
    pub records_deleted: u64,
    pub checkpoint_time: Duration,
    pub num_checkpoints: u64,
    pub running_duration: Duration,
    pub data_file_size: u64,
    pub metadata_file_size: u64,
}

impl TestCaseStat {
    /// One CSV row: durations in integer microseconds, sizes in bytes.
    pub fn report_row(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{}",
            self.test_name,
            self.table_name,
            self.column_name,
            self.records_deleted,
            self.checkpoint_time.as_micros(),
            self.num_checkpoints,
            self.running_duration.as_micros(),
            self.data_file_size,
            self.metadata_file_size,
        )
    }
}

/// Accumulated metrics over a whole run.
#[derive(Debug, Default)]
pub struct StatRollup {
    pub iterations: u64,
    pub records_deleted: u64,
    pub checkpoint_time: Duration,
    pub num_checkpoints: u64,
    pub running_duration: Duration,
    pub final_data_file_size: u64,
    pub final_metadata_file_size: u64,
}

impl StatRollup {
    pub fn add(&mut self, stat: &TestCaseStat) {
        self.iterations += 1;
        self.records_deleted += stat.records_deleted;
        self.checkpoint_time += stat.checkpoint_time;
        self.num_checkpoints += stat.num_checkpoints;
        self.running_duration += stat.running_duration;
        self.final_data_file_size = stat.data_file_size;
        self.final_metadata_file_size = stat.metadata_file_size;
    }

    /// Human-readable totals and averages.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        writeln!(out, "Iterations:            {}", self.iterations).ok();
        writeln!(out, "Records deleted:       {}", self.records_deleted).ok();
        writeln!(out, "Checkpoints:           {}", self.num_checkpoints).ok();
        writeln!(
            out,
            "Checkpoint time:       {} us",
            self.checkpoint_time.as_micros()
        )
        .ok();
        if self.num_checkpoints > 0 {
            writeln!(
                out,
                "Avg checkpoint time:   {} us",
                self.checkpoint_time.as_micros() / u128::from(self.num_checkpoints)
            )
            .ok();
        }
        writeln!(
            out,
            "Running duration:      {} us",
            self.running_duration.as_micros()
        )
        .ok();
        if self.iterations > 0 {
            writeln!(
                out,
                "Avg iteration:         {} us",
                self.running_duration.as_micros() / u128::from(self.iterations)
            )
            .ok();
        }
        writeln!(
            out,
            "Final data file size:  {} bytes",
            self.final_data_file_size
        )
        .ok();
        writeln!(
            out,
            "Final metadata size:   {} bytes",
            self.final_metadata_file_size
        )
        .ok();
        out
    }
}

/// Writes the per-iteration CSV report.
pub fn write_report(path: impl AsRef<Path>, stats: &[TestCaseStat]) -> Result<()> {
    let mut content = String::with_capacity(128 * (stats.len() + 1));
    content.push_str(REPORT_HEADER);
    content.push('\n');
    for stat in stats {
        content.push_str(&stat.report_row());
        content.push('\n');
    }
    fs::write(path, content)?;
    Ok(())
}
