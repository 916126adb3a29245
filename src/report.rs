use crate::dispatch::DispatchMode;
use crate::layout::{RunLayout, Stage};
use crate::record::Ledger;
use crate::sweep::SweepOutcome;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use std::fmt;
use std::fs;
use std::path::Path;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Aggregate metrics of one run, derived from its [`Ledger`].
///
/// `total_time`, `count`, `average_time` and `rate` cover the first pass
/// only. The success figures average over every success sample, first-pass
/// and retry alike.
///
/// `rate` is `1 / average_time`: the throughput of a single client, not
/// `count / wall_clock` across the pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub count: usize,
    pub total_time: f64,
    pub average_time: f64,
    pub rate: f64,
    pub successful: usize,
    pub success_samples: usize,
    pub average_time_success: f64,
    pub rate_success: f64,
    pub success_ratio: f64,
}

impl RunSummary {
    pub fn from_ledger(ledger: &Ledger) -> Self {
        let count = ledger.first_pass.len();
        let total_time: f64 = ledger.first_pass.iter().map(|r| r.elapsed.as_secs_f64()).sum();
        let average_time = mean(total_time, count);

        let successful = ledger.first_pass.iter().filter(|r| r.success).count();
        let success_samples = ledger.success_times.len();
        let total_success: f64 = ledger.success_times.iter().map(|d| d.as_secs_f64()).sum();
        let average_time_success = mean(total_success, success_samples);

        Self {
            count,
            total_time,
            average_time,
            rate: reciprocal(average_time),
            successful,
            success_samples,
            average_time_success,
            rate_success: reciprocal(average_time_success),
            success_ratio: if count == 0 { 0.0 } else { successful as f64 / count as f64 },
        }
    }
}

fn mean(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

fn reciprocal(value: f64) -> f64 {
    if value > 0.0 {
        1.0 / value
    } else {
        0.0
    }
}

/// Fixed-format text summary of a finished run.
pub struct Report<'a> {
    pub stage: Stage,
    pub layout: &'a RunLayout,
    pub mode: DispatchMode,
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
    pub ledger: &'a Ledger,
    pub sweep: SweepOutcome,
    pub expected_status: u16,
}

impl Report<'_> {
    pub fn summary(&self) -> RunSummary {
        RunSummary::from_ledger(self.ledger)
    }

    pub fn render(&self) -> String {
        self.to_string()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("could not create report directory '{}'", parent.display()))?;
        }
        fs::write(path, self.render())
            .with_context(|| format!("could not write report '{}'", path.display()))?;
        info!("Transaction summary saved to '{}'", path.display());
        Ok(())
    }
}

/// Header, metric block, first-pass records, then the success samples.
impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.summary();

        writeln!(
            f,
            "{} Test - {} attributes in policy, {} attributes in key, {} transactions, {}",
            self.stage, self.layout.policy_size, self.layout.num_attributes, self.layout.label, self.mode
        )?;
        writeln!(f, "Test start: {}", self.started.format(TIMESTAMP_FORMAT))?;
        writeln!(f, "Test end: {}", self.finished.format(TIMESTAMP_FORMAT))?;
        writeln!(f, "Total number of transactions: {}", summary.count)?;
        writeln!(f, "Total time: {}", summary.total_time)?;
        writeln!(f, "Average transaction time: {}", summary.average_time)?;
        writeln!(f, "Average transaction time (success): {}", summary.average_time_success)?;
        writeln!(f, "Transactions per second: {}", summary.rate)?;
        writeln!(f, "Transactions per second (success): {}", summary.rate_success)?;
        writeln!(f, "Successful transactions: {}", summary.successful)?;
        writeln!(f, "Success rate: {}", summary.success_ratio)?;
        writeln!(f, "Sweep rounds: {}", self.sweep.rounds)?;
        writeln!(f, "Retried transactions: {}", self.sweep.retried)?;
        writeln!(f, "Unrecovered transactions: {}", self.sweep.unrecovered)?;

        writeln!(f)?;
        for record in &self.ledger.first_pass {
            writeln!(f, "{}", record)?;
        }

        if !self.ledger.success_times.is_empty() {
            writeln!(f)?;
            for elapsed in &self.ledger.success_times {
                writeln!(f, "{}, {}", self.expected_status, elapsed.as_secs_f64())?;
            }
        }
        Ok(())
    }
}
