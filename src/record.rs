use std::fmt;
use std::time::Duration;

/// Outcome of one timed call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransactionRecord {
    /// `None` when the call never got a response (connection refused, reset...).
    pub status_code: Option<u16>,
    pub elapsed: Duration,
    pub success: bool,
}

impl TransactionRecord {
    pub fn new(status_code: Option<u16>, elapsed: Duration, expected: u16) -> Self {
        Self {
            status_code,
            elapsed,
            success: status_code == Some(expected),
        }
    }
}

/// Renders as `{status_code}, {elapsed_seconds}`; a missing status renders as `0`.
impl fmt::Display for TransactionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}",
            self.status_code.unwrap_or(0),
            self.elapsed.as_secs_f64()
        )
    }
}

/// Everything timed during one run.
///
/// `first_pass` holds exactly one record per fixture entry and is never
/// rewritten; `success_times` collects first-pass successes plus every
/// successful retry.
#[derive(Debug, Default, Clone)]
pub struct Ledger {
    pub first_pass: Vec<TransactionRecord>,
    pub success_times: Vec<Duration>,
}

impl Ledger {
    pub fn record_first_pass(&mut self, record: TransactionRecord) {
        if record.success {
            self.success_times.push(record.elapsed);
        }
        self.first_pass.push(record);
    }

    pub fn record_retry(&mut self, record: TransactionRecord) {
        if record.success {
            self.success_times.push(record.elapsed);
        }
    }

    /// Fixture indices whose first-pass record is a failure.
    pub fn first_pass_failures(&self) -> Vec<usize> {
        self.first_pass
            .iter()
            .enumerate()
            .filter_map(|(index, record)| (!record.success).then_some(index))
            .collect()
    }
}
