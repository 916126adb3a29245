//! Re-issuing failed transactions after the first pass.
//!
//! Retries never rewrite a first-pass record. A successful retry only adds
//! a sample to the success-time list (and whatever it captured), so the
//! transaction count and plain average always describe the first pass while
//! the success average blends first-pass and retry successes.

use crate::dispatch::Dispatcher;
use crate::record::Ledger;
use crate::runner::Attempt;
use log::{info, warn};
use rand::Rng;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Each round draws as many fixture entries as the previous round had
    /// failures, uniformly and with replacement from the whole fixture set,
    /// until a round comes back clean. Does not give up.
    Resample,
    /// Each round retries exactly the entries still failing, for at most
    /// `max_rounds` rounds; whatever is left is reported as unrecovered.
    FailedOnly { max_rounds: usize },
}

impl fmt::Display for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryPolicy::Resample => write!(f, "resample"),
            RetryPolicy::FailedOnly { max_rounds } => write!(f, "failed (max {} rounds)", max_rounds),
        }
    }
}

/// Which retry policy a command line asked for; the round cap is supplied separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryKind {
    Resample,
    Failed,
}

impl FromStr for RetryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "resample" => Ok(RetryKind::Resample),
            "failed" => Ok(RetryKind::Failed),
            _ => Err(format!("invalid retry policy '{}': use 'resample' or 'failed'", s)),
        }
    }
}

impl RetryKind {
    pub fn with_max_rounds(self, max_rounds: usize) -> RetryPolicy {
        match self {
            RetryKind::Resample => RetryPolicy::Resample,
            RetryKind::Failed => RetryPolicy::FailedOnly { max_rounds },
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepOutcome {
    pub rounds: usize,
    pub retried: usize,
    pub unrecovered: usize,
}

pub struct Sweep<'a> {
    policy: RetryPolicy,
    dispatcher: &'a Dispatcher,
}

impl<'a> Sweep<'a> {
    pub fn new(policy: RetryPolicy, dispatcher: &'a Dispatcher) -> Self {
        Self { policy, dispatcher }
    }

    /// Retries until the policy is satisfied.
    ///
    /// `population` is the size of the fixture set, `failed` the fixture
    /// indices that failed on the first pass, and `attempt` re-runs the
    /// transaction for one fixture index.
    pub fn run<T, F, R>(
        &self,
        population: usize,
        failed: Vec<usize>,
        attempt: F,
        ledger: &mut Ledger,
        outputs: &mut Vec<T>,
        rng: &mut R,
    ) -> SweepOutcome
    where
        T: Send,
        F: Fn(usize) -> Attempt<T> + Sync,
        R: Rng,
    {
        let mut outcome = SweepOutcome::default();

        match self.policy {
            RetryPolicy::Resample => {
                let mut failures = failed.len();
                while failures > 0 && population > 0 {
                    outcome.rounds += 1;
                    let picks: Vec<usize> = (0..failures).map(|_| rng.gen_range(0..population)).collect();
                    info!("Sweep round {}: retrying {} sampled transactions", outcome.rounds, picks.len());
                    outcome.retried += picks.len();
                    failures = self.round(&picks, &attempt, ledger, outputs).len();
                }
            }
            RetryPolicy::FailedOnly { max_rounds } => {
                let mut pending = failed;
                while !pending.is_empty() && outcome.rounds < max_rounds {
                    outcome.rounds += 1;
                    info!("Sweep round {}: retrying {} failed transactions", outcome.rounds, pending.len());
                    outcome.retried += pending.len();
                    pending = self.round(&pending, &attempt, ledger, outputs);
                }
                if !pending.is_empty() {
                    warn!(
                        "Giving up on {} transactions after {} sweep rounds",
                        pending.len(),
                        outcome.rounds
                    );
                }
                outcome.unrecovered = pending.len();
            }
        }

        outcome
    }

    /// Runs one round and returns the fixture indices that failed again.
    fn round<T, F>(&self, picks: &[usize], attempt: &F, ledger: &mut Ledger, outputs: &mut Vec<T>) -> Vec<usize>
    where
        T: Send,
        F: Fn(usize) -> Attempt<T> + Sync,
    {
        let attempts = self.dispatcher.run(picks, |&index| attempt(index));
        picks
            .iter()
            .zip(attempts)
            .filter_map(|(&index, attempt)| {
                ledger.record_retry(attempt.record);
                outputs.extend(attempt.output);
                (!attempt.record.success).then_some(index)
            })
            .collect()
    }
}
