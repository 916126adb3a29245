//! The three benchmark stages. Each one loads its fixtures, times a first
//! pass over them, sweeps up failures, persists what the service handed back
//! and writes a transaction summary.

use crate::config::ExpectedStatus;
use crate::dispatch::Dispatcher;
use crate::fixture;
use crate::layout::RunLayout;
use crate::model::{Encounter, EncounterRef, User, UserMeta};
use crate::operation::{EncounterSubmission, Operation};
use crate::record::Ledger;
use crate::report::{Report, RunSummary};
use crate::runner;
use crate::sweep::{RetryPolicy, Sweep, SweepOutcome};
use crate::transport::Transport;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};
use rand::Rng;

/// Everything a first pass plus sweep produced.
#[derive(Debug)]
pub struct BenchRun<T> {
    pub ledger: Ledger,
    pub outputs: Vec<T>,
    pub sweep: SweepOutcome,
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
}

/// Times one transaction per input, then retries failures per `retry`.
pub fn benchmark<O, R>(
    op: &O,
    transport: &dyn Transport,
    dispatcher: &Dispatcher,
    retry: RetryPolicy,
    inputs: &[O::Input],
    rng: &mut R,
) -> BenchRun<O::Output>
where
    O: Operation,
    R: Rng,
{
    info!(
        "{} test: {} transactions, {}, retry policy {}",
        op.stage(),
        inputs.len(),
        dispatcher.mode(),
        retry
    );
    let started = Utc::now();

    let attempts = dispatcher.run(inputs, |input| runner::execute(op, transport, input));

    let mut ledger = Ledger::default();
    let mut outputs = Vec::with_capacity(inputs.len());
    for attempt in attempts {
        ledger.record_first_pass(attempt.record);
        outputs.extend(attempt.output);
    }
    let failed = ledger.first_pass_failures();
    info!(
        "{} first pass done: {}/{} succeeded",
        op.stage(),
        inputs.len() - failed.len(),
        inputs.len()
    );

    let sweep = Sweep::new(retry, dispatcher).run(
        inputs.len(),
        failed,
        |index| runner::execute(op, transport, &inputs[index]),
        &mut ledger,
        &mut outputs,
        rng,
    );

    BenchRun {
        ledger,
        outputs,
        sweep,
        started,
        finished: Utc::now(),
    }
}

/// A configured benchmark against one service, for one run shape.
pub struct Bench<'a> {
    pub layout: RunLayout,
    pub dispatcher: Dispatcher,
    pub retry: RetryPolicy,
    pub expected: ExpectedStatus,
    pub transport: &'a dyn Transport,
}

impl Bench<'_> {
    /// Registers every user fixture and saves the issued ids and keys for
    /// the save stage.
    pub fn key_generation<R: Rng>(&self, rng: &mut R) -> Result<RunSummary> {
        let metas: Vec<UserMeta> = fixture::load(&self.layout.input_path())?;
        let op = self.expected.key_generation_op();
        let run = self.run(&op, &metas, rng);

        fixture::store(&self.layout.users_path(), &run.outputs)?;
        self.finish(&op, &run)
    }

    /// Submits encounter fixtures, each stamped for the user at the same
    /// position in the users file, and saves the accepted ids for the query
    /// stage.
    pub fn save_encounters<R: Rng>(&self, rng: &mut R) -> Result<RunSummary> {
        let users: Vec<User> = fixture::load(&self.layout.users_path())
            .context("the key generation stage must run first")?;
        let encounters: Vec<Encounter> = fixture::load(&self.layout.input_path())?;
        if users.len() != encounters.len() {
            warn!(
                "{} encounters but {} users; only the first {} pairs are submitted",
                encounters.len(),
                users.len(),
                encounters.len().min(users.len())
            );
        }

        let submissions: Vec<EncounterSubmission> = encounters
            .into_iter()
            .zip(users)
            .map(|(encounter, user)| EncounterSubmission { encounter, user })
            .collect();

        let op = self.expected.save_encounter_op();
        let run = self.run(&op, &submissions, rng);

        fixture::store(&self.layout.encounter_ids_path(), &run.outputs)?;
        self.finish(&op, &run)
    }

    /// Reads back every saved encounter with its owner's private key.
    pub fn query_encounters<R: Rng>(&self, rng: &mut R) -> Result<RunSummary> {
        let references: Vec<EncounterRef> = fixture::load(&self.layout.encounter_ids_path())
            .context("the save encounter stage must run first")?;
        let op = self.expected.query_encounter_op();
        let run = self.run(&op, &references, rng);

        fixture::store(&self.layout.queried_encounters_path(), &run.outputs)?;
        self.finish(&op, &run)
    }

    fn run<O: Operation, R: Rng>(&self, op: &O, inputs: &[O::Input], rng: &mut R) -> BenchRun<O::Output> {
        benchmark(op, self.transport, &self.dispatcher, self.retry, inputs, rng)
    }

    fn finish<O: Operation>(&self, op: &O, run: &BenchRun<O::Output>) -> Result<RunSummary> {
        let report = Report {
            stage: op.stage(),
            layout: &self.layout,
            mode: self.dispatcher.mode(),
            started: run.started,
            finished: run.finished,
            ledger: &run.ledger,
            sweep: run.sweep,
            expected_status: op.expected_status(),
        };
        report.save(&self.layout.summary_path(op.stage()))?;

        let summary = report.summary();
        info!(
            "{} test finished: {} transactions, {:.4}s average, {:.2} tx/s, success rate {:.3}",
            op.stage(),
            summary.count,
            summary.average_time,
            summary.rate,
            summary.success_ratio
        );
        Ok(summary)
    }
}
