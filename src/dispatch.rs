//! Spreads transactions over a fixed pool of worker threads, or runs them
//! one after another.
//!
//! The pool size models the number of simulated concurrent clients, so it is
//! taken as given and never derived from the host's CPU count.

use log::info;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    Sequential,
    Pooled { workers: usize },
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchMode::Sequential => write!(f, "sequential"),
            DispatchMode::Pooled { workers } => write!(f, "{} concurrent users", workers),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    mode: DispatchMode,
}

impl Dispatcher {
    pub fn new(mode: DispatchMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Runs `work` once per job and returns the results in job order.
    ///
    /// Jobs are handed out in order; with a pool they may finish in any
    /// order. Each worker buffers its own results and the buffers are merged
    /// after every worker has joined, so nothing is lost or duplicated.
    pub fn run<J, R, F>(&self, jobs: &[J], work: F) -> Vec<R>
    where
        J: Sync,
        R: Send,
        F: Fn(&J) -> R + Sync,
    {
        match self.mode {
            DispatchMode::Sequential => {
                let progress = Progress::new(jobs.len());
                jobs.iter()
                    .map(|job| {
                        let result = work(job);
                        progress.tick();
                        result
                    })
                    .collect()
            }
            DispatchMode::Pooled { workers } => run_pooled(jobs, workers, &work),
        }
    }
}

fn run_pooled<J, R, F>(jobs: &[J], workers: usize, work: &F) -> Vec<R>
where
    J: Sync,
    R: Send,
    F: Fn(&J) -> R + Sync,
{
    let workers = workers.clamp(1, jobs.len().max(1));
    let next_job = AtomicUsize::new(0);
    let progress = Progress::new(jobs.len());

    let mut indexed: Vec<(usize, R)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(|| {
                    let mut local = Vec::new();
                    loop {
                        let index = next_job.fetch_add(1, Ordering::Relaxed);
                        let Some(job) = jobs.get(index) else {
                            break;
                        };
                        local.push((index, work(job)));
                        progress.tick();
                    }
                    local
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .collect()
    });

    indexed.sort_unstable_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, result)| result).collect()
}

/// Logs completion roughly every tenth of the way through.
struct Progress {
    total: usize,
    step: usize,
    completed: AtomicUsize,
}

impl Progress {
    fn new(total: usize) -> Self {
        Self {
            total,
            step: (total / 10).max(1),
            completed: AtomicUsize::new(0),
        }
    }

    fn tick(&self) {
        let done = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        if done % self.step == 0 || done == self.total {
            info!(
                "Progress: {}/{} ({:.1}%)",
                done,
                self.total,
                done as f64 / self.total as f64 * 100.0
            );
        }
    }
}
