//! Arguments shared by the stage binaries.

use crate::config::ServiceConfig;
use crate::dispatch::{DispatchMode, Dispatcher};
use crate::layout::RunLayout;
use crate::stage::Bench;
use crate::sweep::{RetryKind, RetryPolicy};
use crate::transport::HttpTransport;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct StageArgs {
    /// Number of attributes in the access policy
    pub policy_size: u32,

    /// Number of attributes in each user's key
    pub num_attributes: u32,

    /// Fixture file under the input directory; its leading `N_` token labels the run
    pub input_filename: String,

    /// Service configuration file (JSON)
    #[arg(short = 'c', long, default_value = "service.json")]
    pub config: PathBuf,

    /// Number of simulated concurrent users (worker threads)
    #[arg(short = 'u', long, default_value = "10")]
    pub users: usize,

    /// Issue transactions one at a time instead of through the pool
    #[arg(short = 's', long)]
    pub sequential: bool,

    /// Retry sweep policy: `resample` or `failed`
    #[arg(long, default_value = "resample")]
    pub retry: RetryKind,

    /// Round cap for the `failed` retry policy
    #[arg(long, default_value = "5")]
    pub max_sweep_rounds: usize,

    /// Directory holding fixtures and captured entities
    #[arg(long, default_value = "input")]
    pub input_dir: PathBuf,

    /// Directory receiving transaction summaries
    #[arg(long, default_value = "data")]
    pub output_dir: PathBuf,

    /// Enable verbose output
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl StageArgs {
    pub fn init_logging(&self) {
        let level = if self.verbose { "debug" } else { "info" };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    }

    pub fn dispatch_mode(&self) -> DispatchMode {
        if self.sequential {
            DispatchMode::Sequential
        } else {
            DispatchMode::Pooled { workers: self.users }
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.with_max_rounds(self.max_sweep_rounds)
    }

    pub fn layout(&self) -> RunLayout {
        RunLayout::new(
            self.policy_size,
            self.num_attributes,
            &self.input_filename,
            &self.input_dir,
            &self.output_dir,
        )
    }

    pub fn load_config(&self) -> Result<ServiceConfig> {
        ServiceConfig::load(&self.config)
            .with_context(|| format!("loading service config '{}'", self.config.display()))
    }

    pub fn connect(&self) -> Result<HttpTransport> {
        let config = self.load_config()?;
        HttpTransport::new(config).context("building HTTP client")
    }

    pub fn bench<'a>(&self, transport: &'a HttpTransport) -> Bench<'a> {
        Bench {
            layout: self.layout(),
            dispatcher: Dispatcher::new(self.dispatch_mode()),
            retry: self.retry_policy(),
            expected: transport.config().expected,
            transport,
        }
    }
}
