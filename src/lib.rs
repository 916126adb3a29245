//! Benchmark harness for an attribute-based-encryption encounter service.
//!
//! Each stage reads a JSON fixture, times one HTTP transaction per entry
//! across a pool of simulated users, sweeps up failures, and writes a flat
//! transaction summary alongside whatever the service handed back.

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod fixture;
pub mod layout;
pub mod model;
pub mod operation;
pub mod record;
pub mod report;
pub mod runner;
pub mod stage;
pub mod sweep;
pub mod transport;

pub use config::{ExpectedStatus, ServiceConfig};
pub use dispatch::{DispatchMode, Dispatcher};
pub use layout::{RunLayout, Stage};
pub use record::{Ledger, TransactionRecord};
pub use report::RunSummary;
pub use stage::Bench;
pub use sweep::RetryPolicy;
