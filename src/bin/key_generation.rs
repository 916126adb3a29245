//! Key generation benchmark: registers every user fixture with the service.
//!
//! Run examples:
//! # 4-attribute policies, 8 attributes per key, 20 concurrent users
//! cargo run --bin key_generation -- 4 8 500_users.json -u 20
//!
//! # One request at a time, verbose output
//! cargo run --bin key_generation -- 4 8 500_users.json --sequential -v

use abe_encounter_bench::cli::StageArgs;
use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(version, about = "Benchmark user registration (key generation)", long_about = None)]
struct Cli {
    #[command(flatten)]
    stage: StageArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.stage.init_logging();

    let transport = cli.stage.connect()?;
    let summary = cli.stage.bench(&transport).key_generation(&mut rand::thread_rng())?;
    println!(
        "Key generation: {} transactions, success rate {:.3}",
        summary.count, summary.success_ratio
    );
    Ok(())
}
