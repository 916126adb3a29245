//! Save encounter benchmark: submits encounter payloads on behalf of the
//! users created by `key_generation`.
//!
//! Run examples:
//! # Submit 500 encounters with 10 concurrent users
//! cargo run --bin save_encounter -- 4 8 500_encounters.json
//!
//! # Retry only the failed submissions, giving up after 3 rounds
//! cargo run --bin save_encounter -- 4 8 500_encounters.json --retry failed --max-sweep-rounds 3

use abe_encounter_bench::cli::StageArgs;
use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(version, about = "Benchmark encounter submission", long_about = None)]
struct Cli {
    #[command(flatten)]
    stage: StageArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.stage.init_logging();

    let transport = cli.stage.connect()?;
    let summary = cli.stage.bench(&transport).save_encounters(&mut rand::thread_rng())?;
    println!(
        "Save encounter: {} transactions, success rate {:.3}",
        summary.count, summary.success_ratio
    );
    Ok(())
}
