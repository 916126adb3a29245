//! Query encounter benchmark: reads back the encounters saved by
//! `save_encounter`, authenticating with each owner's private key.
//!
//! Run examples:
//! cargo run --bin query_encounter -- 4 8 500_encounters.json --sequential

use abe_encounter_bench::cli::StageArgs;
use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(version, about = "Benchmark encounter retrieval", long_about = None)]
struct Cli {
    #[command(flatten)]
    stage: StageArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.stage.init_logging();

    let transport = cli.stage.connect()?;
    let summary = cli.stage.bench(&transport).query_encounters(&mut rand::thread_rng())?;
    println!(
        "Query encounter: {} transactions, success rate {:.3}",
        summary.count, summary.success_ratio
    );
    Ok(())
}
