use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use cecs::{logger, scenario::ScenarioLoader};

#[derive(Debug, Parser)]
#[command(author, version, about = "Run a drift scenario on the cecs world")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/drift.yaml")]
    scenario: PathBuf,

    /// Override tick count (uses scenario default when omitted)
    #[arg(long)]
    ticks: Option<u64>,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Print one JSON tick summary per line
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let mut scenario = loader.load(&cli.scenario)?;
    if let Some(seed) = cli.seed {
        scenario.seed = seed;
    }
    logger::init(&scenario.logging)?;

    let ticks = scenario.ticks(cli.ticks);
    let mut engine = scenario.build_engine().build();

    let mut last = None;
    engine.run_with_hook(ticks, |summary| {
        if cli.json {
            match serde_json::to_string(summary) {
                Ok(line) => println!("{line}"),
                Err(err) => tracing::warn!(error = %err, "failed to encode tick summary"),
            }
        }
        last = Some(summary.clone());
    })?;

    if let Some(summary) = last {
        let anchored = summary.census.map_or(0, |census| census.anchored);
        println!(
            "Scenario '{}' completed for {} ticks. Entities: {}, anchored: {}",
            engine.scenario_name(),
            ticks,
            summary.entities,
            anchored
        );
    }
    Ok(())
}
