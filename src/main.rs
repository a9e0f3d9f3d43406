use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use biosim::{
    engine::{EngineBuilder, EngineSettings},
    scenario::ScenarioLoader,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Island ecosystem simulation runner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/rossumoya.yaml")]
    scenario: PathBuf,

    /// Override the number of years (uses scenario default when omitted)
    #[arg(long)]
    years: Option<u64>,

    /// Override the random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override snapshot interval in years (0 disables snapshots)
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Directory for snapshots
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&cli.scenario)?;
    init_tracing(&scenario.logging.level);

    let years = scenario.years(cli.years);
    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: cli.seed.unwrap_or(scenario.seed),
        snapshot_interval_years: cli
            .snapshot_interval
            .unwrap_or(scenario.snapshot_interval_years),
        snapshot_dir: cli
            .snapshot_dir
            .unwrap_or_else(|| PathBuf::from("snapshots")),
    };

    let mut engine = EngineBuilder::new(settings).build();
    let mut island = scenario.build_island(engine.rng_mut())?;
    info!(
        scenario = %scenario.name,
        rows = island.rows(),
        cols = island.cols(),
        animals = island.num_animals(),
        "island built"
    );

    engine.run(&mut island, years)?;
    let counts = island.num_animals_per_species();
    println!(
        "Scenario '{}' completed after {} years. Herbivores: {}, carnivores: {}",
        scenario.name,
        island.year(),
        counts.herbivores,
        counts.carnivores
    );
    Ok(())
}
