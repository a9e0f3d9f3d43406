use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{cell::SpeciesCounts, island::Island, rng::SimRng, snapshot::SnapshotWriter};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    pub snapshot_interval_years: u64,
    pub snapshot_dir: PathBuf,
}

pub struct EngineBuilder {
    settings: EngineSettings,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: SimRng::new(self.settings.seed),
            snapshot_writer: SnapshotWriter::new(
                &self.settings.snapshot_dir,
                self.settings.snapshot_interval_years,
            ),
            settings: self.settings,
        }
    }
}

/// Island-wide tallies after one annual cycle.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct YearSummary {
    pub year: u64,
    pub population: SpeciesCounts,
    pub newborns: SpeciesCounts,
    pub deaths: SpeciesCounts,
}

impl YearSummary {
    pub fn from_island(island: &Island) -> Self {
        Self {
            year: island.year(),
            population: island.num_animals_per_species(),
            newborns: island.newborns(),
            deaths: island.deaths(),
        }
    }
}

/// Drives an island through whole years with the run's random stream.
pub struct Engine {
    rng: SimRng,
    snapshot_writer: SnapshotWriter,
    settings: EngineSettings,
}

impl Engine {
    /// The stream the run draws from; use it for anything that must be
    /// reproducible together with the simulation, such as initial weights.
    pub fn rng_mut(&mut self) -> &mut SimRng {
        &mut self.rng
    }

    pub fn run(&mut self, island: &mut Island, years: u64) -> Result<()> {
        self.run_with_hook(island, years, |_| {})
    }

    pub fn run_with_hook<F>(&mut self, island: &mut Island, years: u64, mut hook: F) -> Result<()>
    where
        F: FnMut(&YearSummary),
    {
        info!(
            scenario = %self.settings.scenario_name,
            seed = self.rng.seed(),
            start_year = island.year(),
            years,
            "simulation started"
        );
        if island.year() == 0 {
            let initial = YearSummary::from_island(island);
            if let Some(path) = self.snapshot_writer.maybe_write(
                island,
                &initial,
                &self.settings.scenario_name,
            )? {
                debug!(path = %path.display(), "initial snapshot written");
            }
        }
        let mut extinct = island.num_animals() == 0;
        for _ in 0..years {
            island
                .annual_cycle(&mut self.rng)
                .with_context(|| format!("Annual cycle {} failed", island.year() + 1))?;
            let summary = YearSummary::from_island(island);
            debug!(
                year = summary.year,
                herbivores = summary.population.herbivores,
                carnivores = summary.population.carnivores,
                births = summary.newborns.total(),
                deaths = summary.deaths.total(),
                "year simulated"
            );
            if let Some(path) = self.snapshot_writer.maybe_write(
                island,
                &summary,
                &self.settings.scenario_name,
            )? {
                debug!(path = %path.display(), "snapshot written");
            }
            if !extinct && summary.population.total() == 0 {
                warn!(year = summary.year, "island population went extinct");
                extinct = true;
            }
            hook(&summary);
        }
        info!(
            final_year = island.year(),
            herbivores = island.num_animals_per_species().herbivores,
            carnivores = island.num_animals_per_species().carnivores,
            "simulation finished"
        );
        Ok(())
    }
}
