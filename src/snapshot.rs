use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cell::SpeciesCounts;
use crate::engine::YearSummary;
use crate::island::{Island, PopulationGrid};

/// What gets written to disk for one year.
#[derive(Debug, Serialize)]
pub struct IslandSnapshot<'a> {
    pub scenario: &'a str,
    pub year: u64,
    pub population: SpeciesCounts,
    pub newborns: SpeciesCounts,
    pub deaths: SpeciesCounts,
    pub map: Vec<String>,
    pub grid: PopulationGrid,
}

impl<'a> IslandSnapshot<'a> {
    pub fn capture(scenario: &'a str, island: &Island, summary: &YearSummary) -> Self {
        Self {
            scenario,
            year: summary.year,
            population: summary.population,
            newborns: summary.newborns,
            deaths: summary.deaths,
            map: island.map_string().lines().map(str::to_string).collect(),
            grid: island.population_grid(),
        }
    }
}

pub struct SnapshotWriter {
    dir: PathBuf,
    interval_years: u64,
}

impl SnapshotWriter {
    pub fn new(dir: impl AsRef<Path>, interval_years: u64) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            interval_years,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.interval_years > 0
    }

    pub fn maybe_write(
        &self,
        island: &Island,
        summary: &YearSummary,
        scenario_name: &str,
    ) -> Result<Option<PathBuf>> {
        if !self.is_enabled() || summary.year % self.interval_years != 0 {
            return Ok(None);
        }

        let dir = self.dir.join(scenario_name);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create snapshot dir {}", dir.display()))?;
        let path = dir.join(format!("year_{:05}.json", summary.year));
        let snapshot = IslandSnapshot::capture(scenario_name, island, summary);
        let json = serde_json::to_string_pretty(&snapshot)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        Ok(Some(path))
    }
}
