use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use rand::Rng;
use serde::Deserialize;

use crate::{
    animal::Species,
    island::{Island, PopulationEntry},
    landscape::Landscape,
    params::ParameterRegistry,
};

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// A complete simulation setup: map, parameter overrides and the initial
/// population.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default)]
    pub years: Option<u64>,
    #[serde(default)]
    pub snapshot_interval_years: u64,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub island_map: String,
    #[serde(default)]
    pub animal_parameters: BTreeMap<Species, BTreeMap<String, f64>>,
    #[serde(default)]
    pub landscape_parameters: BTreeMap<Landscape, BTreeMap<String, f64>>,
    #[serde(default)]
    pub populations: Vec<PopulationEntry>,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        Scenario::from_yaml(&data).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

impl Scenario {
    pub fn from_yaml(data: &str) -> Result<Self> {
        let scenario: Scenario = serde_yaml::from_str(data)?;
        Ok(scenario)
    }

    pub fn parameters(&self) -> Result<ParameterRegistry> {
        let mut params = ParameterRegistry::new();
        for (species, overrides) in &self.animal_parameters {
            params
                .set_animal_parameters(*species, overrides)
                .with_context(|| format!("Invalid {species} parameters"))?;
        }
        for (landscape, overrides) in &self.landscape_parameters {
            params
                .set_landscape_parameters(*landscape, overrides)
                .with_context(|| format!("Invalid {landscape} parameters"))?;
        }
        Ok(params)
    }

    /// Build the configured island and place the initial population. Draws
    /// from `rng` only for animals given without a weight.
    pub fn build_island<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Island> {
        let mut island = Island::with_parameters(&self.island_map, self.parameters()?)
            .with_context(|| format!("Invalid island map in scenario '{}'", self.name))?;
        island
            .place_population(&self.populations, rng)
            .with_context(|| format!("Invalid initial population in scenario '{}'", self.name))?;
        Ok(island)
    }

    pub fn years(&self, override_years: Option<u64>) -> u64 {
        override_years.or(self.years).unwrap_or(100)
    }
}
