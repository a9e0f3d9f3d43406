use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::BiosimError;
use crate::params::AnimalParams;
use crate::rng::RngExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Species {
    Herbivore,
    Carnivore,
}

impl Species {
    pub const ALL: [Species; 2] = [Species::Herbivore, Species::Carnivore];
}

impl FromStr for Species {
    type Err = BiosimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Herbivore" => Ok(Species::Herbivore),
            "Carnivore" => Ok(Species::Carnivore),
            other => Err(BiosimError::UnknownSpecies(other.to_string())),
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Species::Herbivore => write!(f, "Herbivore"),
            Species::Carnivore => write!(f, "Carnivore"),
        }
    }
}

/// One individual. The species parameters are not stored on the animal;
/// every operation takes the current table from the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Animal {
    species: Species,
    age: u32,
    weight: f64,
    fitness: f64,
    migrated: bool,
}

impl Animal {
    pub fn new(species: Species, age: u32, weight: f64) -> Self {
        Self {
            species,
            age,
            weight: weight.max(0.0),
            fitness: 0.0,
            migrated: false,
        }
    }

    pub fn herbivore(age: u32, weight: f64) -> Self {
        Self::new(Species::Herbivore, age, weight)
    }

    pub fn carnivore(age: u32, weight: f64) -> Self {
        Self::new(Species::Carnivore, age, weight)
    }

    /// Individual of the given age whose weight is drawn from the birth
    /// distribution.
    pub fn with_random_weight<R: Rng + ?Sized>(
        species: Species,
        age: u32,
        params: &AnimalParams,
        rng: &mut R,
    ) -> Self {
        let weight = rng.gauss(params.w_birth, params.sigma_birth);
        Self::new(species, age, weight)
    }

    pub fn species(&self) -> Species {
        self.species
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Fitness as of the last call to [`Animal::update_fitness`].
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn has_migrated(&self) -> bool {
        self.migrated
    }

    pub(crate) fn mark_migrated(&mut self) {
        self.migrated = true;
    }

    pub(crate) fn reset_migrated(&mut self) {
        self.migrated = false;
    }

    /// Fitness from the current age and weight, without caching it.
    pub fn compute_fitness(&self, params: &AnimalParams) -> f64 {
        if self.weight <= 0.0 {
            return 0.0;
        }
        let q_age = 1.0 / (1.0 + (params.phi_age * (self.age as f64 - params.a_half)).exp());
        let q_weight =
            1.0 / (1.0 + (-params.phi_weight * (self.weight - params.w_half)).exp());
        q_age * q_weight
    }

    pub fn update_fitness(&mut self, params: &AnimalParams) -> f64 {
        self.fitness = self.compute_fitness(params);
        self.fitness
    }

    pub fn ageing(&mut self) {
        self.age += 1;
    }

    pub fn weight_loss(&mut self, params: &AnimalParams) -> f64 {
        self.weight -= params.eta * self.weight;
        self.weight
    }

    /// Attempt to give birth in a cell holding `same_species_count` animals
    /// of this species. Returns the newborn's weight on success.
    pub fn birth<R: Rng + ?Sized>(
        &mut self,
        params: &AnimalParams,
        same_species_count: usize,
        rng: &mut R,
    ) -> Option<f64> {
        if same_species_count <= 1 || self.weight < params.birth_reserve() {
            return None;
        }
        let fitness = self.update_fitness(params);
        let probability = (params.gamma * fitness * (same_species_count - 1) as f64).min(1.0);
        if probability < rng.uniform() {
            return None;
        }
        let child_weight = rng.gauss(params.w_birth, params.sigma_birth);
        let cost = params.xi * child_weight;
        if child_weight <= 0.0 || self.weight < cost {
            return None;
        }
        self.weight -= cost;
        Some(child_weight)
    }

    pub fn death<R: Rng + ?Sized>(&mut self, params: &AnimalParams, rng: &mut R) -> bool {
        if self.weight <= 0.0 {
            return true;
        }
        let probability = params.omega * (1.0 - self.update_fitness(params));
        if probability == 0.0 {
            return false;
        }
        rng.uniform() <= probability
    }

    /// Herbivore feeding on `fodder` units of plant matter.
    pub fn graze(&mut self, params: &AnimalParams, fodder: f64) {
        debug_assert_eq!(self.species, Species::Herbivore);
        self.weight += params.beta * fodder;
    }

    /// Whether this carnivore manages to kill `prey`. Refreshes both
    /// fitness values.
    pub fn kills<R: Rng + ?Sized>(
        &mut self,
        prey: &mut Animal,
        params: &AnimalParams,
        prey_params: &AnimalParams,
        rng: &mut R,
    ) -> bool {
        let fitness = self.update_fitness(params);
        let prey_fitness = prey.update_fitness(prey_params);
        if fitness <= prey_fitness {
            return false;
        }
        match params.delta_phi_max {
            Some(delta) if fitness > 0.0 && fitness < delta => {
                let probability = (fitness - prey_fitness) / delta;
                probability >= rng.uniform()
            }
            _ => true,
        }
    }

    /// Carnivore feeding on `herbivores`, visited in the given order. Eaten
    /// herbivores are removed from the list. Feeding stops with the kill that
    /// brings the eaten biomass to at least `F`, so the last prey may
    /// overshoot the appetite. Returns the biomass eaten.
    pub fn hunt<R: Rng + ?Sized>(
        &mut self,
        herbivores: &mut Vec<Animal>,
        params: &AnimalParams,
        prey_params: &AnimalParams,
        rng: &mut R,
    ) -> f64 {
        debug_assert_eq!(self.species, Species::Carnivore);
        let mut eaten = vec![false; herbivores.len()];
        let mut eaten_weight = 0.0;
        for (index, prey) in herbivores.iter_mut().enumerate() {
            if !self.kills(prey, params, prey_params, rng) {
                continue;
            }
            eaten_weight += prey.weight;
            self.weight += params.beta * prey.weight;
            eaten[index] = true;
            if eaten_weight >= params.f {
                break;
            }
        }
        let mut flags = eaten.into_iter();
        herbivores.retain(|_| !flags.next().unwrap_or(false));
        eaten_weight
    }
}
