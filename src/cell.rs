use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::animal::{Animal, Species};
use crate::error::BiosimError;
use crate::landscape::Landscape;
use crate::params::ParameterRegistry;
use crate::rng::RngExt;

/// Per-species tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SpeciesCounts {
    pub herbivores: usize,
    pub carnivores: usize,
}

impl SpeciesCounts {
    pub fn set(&mut self, species: Species, value: usize) {
        match species {
            Species::Herbivore => self.herbivores = value,
            Species::Carnivore => self.carnivores = value,
        }
    }

    pub fn total(&self) -> usize {
        self.herbivores + self.carnivores
    }
}

impl std::ops::AddAssign for SpeciesCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.herbivores += rhs.herbivores;
        self.carnivores += rhs.carnivores;
    }
}

/// A migration candidate: species and index into that population.
pub type Candidate = (Species, usize);

/// One landscape square with its fodder and both populations.
#[derive(Debug, Clone)]
pub struct Cell {
    landscape: Landscape,
    fodder: f64,
    herbivores: Vec<Animal>,
    carnivores: Vec<Animal>,
    newborns: SpeciesCounts,
    deaths: SpeciesCounts,
}

impl Cell {
    pub fn new(landscape: Landscape, f_max: f64) -> Self {
        Self {
            landscape,
            fodder: f_max,
            herbivores: Vec::new(),
            carnivores: Vec::new(),
            newborns: SpeciesCounts::default(),
            deaths: SpeciesCounts::default(),
        }
    }

    pub fn landscape(&self) -> Landscape {
        self.landscape
    }

    pub fn is_habitable(&self) -> bool {
        self.landscape.is_habitable()
    }

    pub fn fodder(&self) -> f64 {
        self.fodder
    }

    pub fn herbivores(&self) -> &[Animal] {
        &self.herbivores
    }

    pub fn carnivores(&self) -> &[Animal] {
        &self.carnivores
    }

    pub fn population(&self, species: Species) -> &[Animal] {
        match species {
            Species::Herbivore => &self.herbivores,
            Species::Carnivore => &self.carnivores,
        }
    }

    fn population_mut(&mut self, species: Species) -> &mut Vec<Animal> {
        match species {
            Species::Herbivore => &mut self.herbivores,
            Species::Carnivore => &mut self.carnivores,
        }
    }

    pub fn counts(&self) -> SpeciesCounts {
        SpeciesCounts {
            herbivores: self.herbivores.len(),
            carnivores: self.carnivores.len(),
        }
    }

    pub fn number_of_animals(&self) -> usize {
        self.herbivores.len() + self.carnivores.len()
    }

    pub fn animals(&self) -> impl Iterator<Item = &Animal> {
        self.herbivores.iter().chain(self.carnivores.iter())
    }

    pub fn newborns(&self) -> SpeciesCounts {
        self.newborns
    }

    pub fn deaths(&self) -> SpeciesCounts {
        self.deaths
    }

    /// Admit an animal into the population matching its species.
    pub fn add_animal(&mut self, animal: Animal) {
        self.population_mut(animal.species()).push(animal);
    }

    /// Remove the animals at `indices` (strictly ascending) from one
    /// population and hand them over in index order.
    pub fn take_animals(
        &mut self,
        species: Species,
        indices: &[usize],
    ) -> Result<Vec<Animal>, BiosimError> {
        if indices.is_empty() {
            return Ok(Vec::new());
        }
        let population = self.population_mut(species);
        let mut marked = vec![false; population.len()];
        let mut previous = None;
        for &index in indices {
            if index >= population.len() || previous.is_some_and(|p| p >= index) {
                return Err(BiosimError::Internal(format!(
                    "{species} #{index} is not present in its cell population"
                )));
            }
            marked[index] = true;
            previous = Some(index);
        }

        let mut taken = Vec::with_capacity(indices.len());
        let mut kept = Vec::with_capacity(population.len() - indices.len());
        for (animal, take) in population.drain(..).zip(marked) {
            if take {
                taken.push(animal);
            } else {
                kept.push(animal);
            }
        }
        *population = kept;
        Ok(taken)
    }

    /// Herbivores feed in random order until the fodder runs out.
    pub fn herbivores_eating<R: Rng + ?Sized>(&mut self, params: &ParameterRegistry, rng: &mut R) {
        let herbivore = params.herbivore();
        self.herbivores.shuffle(rng);
        for animal in self.herbivores.iter_mut() {
            if self.fodder <= 0.0 {
                break;
            }
            let portion = herbivore.f.min(self.fodder);
            animal.graze(herbivore, portion);
            self.fodder -= portion;
        }
        self.fodder = self.fodder.max(0.0);
    }

    /// The fittest carnivore hunts first and every carnivore goes after the
    /// weakest herbivores first.
    pub fn carnivores_eating<R: Rng + ?Sized>(&mut self, params: &ParameterRegistry, rng: &mut R) {
        let herbivore = params.herbivore();
        let carnivore = params.carnivore();
        for animal in self.herbivores.iter_mut() {
            animal.update_fitness(herbivore);
        }
        self.herbivores
            .sort_by(|a, b| a.fitness().total_cmp(&b.fitness()));
        for animal in self.carnivores.iter_mut() {
            animal.update_fitness(carnivore);
        }
        self.carnivores
            .sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));

        for hunter in self.carnivores.iter_mut() {
            if self.herbivores.is_empty() {
                break;
            }
            hunter.hunt(&mut self.herbivores, carnivore, herbivore, rng);
        }
    }

    /// Every animal present at the start of the phase gets one chance to
    /// give birth; newborns join the population afterwards.
    pub fn procreation<R: Rng + ?Sized>(
        &mut self,
        species: Species,
        params: &ParameterRegistry,
        rng: &mut R,
    ) -> usize {
        let animal_params = params.animal(species);
        let population = self.population_mut(species);
        let count = population.len();
        let mut newborns = Vec::new();
        for parent in population.iter_mut() {
            if let Some(child_weight) = parent.birth(animal_params, count, rng) {
                newborns.push(Animal::new(species, 0, child_weight));
            }
        }
        let born = newborns.len();
        population.extend(newborns);
        self.newborns.set(species, born);
        born
    }

    pub fn procreation_herbivore<R: Rng + ?Sized>(
        &mut self,
        params: &ParameterRegistry,
        rng: &mut R,
    ) -> usize {
        self.procreation(Species::Herbivore, params, rng)
    }

    pub fn procreation_carnivore<R: Rng + ?Sized>(
        &mut self,
        params: &ParameterRegistry,
        rng: &mut R,
    ) -> usize {
        self.procreation(Species::Carnivore, params, rng)
    }

    /// Animals that want to leave this year, herbivores first. Animals that
    /// already moved this year are skipped.
    pub fn migrating_or_not<R: Rng + ?Sized>(
        &mut self,
        params: &ParameterRegistry,
        rng: &mut R,
    ) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        for species in Species::ALL {
            let animal_params = params.animal(species);
            for (index, animal) in self.population_mut(species).iter_mut().enumerate() {
                if animal.has_migrated() {
                    continue;
                }
                let probability = animal_params.mu * animal.update_fitness(animal_params);
                if probability > rng.uniform() {
                    candidates.push((species, index));
                }
            }
        }
        candidates
    }

    pub fn yearly_ageing_and_weight_loss(&mut self, params: &ParameterRegistry) {
        for species in Species::ALL {
            let animal_params = params.animal(species);
            for animal in self.population_mut(species).iter_mut() {
                animal.ageing();
                animal.weight_loss(animal_params);
            }
        }
    }

    pub fn yearly_death<R: Rng + ?Sized>(&mut self, params: &ParameterRegistry, rng: &mut R) {
        self.deaths = SpeciesCounts::default();
        for species in Species::ALL {
            let animal_params = params.animal(species);
            let population = self.population_mut(species);
            let dead: Vec<bool> = population
                .iter_mut()
                .map(|animal| animal.death(animal_params, rng))
                .collect();
            let died = dead.iter().filter(|&&d| d).count();
            let mut flags = dead.into_iter();
            population.retain(|_| !flags.next().unwrap_or(false));
            self.deaths.set(species, died);
        }
    }

    pub fn reset_migrated_parameter(&mut self) {
        for species in Species::ALL {
            for animal in self.population_mut(species).iter_mut() {
                animal.reset_migrated();
            }
        }
    }

    pub fn fodder_regrowth(&mut self, params: &ParameterRegistry) {
        self.fodder = params.f_max(self.landscape);
    }
}
