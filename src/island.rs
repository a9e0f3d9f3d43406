use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::animal::{Animal, Species};
use crate::cell::{Cell, SpeciesCounts};
use crate::error::BiosimError;
use crate::landscape::Landscape;
use crate::params::ParameterRegistry;

/// One individual in a population specification. A missing weight is drawn
/// from the species' birth distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalSpec {
    pub species: Species,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub weight: Option<f64>,
}

/// Animals to place at a 1-indexed `(row, col)` location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationEntry {
    pub loc: (usize, usize),
    pub pop: Vec<AnimalSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];
}

/// Uniform choice among the four neighbours.
pub fn random_direction<R: Rng + ?Sized>(rng: &mut R) -> Direction {
    Direction::ALL[rng.gen_range(0..Direction::ALL.len())]
}

/// Animal counts per cell, row-major, one matrix per species.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulationGrid {
    pub herbivores: Vec<Vec<usize>>,
    pub carnivores: Vec<Vec<usize>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PropertyLists {
    pub weight: Vec<f64>,
    pub age: Vec<u32>,
    pub fitness: Vec<f64>,
}

/// Per-animal properties across the whole island, grouped by species.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnimalProperties {
    pub herbivores: PropertyLists,
    pub carnivores: PropertyLists,
}

/// The grid of cells and the parameter tables that drive them.
#[derive(Debug, Clone)]
pub struct Island {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
    params: ParameterRegistry,
    year: u64,
}

impl Island {
    pub fn new(map: &str) -> Result<Self, BiosimError> {
        Self::with_parameters(map, ParameterRegistry::new())
    }

    pub fn with_parameters(map: &str, params: ParameterRegistry) -> Result<Self, BiosimError> {
        let grid = parse_map(map)?;
        let rows = grid.len();
        let cols = grid[0].len();
        let cells = grid
            .into_iter()
            .flatten()
            .map(|landscape| Cell::new(landscape, params.f_max(landscape)))
            .collect();
        Ok(Self {
            rows,
            cols,
            cells,
            params,
            year: 0,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of annual cycles completed.
    pub fn year(&self) -> u64 {
        self.year
    }

    pub fn params(&self) -> &ParameterRegistry {
        &self.params
    }

    pub fn set_animal_parameters(
        &mut self,
        species: Species,
        overrides: &BTreeMap<String, f64>,
    ) -> Result<(), BiosimError> {
        self.params.set_animal_parameters(species, overrides)
    }

    /// New fodder capacities apply from the next regrowth on.
    pub fn set_landscape_parameters(
        &mut self,
        landscape: Landscape,
        overrides: &BTreeMap<String, f64>,
    ) -> Result<(), BiosimError> {
        self.params.set_landscape_parameters(landscape, overrides)
    }

    /// Cell at a 1-indexed location.
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.index_of(row, col).map(|index| &self.cells[index])
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    fn index_of(&self, row: usize, col: usize) -> Option<usize> {
        if row == 0 || col == 0 || row > self.rows || col > self.cols {
            return None;
        }
        Some((row - 1) * self.cols + (col - 1))
    }

    fn neighbour(&self, index: usize, direction: Direction) -> Option<usize> {
        let (row, col) = (index / self.cols, index % self.cols);
        let (row, col) = match direction {
            Direction::North => (row.checked_sub(1)?, col),
            Direction::East => (row, col + 1),
            Direction::South => (row + 1, col),
            Direction::West => (row, col.checked_sub(1)?),
        };
        (row < self.rows && col < self.cols).then_some(row * self.cols + col)
    }

    /// Place new individuals. The whole call is validated before anything is
    /// placed. Returns the number of animals added.
    pub fn place_population<R: Rng + ?Sized>(
        &mut self,
        entries: &[PopulationEntry],
        rng: &mut R,
    ) -> Result<usize, BiosimError> {
        let mut targets = Vec::with_capacity(entries.len());
        for entry in entries {
            let (row, col) = entry.loc;
            let placement_error = |reason: String| BiosimError::InvalidPlacement { row, col, reason };
            let index = self.index_of(row, col).ok_or_else(|| {
                placement_error(format!(
                    "outside the {}x{} island",
                    self.rows, self.cols
                ))
            })?;
            let landscape = self.cells[index].landscape();
            if !landscape.is_habitable() {
                return Err(placement_error(format!("{landscape} is uninhabitable")));
            }
            for spec in &entry.pop {
                if let Some(weight) = spec.weight {
                    if !weight.is_finite() || weight < 0.0 {
                        return Err(placement_error(format!(
                            "{} weight {weight} must be a non-negative number",
                            spec.species
                        )));
                    }
                }
            }
            targets.push(index);
        }

        let mut placed = 0;
        for (entry, index) in entries.iter().zip(targets) {
            for spec in &entry.pop {
                let animal = match spec.weight {
                    Some(weight) => Animal::new(spec.species, spec.age, weight),
                    None => Animal::with_random_weight(
                        spec.species,
                        spec.age,
                        self.params.animal(spec.species),
                        rng,
                    ),
                };
                self.cells[index].add_animal(animal);
                placed += 1;
            }
        }
        Ok(placed)
    }

    pub fn migration<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<usize, BiosimError> {
        self.migration_with(rng, random_direction::<R>)
    }

    /// Island-wide migration with a caller-supplied direction choice. Each
    /// candidate gets exactly one direction; a Water neighbour means it stays
    /// put this year. Moved animals are flagged and not reconsidered in the
    /// cells they arrive in. Returns the number of animals moved.
    pub fn migration_with<R, F>(&mut self, rng: &mut R, mut choose: F) -> Result<usize, BiosimError>
    where
        R: Rng + ?Sized,
        F: FnMut(&mut R) -> Direction,
    {
        let mut moved = 0;
        for index in 0..self.cells.len() {
            let candidates = self.cells[index].migrating_or_not(&self.params, rng);
            if candidates.is_empty() {
                continue;
            }

            let mut herbivore_moves = Vec::new();
            let mut carnivore_moves = Vec::new();
            for (species, animal_index) in candidates {
                let direction = choose(&mut *rng);
                let Some(destination) = self.neighbour(index, direction) else {
                    continue;
                };
                if !self.cells[destination].is_habitable() {
                    continue;
                }
                match species {
                    Species::Herbivore => herbivore_moves.push((animal_index, destination)),
                    Species::Carnivore => carnivore_moves.push((animal_index, destination)),
                }
            }

            for (species, moves) in [
                (Species::Herbivore, herbivore_moves),
                (Species::Carnivore, carnivore_moves),
            ] {
                let indices: Vec<usize> = moves.iter().map(|&(animal, _)| animal).collect();
                let emigrants = self.cells[index].take_animals(species, &indices)?;
                for (mut animal, (_, destination)) in emigrants.into_iter().zip(moves) {
                    animal.mark_migrated();
                    self.cells[destination].add_animal(animal);
                    moved += 1;
                }
            }
        }
        Ok(moved)
    }

    pub fn annual_cycle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), BiosimError> {
        self.annual_cycle_with(rng, random_direction::<R>)
    }

    /// One simulated year: feeding and breeding, then migration, then
    /// ageing, death and regrowth.
    pub fn annual_cycle_with<R, F>(&mut self, rng: &mut R, choose: F) -> Result<(), BiosimError>
    where
        R: Rng + ?Sized,
        F: FnMut(&mut R) -> Direction,
    {
        let params = &self.params;
        for cell in self.cells.iter_mut() {
            cell.herbivores_eating(params, rng);
            cell.carnivores_eating(params, rng);
            cell.procreation_herbivore(params, rng);
            cell.procreation_carnivore(params, rng);
        }

        let moved = self.migration_with(rng, choose)?;

        let params = &self.params;
        for cell in self.cells.iter_mut() {
            cell.yearly_ageing_and_weight_loss(params);
            cell.yearly_death(params, rng);
            cell.reset_migrated_parameter();
            cell.fodder_regrowth(params);
        }

        self.year += 1;
        debug!(year = self.year, migrated = moved, "annual cycle complete");
        Ok(())
    }

    pub fn num_animals_per_species(&self) -> SpeciesCounts {
        let mut counts = SpeciesCounts::default();
        for cell in &self.cells {
            counts += cell.counts();
        }
        counts
    }

    pub fn num_animals(&self) -> usize {
        self.num_animals_per_species().total()
    }

    pub fn animal_distribution(&self, species: Species) -> Vec<Vec<usize>> {
        self.cells
            .chunks(self.cols)
            .map(|row| row.iter().map(|cell| cell.population(species).len()).collect())
            .collect()
    }

    pub fn population_grid(&self) -> PopulationGrid {
        PopulationGrid {
            herbivores: self.animal_distribution(Species::Herbivore),
            carnivores: self.animal_distribution(Species::Carnivore),
        }
    }

    /// Weight, age and fitness of every animal. Fitness is evaluated from
    /// the current state without touching the cached values.
    pub fn animal_properties(&self) -> AnimalProperties {
        let mut properties = AnimalProperties::default();
        for cell in &self.cells {
            for animal in cell.animals() {
                let lists = match animal.species() {
                    Species::Herbivore => &mut properties.herbivores,
                    Species::Carnivore => &mut properties.carnivores,
                };
                lists.weight.push(animal.weight());
                lists.age.push(animal.age());
                lists
                    .fitness
                    .push(animal.compute_fitness(self.params.animal(animal.species())));
            }
        }
        properties
    }

    /// Births recorded during the last completed year.
    pub fn newborns(&self) -> SpeciesCounts {
        let mut counts = SpeciesCounts::default();
        for cell in &self.cells {
            counts += cell.newborns();
        }
        counts
    }

    /// Deaths recorded during the last completed year. Animals eaten by
    /// carnivores are not counted.
    pub fn deaths(&self) -> SpeciesCounts {
        let mut counts = SpeciesCounts::default();
        for cell in &self.cells {
            counts += cell.deaths();
        }
        counts
    }

    pub fn landscape_map(&self) -> Vec<Vec<Landscape>> {
        self.cells
            .chunks(self.cols)
            .map(|row| row.iter().map(Cell::landscape).collect())
            .collect()
    }

    /// The map in its textual form, one row per line.
    pub fn map_string(&self) -> String {
        self.landscape_map()
            .iter()
            .map(|row| row.iter().map(|l| l.code()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn parse_map(map: &str) -> Result<Vec<Vec<Landscape>>, BiosimError> {
    let lines: Vec<&str> = map.lines().map(str::trim).collect();
    let first = lines.iter().position(|line| !line.is_empty());
    let last = lines.iter().rposition(|line| !line.is_empty());
    let (Some(first), Some(last)) = (first, last) else {
        return Err(BiosimError::MalformedMap("map is empty".into()));
    };

    let mut grid = Vec::with_capacity(last - first + 1);
    for line in &lines[first..=last] {
        if line.is_empty() {
            return Err(BiosimError::MalformedMap(
                "blank line inside the map".into(),
            ));
        }
        let row = line
            .chars()
            .map(Landscape::from_code)
            .collect::<Result<Vec<_>, _>>()?;
        grid.push(row);
    }

    let width = grid[0].len();
    if grid.iter().any(|row| row.len() != width) {
        return Err(BiosimError::MalformedMap(
            "all rows must have the same length".into(),
        ));
    }

    let height = grid.len();
    for (r, row) in grid.iter().enumerate() {
        for (c, landscape) in row.iter().enumerate() {
            let on_edge = r == 0 || r == height - 1 || c == 0 || c == width - 1;
            if on_edge && *landscape != Landscape::Water {
                return Err(BiosimError::MalformedMap(format!(
                    "edge cell ({}, {}) is {landscape}, the island must be surrounded by water",
                    r + 1,
                    c + 1
                )));
            }
        }
    }
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SimRng;

    const SMALL_MAP: &str = "\
        WWWWW
        WLHDW
        WWWWW";

    fn herbivores(n: usize, age: u32, weight: f64) -> Vec<AnimalSpec> {
        (0..n)
            .map(|_| AnimalSpec {
                species: Species::Herbivore,
                age,
                weight: Some(weight),
            })
            .collect()
    }

    fn mobile_params() -> ParameterRegistry {
        let mut params = ParameterRegistry::new();
        let overrides: BTreeMap<String, f64> = [("mu".to_string(), 1.0)].into_iter().collect();
        params
            .set_animal_parameters(Species::Herbivore, &overrides)
            .unwrap();
        params
    }

    #[test]
    fn builds_grid_from_indented_map() {
        let island = Island::new(SMALL_MAP).unwrap();
        assert_eq!((island.rows(), island.cols()), (3, 5));
        assert_eq!(island.cell(2, 2).unwrap().landscape(), Landscape::Lowland);
        assert_eq!(island.cell(2, 3).unwrap().fodder(), 300.0);
        assert_eq!(island.map_string(), "WWWWW\nWLHDW\nWWWWW");
    }

    #[test]
    fn rejects_unknown_landscape_code() {
        let err = Island::new("WWWW\nWTDW\nWHLW\nWWWW").unwrap_err();
        assert!(matches!(err, BiosimError::UnknownLandscape(_)));
    }

    #[test]
    fn rejects_non_water_edges() {
        for map in ["WWWWW\nWDDDD\nWLLHW\nWWWWW", "WWLWW\nWDDDW\nWLLHW\nWWWWW"] {
            assert!(matches!(
                Island::new(map),
                Err(BiosimError::MalformedMap(_))
            ));
        }
    }

    #[test]
    fn rejects_ragged_rows() {
        assert!(matches!(
            Island::new("WWWWW\nWDDDW\nWLLHW\nWWWWWW"),
            Err(BiosimError::MalformedMap(_))
        ));
    }

    #[test]
    fn rejects_empty_map() {
        assert!(Island::new("   \n  ").is_err());
    }

    #[test]
    fn places_population_at_one_indexed_location() {
        let mut island = Island::new(SMALL_MAP).unwrap();
        let mut rng = SimRng::new(1);
        let mut pop = herbivores(3, 5, 20.0);
        pop.push(AnimalSpec {
            species: Species::Carnivore,
            age: 2,
            weight: None,
        });
        let placed = island
            .place_population(&[PopulationEntry { loc: (2, 2), pop }], &mut rng)
            .unwrap();
        assert_eq!(placed, 4);
        let cell = island.cell(2, 2).unwrap();
        assert_eq!(cell.counts(), SpeciesCounts { herbivores: 3, carnivores: 1 });
        assert!(cell.carnivores()[0].weight() > 0.0);
    }

    #[test]
    fn failed_placement_places_nothing() {
        let mut island = Island::new(SMALL_MAP).unwrap();
        let mut rng = SimRng::new(1);
        let entries = [
            PopulationEntry {
                loc: (2, 2),
                pop: herbivores(3, 5, 20.0),
            },
            PopulationEntry {
                loc: (1, 1),
                pop: herbivores(3, 5, 20.0),
            },
        ];
        let err = island.place_population(&entries, &mut rng).unwrap_err();
        assert!(matches!(err, BiosimError::InvalidPlacement { row: 1, col: 1, .. }));
        assert_eq!(island.num_animals(), 0);

        let out_of_bounds = [PopulationEntry {
            loc: (7, 2),
            pop: herbivores(1, 5, 20.0),
        }];
        assert!(island.place_population(&out_of_bounds, &mut rng).is_err());

        let negative = [PopulationEntry {
            loc: (2, 2),
            pop: herbivores(1, 5, -3.0),
        }];
        assert!(island.place_population(&negative, &mut rng).is_err());
        assert_eq!(island.num_animals(), 0);
    }

    #[test]
    fn water_neighbour_blocks_migration() {
        let mut island = Island::with_parameters("WWWW\nWLLW\nWWWW", mobile_params()).unwrap();
        let mut rng = SimRng::new(4);
        island
            .place_population(
                &[PopulationEntry {
                    loc: (2, 2),
                    pop: herbivores(50, 5, 50.0),
                }],
                &mut rng,
            )
            .unwrap();

        let moved = island
            .migration_with(&mut rng, |_| Direction::West)
            .unwrap();

        assert_eq!(moved, 0);
        assert_eq!(island.animal_distribution(Species::Herbivore)[1], vec![0, 50, 0, 0]);
    }

    #[test]
    fn migration_is_a_single_hop() {
        let mut island =
            Island::with_parameters("WWWWWW\nWLLLLW\nWWWWWW", mobile_params()).unwrap();
        let mut rng = SimRng::new(4);
        island
            .place_population(
                &[PopulationEntry {
                    loc: (2, 2),
                    pop: herbivores(40, 5, 50.0),
                }],
                &mut rng,
            )
            .unwrap();

        let moved = island.migration_with(&mut rng, |_| Direction::East).unwrap();

        let row = &island.animal_distribution(Species::Herbivore)[1];
        assert!(moved > 0);
        assert_eq!(row[2], moved);
        assert_eq!(row[1] + row[2], 40);
        assert_eq!(row[3], 0);
        assert_eq!(row[4], 0);
        let arrived = island.cell(2, 3).unwrap().herbivores();
        assert!(arrived.iter().all(Animal::has_migrated));
    }

    #[test]
    fn annual_cycle_resets_migration_flags_and_counts_years() {
        let mut island = Island::with_parameters(SMALL_MAP, mobile_params()).unwrap();
        let mut rng = SimRng::new(4);
        island
            .place_population(
                &[PopulationEntry {
                    loc: (2, 2),
                    pop: herbivores(20, 5, 30.0),
                }],
                &mut rng,
            )
            .unwrap();
        island.annual_cycle(&mut rng).unwrap();
        assert_eq!(island.year(), 1);
        assert!(island
            .cells()
            .iter()
            .flat_map(|cell| cell.animals())
            .all(|animal| !animal.has_migrated()));
        assert_eq!(island.cell(2, 2).unwrap().fodder(), 800.0);
    }

    #[test]
    fn property_lists_cover_every_animal() {
        let mut island = Island::new(SMALL_MAP).unwrap();
        let mut rng = SimRng::new(4);
        island
            .place_population(
                &[
                    PopulationEntry {
                        loc: (2, 2),
                        pop: herbivores(4, 5, 20.0),
                    },
                    PopulationEntry {
                        loc: (2, 3),
                        pop: herbivores(2, 7, 12.0),
                    },
                ],
                &mut rng,
            )
            .unwrap();
        let properties = island.animal_properties();
        assert_eq!(properties.herbivores.weight.len(), 6);
        assert_eq!(properties.herbivores.age.iter().filter(|&&a| a == 7).count(), 2);
        assert!(properties.carnivores.fitness.is_empty());
        assert!(properties
            .herbivores
            .fitness
            .iter()
            .all(|f| (0.0..=1.0).contains(f)));
        assert_eq!(
            island.population_grid().herbivores,
            vec![vec![0; 5], vec![0, 4, 2, 0, 0], vec![0; 5]]
        );
    }
}
