use std::collections::BTreeMap;

use biosim::{
    island::{AnimalSpec, Direction, PopulationEntry},
    Animal, AnimalParams, Island, SimRng, Species,
};

fn herbivores(n: usize, age: u32, weight: f64) -> Vec<AnimalSpec> {
    (0..n)
        .map(|_| AnimalSpec {
            species: Species::Herbivore,
            age,
            weight: Some(weight),
        })
        .collect()
}

fn carnivores(n: usize, age: u32, weight: f64) -> Vec<AnimalSpec> {
    (0..n)
        .map(|_| AnimalSpec {
            species: Species::Carnivore,
            age,
            weight: Some(weight),
        })
        .collect()
}

fn overrides(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn seeded_island(map: &str, entries: &[PopulationEntry], seed: u64) -> (Island, SimRng) {
    let mut rng = SimRng::new(seed);
    let mut island = Island::new(map).expect("map is valid");
    island
        .place_population(entries, &mut rng)
        .expect("population is valid");
    (island, rng)
}

#[test]
fn single_lowland_reaches_bounded_population() {
    let entries = [PopulationEntry {
        loc: (2, 2),
        pop: herbivores(50, 5, 20.0),
    }];
    let (mut island, mut rng) = seeded_island("WWW\nWLW\nWWW", &entries, 2024);

    let mut history = Vec::new();
    for _ in 0..200 {
        island.annual_cycle(&mut rng).unwrap();
        history.push(island.num_animals_per_species().herbivores);
    }

    assert_eq!(island.year(), 200);
    assert_eq!(island.num_animals_per_species().carnivores, 0);
    for &count in &history[150..] {
        assert!(count > 0, "population died out");
        assert!(count < 800, "population {count} exceeds what the fodder supports");
    }
}

#[test]
fn default_herbivore_fitness_is_the_sigmoid_product() {
    let params = AnimalParams::herbivore();
    let mut herbivore = Animal::herbivore(5, 5.0);
    let expected = 1.0 / (1.0 + (params.phi_age * (5.0 - params.a_half)).exp())
        * (1.0 / (1.0 + (-params.phi_weight * (5.0 - params.w_half)).exp()));
    assert_eq!(herbivore.update_fitness(&params), expected);
}

#[test]
fn forced_water_neighbour_means_no_migration() {
    let mut rng = SimRng::new(99);
    let mut island = Island::new("WWWW\nWLLW\nWWWW").unwrap();
    island
        .set_animal_parameters(Species::Herbivore, &overrides(&[("mu", 1.0)]))
        .unwrap();
    island
        .place_population(
            &[PopulationEntry {
                loc: (2, 2),
                pop: herbivores(60, 5, 40.0),
            }],
            &mut rng,
        )
        .unwrap();

    island
        .annual_cycle_with(&mut rng, |_| Direction::West)
        .unwrap();

    assert_eq!(island.cell(2, 3).unwrap().herbivores().len(), 0);
    assert_eq!(
        island.cell(2, 2).unwrap().herbivores().len(),
        island.num_animals()
    );
}

#[test]
fn same_seed_reproduces_the_run() {
    let entries = [
        PopulationEntry {
            loc: (2, 2),
            pop: herbivores(40, 5, 20.0),
        },
        PopulationEntry {
            loc: (3, 3),
            pop: carnivores(10, 5, 20.0),
        },
    ];
    let map = "WWWWW\nWLLHW\nWLLDW\nWWWWW";
    let (mut first, mut rng_a) = seeded_island(map, &entries, 7);
    let (mut second, mut rng_b) = seeded_island(map, &entries, 7);

    for _ in 0..30 {
        first.annual_cycle(&mut rng_a).unwrap();
        second.annual_cycle(&mut rng_b).unwrap();
        assert_eq!(first.population_grid(), second.population_grid());
    }
    assert_eq!(first.animal_properties(), second.animal_properties());
    assert_eq!(first.newborns(), second.newborns());
    assert_eq!(first.deaths(), second.deaths());
}

#[test]
fn parameter_updates_reach_existing_animals() {
    let entries = [PopulationEntry {
        loc: (2, 2),
        pop: herbivores(30, 5, 20.0),
    }];
    let (mut island, mut rng) = seeded_island("WWW\nWLW\nWWW", &entries, 11);
    island.annual_cycle(&mut rng).unwrap();
    assert!(island.num_animals() > 0);

    island
        .set_animal_parameters(Species::Herbivore, &overrides(&[("eta", 1.0)]))
        .unwrap();
    island.annual_cycle(&mut rng).unwrap();

    assert_eq!(island.num_animals(), 0);
    assert!(island.deaths().herbivores > 0);
}

#[test]
fn predation_never_adds_biomass_to_a_cell() {
    let entries = [PopulationEntry {
        loc: (2, 2),
        pop: herbivores(30, 10, 15.0)
            .into_iter()
            .chain(carnivores(6, 4, 30.0))
            .collect(),
    }];
    let (mut island, mut rng) = seeded_island("WWW\nWDW\nWWW", &entries, 5);
    island
        .set_animal_parameters(Species::Herbivore, &overrides(&[("gamma", 0.0)]))
        .unwrap();
    island
        .set_animal_parameters(Species::Carnivore, &overrides(&[("gamma", 0.0)]))
        .unwrap();

    let biomass = |island: &Island| {
        island
            .cells()
            .iter()
            .flat_map(|cell| cell.animals())
            .map(Animal::weight)
            .sum::<f64>()
    };
    let before = biomass(&island);
    let herbivores_before = island.num_animals_per_species().herbivores;

    island.annual_cycle(&mut rng).unwrap();

    assert!(biomass(&island) <= before + 1e-9);
    assert!(island.num_animals_per_species().herbivores <= herbivores_before);
}

#[test]
fn invalid_configuration_leaves_island_unchanged() {
    let mut island = Island::new("WWW\nWHW\nWWW").unwrap();
    let before = island.params().clone();

    assert!(island
        .set_animal_parameters(Species::Herbivore, &overrides(&[("zeta", 2.0), ("bogus", 1.0)]))
        .is_err());
    assert!(island
        .set_animal_parameters(Species::Carnivore, &overrides(&[("DeltaPhiMax", 0.0)]))
        .is_err());
    assert!(island
        .set_landscape_parameters(biosim::Landscape::Water, &overrides(&[("f_max", 5.0)]))
        .is_err());

    assert_eq!(island.params(), &before);
}
