pub mod animal;
pub mod cell;
pub mod engine;
pub mod error;
pub mod island;
pub mod landscape;
pub mod params;
pub mod rng;
pub mod scenario;
pub mod snapshot;

pub use animal::{Animal, Species};
pub use cell::{Cell, SpeciesCounts};
pub use engine::{Engine, EngineBuilder, EngineSettings, YearSummary};
pub use error::BiosimError;
pub use island::{Island, PopulationEntry};
pub use landscape::Landscape;
pub use params::{AnimalParams, ParameterRegistry};
pub use rng::SimRng;
pub use scenario::{Scenario, ScenarioLoader};
