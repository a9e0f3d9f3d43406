//! Parameter tables for the two species and the four landscapes.
//!
//! The tables live in a [`ParameterRegistry`] owned by the island. Every
//! phase reads the registry at the time it runs, so an update applies to all
//! existing and future individuals of a species from the next phase on.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::animal::Species;
use crate::error::BiosimError;
use crate::landscape::Landscape;

/// Biological constants of one species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalParams {
    pub w_birth: f64,
    pub sigma_birth: f64,
    pub beta: f64,
    pub eta: f64,
    pub a_half: f64,
    pub phi_age: f64,
    pub w_half: f64,
    pub phi_weight: f64,
    pub mu: f64,
    pub gamma: f64,
    pub zeta: f64,
    pub xi: f64,
    pub omega: f64,
    #[serde(rename = "F")]
    pub f: f64,
    /// Predation scale; only carnivores carry one.
    #[serde(rename = "DeltaPhiMax", default, skip_serializing_if = "Option::is_none")]
    pub delta_phi_max: Option<f64>,
}

impl AnimalParams {
    pub fn herbivore() -> Self {
        Self {
            w_birth: 8.0,
            sigma_birth: 1.5,
            beta: 0.9,
            eta: 0.05,
            a_half: 40.0,
            phi_age: 0.6,
            w_half: 10.0,
            phi_weight: 0.1,
            mu: 0.25,
            gamma: 0.2,
            zeta: 3.5,
            xi: 1.2,
            omega: 0.4,
            f: 10.0,
            delta_phi_max: None,
        }
    }

    pub fn carnivore() -> Self {
        Self {
            w_birth: 6.0,
            sigma_birth: 1.0,
            beta: 0.75,
            eta: 0.125,
            a_half: 40.0,
            phi_age: 0.3,
            w_half: 4.0,
            phi_weight: 0.4,
            mu: 0.4,
            gamma: 0.8,
            zeta: 3.5,
            xi: 1.1,
            omega: 0.8,
            f: 50.0,
            delta_phi_max: Some(10.0),
        }
    }

    pub fn defaults_for(species: Species) -> Self {
        match species {
            Species::Herbivore => Self::herbivore(),
            Species::Carnivore => Self::carnivore(),
        }
    }

    /// Minimum weight a mother must carry before she can give birth.
    pub fn birth_reserve(&self) -> f64 {
        self.zeta * (self.w_birth + self.sigma_birth)
    }

    /// Validate every override first and apply them only if all pass.
    pub fn apply(
        &mut self,
        species: Species,
        overrides: &BTreeMap<String, f64>,
    ) -> Result<(), BiosimError> {
        let mut updated = self.clone();
        for (key, &value) in overrides {
            updated.set(species, key, value)?;
        }
        *self = updated;
        Ok(())
    }

    fn set(&mut self, species: Species, key: &str, value: f64) -> Result<(), BiosimError> {
        let slot = match (key, species) {
            ("w_birth", _) => &mut self.w_birth,
            ("sigma_birth", _) => &mut self.sigma_birth,
            ("beta", _) => &mut self.beta,
            ("eta", _) => &mut self.eta,
            ("a_half", _) => &mut self.a_half,
            ("phi_age", _) => &mut self.phi_age,
            ("w_half", _) => &mut self.w_half,
            ("phi_weight", _) => &mut self.phi_weight,
            ("mu", _) => &mut self.mu,
            ("gamma", _) => &mut self.gamma,
            ("zeta", _) => &mut self.zeta,
            ("xi", _) => &mut self.xi,
            ("omega", _) => &mut self.omega,
            ("F", _) => &mut self.f,
            ("DeltaPhiMax", Species::Carnivore) => {
                check_value(key, value)?;
                if value <= 0.0 {
                    return Err(invalid(key, value, "must be strictly positive"));
                }
                self.delta_phi_max = Some(value);
                return Ok(());
            }
            _ => return Err(BiosimError::unknown_animal_key(species, key)),
        };
        check_value(key, value)?;
        if key == "eta" && value > 1.0 {
            return Err(invalid(key, value, "can not be higher than 1"));
        }
        *slot = value;
        Ok(())
    }
}

/// Fodder capacity of one landscape type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandscapeParams {
    pub f_max: f64,
}

impl LandscapeParams {
    pub fn defaults_for(landscape: Landscape) -> Self {
        let f_max = match landscape {
            Landscape::Lowland => 800.0,
            Landscape::Highland => 300.0,
            Landscape::Water | Landscape::Desert => 0.0,
        };
        Self { f_max }
    }

    pub fn apply(
        &mut self,
        landscape: Landscape,
        overrides: &BTreeMap<String, f64>,
    ) -> Result<(), BiosimError> {
        let mut updated = *self;
        for (key, &value) in overrides {
            if key != "f_max" {
                return Err(BiosimError::unknown_landscape_key(landscape, key));
            }
            check_value(key, value)?;
            if !landscape.grows_fodder() && value != 0.0 {
                return Err(invalid(key, value, "water and desert grow no fodder"));
            }
            updated.f_max = value;
        }
        *self = updated;
        Ok(())
    }
}

/// Current parameter tables for both species and all landscapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRegistry {
    herbivore: AnimalParams,
    carnivore: AnimalParams,
    landscapes: BTreeMap<Landscape, LandscapeParams>,
}

impl ParameterRegistry {
    pub fn new() -> Self {
        Self {
            herbivore: AnimalParams::herbivore(),
            carnivore: AnimalParams::carnivore(),
            landscapes: Landscape::ALL
                .iter()
                .map(|&l| (l, LandscapeParams::defaults_for(l)))
                .collect(),
        }
    }

    pub fn animal(&self, species: Species) -> &AnimalParams {
        match species {
            Species::Herbivore => &self.herbivore,
            Species::Carnivore => &self.carnivore,
        }
    }

    pub fn herbivore(&self) -> &AnimalParams {
        &self.herbivore
    }

    pub fn carnivore(&self) -> &AnimalParams {
        &self.carnivore
    }

    pub fn f_max(&self, landscape: Landscape) -> f64 {
        self.landscapes
            .get(&landscape)
            .map(|p| p.f_max)
            .unwrap_or_else(|| LandscapeParams::defaults_for(landscape).f_max)
    }

    pub fn set_animal_parameters(
        &mut self,
        species: Species,
        overrides: &BTreeMap<String, f64>,
    ) -> Result<(), BiosimError> {
        match species {
            Species::Herbivore => self.herbivore.apply(species, overrides),
            Species::Carnivore => self.carnivore.apply(species, overrides),
        }
    }

    pub fn set_landscape_parameters(
        &mut self,
        landscape: Landscape,
        overrides: &BTreeMap<String, f64>,
    ) -> Result<(), BiosimError> {
        self.landscapes
            .entry(landscape)
            .or_insert_with(|| LandscapeParams::defaults_for(landscape))
            .apply(landscape, overrides)
    }
}

impl Default for ParameterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn check_value(key: &str, value: f64) -> Result<(), BiosimError> {
    if !value.is_finite() {
        return Err(invalid(key, value, "must be a finite number"));
    }
    if value < 0.0 {
        return Err(invalid(key, value, "must be non-negative"));
    }
    Ok(())
}

fn invalid(key: &str, value: f64, reason: &'static str) -> BiosimError {
    BiosimError::InvalidParameter {
        key: key.to_string(),
        value,
        reason,
    }
}
