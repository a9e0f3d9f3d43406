use thiserror::Error;

use crate::animal::Species;
use crate::landscape::Landscape;

/// Validation and invariant failures raised by the simulation core.
///
/// Every variant is a synchronous failure: the operation that produced it
/// leaves the island, its cells and the parameter registry untouched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BiosimError {
    #[error("'{key}' is not a valid parameter for {owner}")]
    UnknownParameter { owner: String, key: String },

    #[error("invalid value {value} for parameter '{key}': {reason}")]
    InvalidParameter {
        key: String,
        value: f64,
        reason: &'static str,
    },

    #[error("unknown species '{0}', expected 'Herbivore' or 'Carnivore'")]
    UnknownSpecies(String),

    #[error("unknown landscape code '{0}', expected one of W, L, H, D")]
    UnknownLandscape(String),

    #[error("malformed island map: {0}")]
    MalformedMap(String),

    #[error("invalid placement at ({row}, {col}): {reason}")]
    InvalidPlacement {
        row: usize,
        col: usize,
        reason: String,
    },

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl BiosimError {
    pub(crate) fn unknown_animal_key(species: Species, key: &str) -> Self {
        BiosimError::UnknownParameter {
            owner: species.to_string(),
            key: key.to_string(),
        }
    }

    pub(crate) fn unknown_landscape_key(landscape: Landscape, key: &str) -> Self {
        BiosimError::UnknownParameter {
            owner: landscape.to_string(),
            key: key.to_string(),
        }
    }
}
