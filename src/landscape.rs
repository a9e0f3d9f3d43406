use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BiosimError;

/// Terrain category of a cell. Only the maximum fodder and habitability
/// differ between landscapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Landscape {
    #[serde(rename = "W")]
    Water,
    #[serde(rename = "L")]
    Lowland,
    #[serde(rename = "H")]
    Highland,
    #[serde(rename = "D")]
    Desert,
}

impl Landscape {
    pub const ALL: [Landscape; 4] = [
        Landscape::Water,
        Landscape::Lowland,
        Landscape::Highland,
        Landscape::Desert,
    ];

    pub fn from_code(code: char) -> Result<Self, BiosimError> {
        match code {
            'W' => Ok(Landscape::Water),
            'L' => Ok(Landscape::Lowland),
            'H' => Ok(Landscape::Highland),
            'D' => Ok(Landscape::Desert),
            other => Err(BiosimError::UnknownLandscape(other.to_string())),
        }
    }

    pub fn code(self) -> char {
        match self {
            Landscape::Water => 'W',
            Landscape::Lowland => 'L',
            Landscape::Highland => 'H',
            Landscape::Desert => 'D',
        }
    }

    pub fn is_habitable(self) -> bool {
        !matches!(self, Landscape::Water)
    }

    /// Water and desert never grow fodder.
    pub fn grows_fodder(self) -> bool {
        matches!(self, Landscape::Lowland | Landscape::Highland)
    }
}

impl FromStr for Landscape {
    type Err = BiosimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(code), None) => Landscape::from_code(code),
            _ => Err(BiosimError::UnknownLandscape(s.to_string())),
        }
    }
}

impl fmt::Display for Landscape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Landscape::Water => "Water",
            Landscape::Lowland => "Lowland",
            Landscape::Highland => "Highland",
            Landscape::Desert => "Desert",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for landscape in Landscape::ALL {
            assert_eq!(Landscape::from_code(landscape.code()), Ok(landscape));
        }
    }

    #[test]
    fn only_water_is_uninhabitable() {
        assert!(!Landscape::Water.is_habitable());
        assert!(Landscape::Lowland.is_habitable());
        assert!(Landscape::Highland.is_habitable());
        assert!(Landscape::Desert.is_habitable());
    }

    #[test]
    fn rejects_unknown_codes() {
        assert!(Landscape::from_code('T').is_err());
        assert!("LL".parse::<Landscape>().is_err());
        assert_eq!("H".parse::<Landscape>(), Ok(Landscape::Highland));
    }
}
