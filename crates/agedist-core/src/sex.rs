//! Sex category a table is published for

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Sex category, tagged with a single letter in every output file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Sex {
    /// Both sexes combined (`B`)
    #[cfg_attr(feature = "serde", serde(rename = "B"))]
    Both,
    /// Male (`M`)
    #[cfg_attr(feature = "serde", serde(rename = "M"))]
    Male,
    /// Female (`F`)
    #[cfg_attr(feature = "serde", serde(rename = "F"))]
    Female,
}

impl Sex {
    /// All categories in publication order
    pub const ALL: [Sex; 3] = [Sex::Both, Sex::Male, Sex::Female];

    /// Single-letter tag
    pub fn code(self) -> &'static str {
        match self {
            Sex::Both => "B",
            Sex::Male => "M",
            Sex::Female => "F",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Sex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "B" | "b" => Ok(Sex::Both),
            "M" | "m" => Ok(Sex::Male),
            "F" | "f" => Ok(Sex::Female),
            other => Err(Error::InvalidSex(other.to_string())),
        }
    }
}

/// Accepts exactly what [`FromStr`] accepts
#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Sex {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = <String as serde::Deserialize>::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        for sex in Sex::ALL {
            assert_eq!(sex.code().parse::<Sex>().unwrap(), sex);
            assert_eq!(sex.to_string(), sex.code());
        }
        assert_eq!(" f ".parse::<Sex>().unwrap(), Sex::Female);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!(matches!("X".parse::<Sex>(), Err(Error::InvalidSex(s)) if s == "X"));
        assert!("Both".parse::<Sex>().is_err());
        assert!("".parse::<Sex>().is_err());
    }
}
