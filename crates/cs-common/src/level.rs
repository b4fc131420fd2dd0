//! The 1–10 observation scale used for occupancy and line wait.

use schemars::{json_schema, JsonSchema, Schema, SchemaGenerator};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

use crate::error::Error;

/// A validated occupancy or line-wait level in `1..=10`.
///
/// There is no way to hold an out-of-range `Level`: construction and
/// deserialization both go through [`Level::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Level(u8);

impl Level {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    /// Validate a raw level for the named field.
    pub fn new(field: &'static str, value: i64) -> Result<Self, Error> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Level(value as u8))
        } else {
            Err(Error::InvalidLevel { field, value })
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Absolute distance to a displayed value.
    pub fn deviation_from(self, displayed: u8) -> u8 {
        self.0.abs_diff(displayed)
    }
}

impl TryFrom<u8> for Level {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Level::new("level", value as i64)
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.0
    }
}

impl From<Level> for f64 {
    fn from(level: Level) -> Self {
        level.0 as f64
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl JsonSchema for Level {
    fn schema_name() -> Cow<'static, str> {
        "Level".into()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "integer",
            "minimum": Level::MIN,
            "maximum": Level::MAX
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_accepted() {
        assert_eq!(Level::new("occupancy", 1).unwrap().get(), 1);
        assert_eq!(Level::new("occupancy", 10).unwrap().get(), 10);
    }

    #[test]
    fn test_out_of_range_rejected() {
        for bad in [-1, 0, 11, 255, 1000] {
            match Level::new("line_wait", bad) {
                Err(Error::InvalidLevel { field, value }) => {
                    assert_eq!(field, "line_wait");
                    assert_eq!(value, bad);
                }
                other => panic!("expected InvalidLevel for {bad}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_deviation() {
        let level = Level::new("occupancy", 8).unwrap();
        assert_eq!(level.deviation_from(5), 3);
        assert_eq!(level.deviation_from(10), 2);
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Level = serde_json::from_str("7").unwrap();
        assert_eq!(ok.get(), 7);
        assert!(serde_json::from_str::<Level>("0").is_err());
        assert!(serde_json::from_str::<Level>("11").is_err());
    }
}
