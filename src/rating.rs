//! Star ratings
//!
//! Integer 1–5 ratings, validated at the type boundary. Persisted data with
//! a rating outside that range fails deserialization, which the stores treat
//! as structurally invalid input.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The smallest representable rating.
pub const MIN_STARS: u8 = 1;

/// The largest representable rating.
pub const MAX_STARS: u8 = 5;

/// Error for rating values outside 1–5.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("star rating {0} is out of range ({MIN_STARS}-{MAX_STARS})")]
pub struct StarsOutOfRange(pub u8);

/// A star rating between 1 and 5 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Stars(u8);

impl Stars {
    /// The rating as a plain integer.
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Stars {
    type Error = StarsOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (MIN_STARS..=MAX_STARS).contains(&value) {
            Ok(Stars(value))
        } else {
            Err(StarsOutOfRange(value))
        }
    }
}

impl From<Stars> for u8 {
    fn from(stars: Stars) -> Self {
        stars.0
    }
}

impl fmt::Display for Stars {
    /// Renders filled stars followed by empty ones, e.g. `★★★★☆`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.0 {
            f.write_str("★")?;
        }

        for _ in self.0..MAX_STARS {
            f.write_str("☆")?;
        }

        Ok(())
    }
}
