//! Percent values
//!
//! Both chapter thresholds and progress reports are whole percentages
//! in `0..=100`. Parsing happens once at the edge so the store never sees
//! an out-of-range value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PercentError {
    #[error("Percent must be between 0 and 100, got {0}")]
    OutOfRange(i64),

    #[error("Invalid percent: '{0}'")]
    NotANumber(String),
}

/// A whole percentage between 0 and 100 inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Percent(u8);

impl Percent {
    pub const ZERO: Percent = Percent(0);
    pub const FULL: Percent = Percent(100);

    /// Creates a percent, rejecting values outside `0..=100`
    pub fn new(value: i64) -> Result<Self, PercentError> {
        if (0..=100).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(PercentError::OutOfRange(value))
        }
    }

    /// Returns the raw value
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Percent {
    type Error = PercentError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percent> for u8 {
    fn from(percent: Percent) -> Self {
        percent.0
    }
}

impl FromStr for Percent {
    type Err = PercentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|_| PercentError::NotANumber(s.to_string()))?;
        Self::new(value)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn bounds_are_inclusive() {
        assert_eq!(Percent::new(0), Ok(Percent::ZERO));
        assert_eq!(Percent::new(100), Ok(Percent::FULL));
        assert_eq!(Percent::new(101), Err(PercentError::OutOfRange(101)));
        assert_eq!(Percent::new(-1), Err(PercentError::OutOfRange(-1)));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(
            "eighty".parse::<Percent>(),
            Err(PercentError::NotANumber("eighty".to_string()))
        );
        assert_eq!("".parse::<Percent>(), Err(PercentError::NotANumber(String::new())));
        assert!("12.5".parse::<Percent>().is_err());
    }

    #[test]
    fn serde_uses_plain_number() {
        let json = serde_json::to_string(&Percent::new(42).unwrap()).unwrap();
        assert_eq!(json, "42");

        let back: Percent = serde_json::from_str("42").unwrap();
        assert_eq!(back.value(), 42);
        assert!(serde_json::from_str::<Percent>("142").is_err());
    }

    proptest! {
        #[test]
        fn parse_accepts_exactly_the_valid_range(n in -1000i64..1000) {
            let parsed = n.to_string().parse::<Percent>();
            prop_assert_eq!(parsed.is_ok(), (0..=100).contains(&n));
            if let Ok(p) = parsed {
                prop_assert_eq!(i64::from(p.value()), n);
            }
        }
    }
}
