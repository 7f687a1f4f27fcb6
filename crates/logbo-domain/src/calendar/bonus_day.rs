use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::shared::DomainError;

/// Calendar date identifying one bonus window, persisted as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BonusDay(NaiveDate);

impl BonusDay {
    pub const FORMAT: &'static str = "%Y-%m-%d";

    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn parse(value: &str) -> Result<Self, DomainError> {
        NaiveDate::parse_from_str(value.trim(), Self::FORMAT)
            .map(Self)
            .map_err(|e| DomainError::InvalidInput(format!("Invalid bonus day '{}': {}", value, e)))
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Whole calendar days from `earlier` to `self`.
    ///
    /// Computed on the dates themselves (midnight anchored), so a one-day step
    /// is always 1 no matter how many wall-clock hours separated the claims.
    pub fn days_since(&self, earlier: BonusDay) -> i64 {
        self.0.signed_duration_since(earlier.0).num_days()
    }

    pub fn succ(&self) -> Option<BonusDay> {
        self.0.succ_opt().map(Self)
    }
}

impl fmt::Display for BonusDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

impl FromStr for BonusDay {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BonusDay {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BonusDay> for String {
    fn from(day: BonusDay) -> Self {
        day.to_string()
    }
}
