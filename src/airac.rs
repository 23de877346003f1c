use std::{fmt::Display, str::FromStr};

use chrono::{Datelike as _, NaiveDate, TimeDelta, Utc};
use once_cell::sync::Lazy;

pub const CYCLE_DAYS: i64 = 28;
pub const NATS_EAIP_BASE: &str = "https://www.aurora.nats.co.uk/htmlAIP/Publications/";

/// Effective date of cycle 1901, the first one after the last change to
/// the cycle schedule.
static EPOCH: Lazy<NaiveDate> =
    Lazy::new(|| NaiveDate::from_ymd_opt(2019, 1, 3).expect("valid AIRAC epoch"));

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Airac {
    effective: NaiveDate,
}

impl Airac {
    pub fn cycle_containing(date: NaiveDate) -> Self {
        let cycles = (date - *EPOCH).num_days().div_euclid(CYCLE_DAYS);
        Self {
            effective: *EPOCH + TimeDelta::days(cycles * CYCLE_DAYS),
        }
    }

    pub fn current() -> Self {
        Self::cycle_containing(Utc::now().date_naive())
    }

    pub fn effective(&self) -> NaiveDate {
        self.effective
    }

    #[must_use]
    pub fn next(&self) -> Self {
        Self {
            effective: self.effective + TimeDelta::days(CYCLE_DAYS),
        }
    }

    #[must_use]
    pub fn previous(&self) -> Self {
        Self {
            effective: self.effective - TimeDelta::days(CYCLE_DAYS),
        }
    }

    /// `YYNN`, NN counting the cycles that became effective in the year.
    pub fn ident(&self) -> String {
        format!(
            "{:02}{:02}",
            self.effective.year() % 100,
            self.effective.ordinal0() / 28 + 1
        )
    }

    pub fn eaip_url(&self, base: &str) -> String {
        format!(
            "{}/{}-AIRAC/html/eAIP/",
            base.trim_end_matches('/'),
            self.effective.format("%Y-%m-%d")
        )
    }
}

impl Display for Airac {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AIRAC {} ({})", self.ident(), self.effective)
    }
}

impl FromStr for Airac {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::cycle_containing(s.trim().parse()?))
    }
}
