//! Line-check data types shared by the stores and the aggregation pipeline.

use anyhow::{Result, anyhow};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trailing period over which reports count as recent.
pub const WINDOW: TimeDelta = TimeDelta::minutes(30);

/// Maximum number of reports fetched per stats query.
pub const QUERY_LIMIT: usize = 200;

/// One user-submitted observation that a line was or was not long.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub location_name: String,
    pub is_long: bool,
    pub timestamp: DateTime<Utc>,
}

/// Counts over the reports for one location inside [`WINDOW`].
///
/// `total == 0` means "no data", which callers must keep distinct from a
/// 0% busy reading.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineStats {
    pub total: usize,
    pub long_count: usize,
}

impl LineStats {
    /// Reduces reports to counts, keeping only those no older than [`WINDOW`] at `now`.
    pub fn from_reports<'a>(reports: impl IntoIterator<Item = &'a Report>, now: DateTime<Utc>) -> Self {
        reports
            .into_iter()
            .filter(|r| now - r.timestamp <= WINDOW)
            .fold(Self::default(), |mut acc, r| {
                acc.total += 1;
                if r.is_long {
                    acc.long_count += 1;
                }
                acc
            })
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// The venues the app offers a line check for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    WilliamsDining,
    ChickFilA,
}

impl Location {
    pub const ALL: [Location; 2] = [Location::WilliamsDining, Location::ChickFilA];

    /// The name stored on each report.
    pub fn name(self) -> &'static str {
        match self {
            Location::WilliamsDining => "Williams Dining Hall",
            Location::ChickFilA => "Chick-fil-A",
        }
    }

    fn slug(self) -> &'static str {
        match self {
            Location::WilliamsDining => "williams",
            Location::ChickFilA => "chick-fil-a",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Location {
    type Err = anyhow::Error;

    /// Accepts either the full venue name or its short slug, ignoring case.
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Location::ALL
            .into_iter()
            .find(|l| l.name().eq_ignore_ascii_case(wanted) || l.slug().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| anyhow!("unknown location '{wanted}'"))
    }
}
