use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::report::LineStats;

/// Share of recent reports that say the line is long, rounded to the nearest
/// whole percent (halves round up). No data gives 0.
pub fn percent_long(stats: &LineStats) -> u32 {
    if stats.total == 0 {
        return 0;
    }
    let long = stats.long_count.min(stats.total) as u64;
    let total = stats.total as u64;
    ((200 * long + total) / (2 * total)) as u32
}

/// How busy a line is.
///
/// | Percent long | Level  |
/// |--------------|--------|
/// | <= 30        | Low    |
/// | 31 – 70      | Medium |
/// | > 70         | High   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BusyLevel {
    Low,
    Medium,
    High,
}

impl BusyLevel {
    pub fn from_percent(percent: u32) -> Self {
        match percent {
            p if p <= 30 => BusyLevel::Low,
            p if p <= 70 => BusyLevel::Medium,
            _ => BusyLevel::High,
        }
    }

    /// `None` when there is no data, which is not the same as a quiet line.
    pub fn classify(stats: &LineStats) -> Option<Self> {
        if stats.is_empty() {
            None
        } else {
            Some(Self::from_percent(percent_long(stats)))
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BusyLevel::Low => "low",
            BusyLevel::Medium => "medium",
            BusyLevel::High => "high",
        }
    }
}

impl fmt::Display for BusyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One point-in-time reading for a location, as logged and written to CSV.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSnapshot {
    pub timestamp: DateTime<Utc>,
    pub location: String,
    pub total: usize,
    pub long_count: usize,
    pub percent_long: Option<u32>,
    pub busy: Option<BusyLevel>,
}

impl LineSnapshot {
    pub fn new(location: &str, stats: LineStats, at: DateTime<Utc>) -> Self {
        let has_data = !stats.is_empty();
        Self {
            timestamp: at,
            location: location.to_string(),
            total: stats.total,
            long_count: stats.long_count,
            percent_long: has_data.then(|| percent_long(&stats)),
            busy: BusyLevel::classify(&stats),
        }
    }

    /// The sentence shown under a location's meter.
    pub fn summary(&self) -> String {
        match self.percent_long {
            None => "No reports in the last 30 min".to_string(),
            Some(pct) => format!(
                "{}% say line is long ({}/{})",
                pct, self.long_count, self.total
            ),
        }
    }
}
