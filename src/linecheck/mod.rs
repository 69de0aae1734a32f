//! Crowdsourced line checks.
//!
//! Votes come in through [`ReportIngestion`], [`LineCheckAggregator`] reduces
//! the recent ones to [`LineStats`](crate::report::LineStats), and [`busy`]
//! turns those counts into the percentage and busy level shown to users.

pub mod aggregate;
pub mod busy;
pub mod ingest;

pub use aggregate::LineCheckAggregator;
pub use busy::{BusyLevel, LineSnapshot, percent_long};
pub use ingest::ReportIngestion;
