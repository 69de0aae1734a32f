//! Persistence of line-check reports.
//!
//! [`ReportStore`] is the capability both backends share.
//! [`MemoryStore`] keeps reports for the life of the process.
//! [`FirestoreStore`] keeps them in the Firestore `reports` collection.

mod firestore;
mod memory;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

use anyhow::Result;
use async_trait::async_trait;

use crate::report::Report;

/// Append-only report storage with a bounded, newest-first read.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Persists one report stamped with the store's notion of "now".
    ///
    /// Never errors: failures are logged and reported as `false`.
    async fn append(&self, location_name: &str, is_long: bool) -> bool;

    /// Returns up to `limit` of the newest reports for `location_name`,
    /// newest first, regardless of age. No reports is an empty `Vec`.
    async fn query_recent(&self, location_name: &str, limit: usize) -> Result<Vec<Report>>;
}
