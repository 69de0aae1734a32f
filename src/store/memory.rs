use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use super::ReportStore;
use crate::clock::Clock;
use crate::report::Report;

/// Process-local fallback used when no remote backend is configured.
///
/// Reports are stamped with the injected clock and live until the store is dropped.
pub struct MemoryStore {
    clock: Arc<dyn Clock>,
    reports: Mutex<Vec<Report>>,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            reports: Mutex::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Report>> {
        // Pushes are the only mutation, so a poisoned list is still consistent.
        self.reports.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn append(&self, location_name: &str, is_long: bool) -> bool {
        let report = Report {
            location_name: location_name.to_string(),
            is_long,
            timestamp: self.clock.now(),
        };
        self.lock().push(report);
        debug!(location = location_name, is_long, "Report stored in memory");
        true
    }

    async fn query_recent(&self, location_name: &str, limit: usize) -> Result<Vec<Report>> {
        let mut matching: Vec<Report> = self
            .lock()
            .iter()
            .filter(|r| r.location_name == location_name)
            .cloned()
            .collect();

        // Stable sort keeps later appends first among equal timestamps.
        matching.reverse();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matching.truncate(limit);
        Ok(matching)
    }
}
