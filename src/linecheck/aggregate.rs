use std::sync::Arc;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::report::{LineStats, QUERY_LIMIT};
use crate::store::ReportStore;

/// Computes windowed line statistics from whatever the store holds.
///
/// Holds no state of its own between calls, so clones can serve concurrent
/// requests freely.
#[derive(Clone)]
pub struct LineCheckAggregator {
    store: Arc<dyn ReportStore>,
    clock: Arc<dyn Clock>,
}

impl LineCheckAggregator {
    pub fn new(store: Arc<dyn ReportStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Counts the reports for `location_name` from the last 30 minutes.
    ///
    /// The window is applied here, not by the store, so it does not depend on
    /// store retention. Store failures yield zeroed stats ("no data").
    #[tracing::instrument(skip(self))]
    pub async fn get_stats(&self, location_name: &str) -> LineStats {
        let reports = match self.store.query_recent(location_name, QUERY_LIMIT).await {
            Ok(reports) => reports,
            Err(e) => {
                warn!(error = %e, "Stats query failed, reporting no data");
                return LineStats::default();
            }
        };

        let stats = LineStats::from_reports(&reports, self.clock.now());
        debug!(
            fetched = reports.len(),
            total = stats.total,
            long_count = stats.long_count,
            "Line stats computed"
        );
        stats
    }
}
