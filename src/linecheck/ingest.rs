use std::sync::Arc;
use tracing::{info, warn};

use crate::store::ReportStore;

/// Validates and records line-check votes.
#[derive(Clone)]
pub struct ReportIngestion {
    store: Arc<dyn ReportStore>,
}

impl ReportIngestion {
    pub fn new(store: Arc<dyn ReportStore>) -> Self {
        Self { store }
    }

    /// Records one vote. Returns the store's result unchanged; an empty
    /// location is a caller bug and is refused with `false`. Never retries.
    #[tracing::instrument(skip(self))]
    pub async fn submit_report(&self, location_name: &str, is_long: bool) -> bool {
        if location_name.trim().is_empty() {
            warn!("Refusing report with empty location");
            return false;
        }

        let ok = self.store.append(location_name, is_long).await;
        if ok {
            info!("Report recorded");
        } else {
            warn!("Report was not recorded");
        }
        ok
    }
}
