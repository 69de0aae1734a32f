use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Map;
use std::sync::Arc;
use tracing::{error, warn};

use super::ReportStore;
use crate::fetch::HttpClient;
use crate::infra::firestore::document::{boolean_value, string_value};
use crate::infra::firestore::{Document, FirestoreClient, REPORTS_COLLECTION, newest_first_query};
use crate::report::{QUERY_LIMIT, Report};

/// Reports kept in the Firestore `reports` collection.
///
/// Each document holds `locationName`, `isLong` and a server-assigned `timestamp`.
pub struct FirestoreStore<C> {
    client: Arc<FirestoreClient<C>>,
}

impl<C: HttpClient> FirestoreStore<C> {
    pub fn new(client: Arc<FirestoreClient<C>>) -> Self {
        Self { client }
    }
}

/// Converts a stored document into a [`Report`]. A document with no
/// timestamp yet is placed at the Unix epoch so it never lands in a window.
fn report_from_document(doc: &Document) -> Option<Report> {
    let Some(location_name) = doc.string("locationName") else {
        warn!(document = %doc.name, "Report document without locationName skipped");
        return None;
    };
    Some(Report {
        location_name: location_name.to_string(),
        is_long: doc.boolean("isLong").unwrap_or(false),
        timestamp: doc.timestamp("timestamp").unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
    })
}

#[async_trait]
impl<C: HttpClient> ReportStore for FirestoreStore<C> {
    #[tracing::instrument(skip(self))]
    async fn append(&self, location_name: &str, is_long: bool) -> bool {
        let mut fields = Map::new();
        fields.insert("locationName".to_string(), string_value(location_name));
        fields.insert("isLong".to_string(), boolean_value(is_long));

        match self
            .client
            .insert_with_server_time(REPORTS_COLLECTION, fields, "timestamp")
            .await
        {
            Ok(_) => true,
            Err(e) => {
                error!(error = %e, "Failed to append report");
                false
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn query_recent(&self, location_name: &str, limit: usize) -> Result<Vec<Report>> {
        let query = newest_first_query(
            REPORTS_COLLECTION,
            Some(("locationName", string_value(location_name))),
            "timestamp",
            limit.min(QUERY_LIMIT),
        );

        let docs = self.client.run_query(query).await?;
        Ok(docs.iter().filter_map(report_from_document).collect())
    }
}
