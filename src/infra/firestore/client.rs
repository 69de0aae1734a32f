use anyhow::{Context, Result, anyhow};
use serde_json::{Map, Value, json};
use tracing::debug;
use uuid::Uuid;

use super::document::Document;
use crate::config::FirestoreConfig;
use crate::fetch::{HttpClient, post_json};

/// Minimal Firestore REST client: single-document inserts with a server
/// timestamp, and structured queries.
pub struct FirestoreClient<C> {
    http: C,
    /// `projects/{p}/databases/(default)/documents`
    documents_path: String,
    base_url: String,
}

impl<C: HttpClient> FirestoreClient<C> {
    pub fn new(http: C, config: &FirestoreConfig) -> Self {
        Self {
            http,
            documents_path: format!("projects/{}/databases/(default)/documents", config.project_id),
            base_url: config.base_url.clone(),
        }
    }

    /// Inserts one document under a fresh id in `collection`. The field named
    /// `timestamp_field` is set by the server to the commit time, so client
    /// clocks never decide a document's age.
    ///
    /// Returns the new document id.
    pub async fn insert_with_server_time(
        &self,
        collection: &str,
        fields: Map<String, Value>,
        timestamp_field: &str,
    ) -> Result<String> {
        let id = Uuid::new_v4().simple().to_string();
        let body = json!({
            "writes": [{
                "update": {
                    "name": format!("{}/{}/{}", self.documents_path, collection, id),
                    "fields": fields,
                },
                "updateTransforms": [{
                    "fieldPath": timestamp_field,
                    "setToServerValue": "REQUEST_TIME",
                }],
                "currentDocument": { "exists": false },
            }]
        });

        let url = format!("{}/{}:commit", self.base_url, self.documents_path);
        post_json(&self.http, &url, &body)
            .await
            .with_context(|| format!("Firestore commit to '{collection}' failed"))?;

        debug!(collection, id = %id, "Document inserted");
        Ok(id)
    }

    /// Runs a structured query and returns the matching documents in server order.
    pub async fn run_query(&self, structured_query: Value) -> Result<Vec<Document>> {
        let url = format!("{}/{}:runQuery", self.base_url, self.documents_path);
        let body = json!({ "structuredQuery": structured_query });

        let reply = post_json(&self.http, &url, &body)
            .await
            .context("Firestore runQuery failed")?;

        let rows = reply
            .as_array()
            .ok_or_else(|| anyhow!("runQuery reply is not an array"))?;

        let docs: Vec<Document> = rows.iter().filter_map(Document::from_query_row).collect();
        debug!(documents = docs.len(), "Query returned");
        Ok(docs)
    }
}

/// Builds a "newest first" query over `collection`, optionally restricted to
/// documents whose `equals.0` field equals `equals.1`.
pub fn newest_first_query(
    collection: &str,
    equals: Option<(&str, Value)>,
    order_field: &str,
    limit: usize,
) -> Value {
    let mut query = json!({
        "from": [{ "collectionId": collection }],
        "orderBy": [{
            "field": { "fieldPath": order_field },
            "direction": "DESCENDING",
        }],
        "limit": limit,
    });
    if let Some((field, value)) = equals {
        query["where"] = json!({
            "fieldFilter": {
                "field": { "fieldPath": field },
                "op": "EQUAL",
                "value": value,
            }
        });
    }
    query
}
