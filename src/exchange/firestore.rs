use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Map;
use std::sync::Arc;
use tracing::error;

use super::{NewPost, Post, PostStore};
use crate::fetch::HttpClient;
use crate::infra::firestore::document::string_value;
use crate::infra::firestore::{Document, EXCHANGE_COLLECTION, FirestoreClient, newest_first_query};

/// Posts kept in the Firestore `exchange` collection.
pub struct FirestorePostStore<C> {
    client: Arc<FirestoreClient<C>>,
}

impl<C: HttpClient> FirestorePostStore<C> {
    pub fn new(client: Arc<FirestoreClient<C>>) -> Self {
        Self { client }
    }
}

fn post_from_document(doc: &Document) -> Post {
    let text = |field: &str| doc.string(field).unwrap_or_default().to_string();
    Post {
        id: doc.id().to_string(),
        title: text("title"),
        body: text("body"),
        // Posts written before kinds existed, or with a kind we do not know, show as the default.
        kind: doc
            .string("type")
            .and_then(|k| k.parse().ok())
            .unwrap_or_default(),
        contact: text("contact"),
        timestamp: doc
            .timestamp("timestamp")
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
    }
}

#[async_trait]
impl<C: HttpClient> PostStore for FirestorePostStore<C> {
    async fn add(&self, post: &NewPost) -> bool {
        let mut fields = Map::new();
        fields.insert("title".to_string(), string_value(&post.title));
        fields.insert("body".to_string(), string_value(&post.body));
        fields.insert("type".to_string(), string_value(post.kind.as_str()));
        fields.insert("contact".to_string(), string_value(&post.contact));

        match self
            .client
            .insert_with_server_time(EXCHANGE_COLLECTION, fields, "timestamp")
            .await
        {
            Ok(_) => true,
            Err(e) => {
                error!(error = %e, "Failed to add post");
                false
            }
        }
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Post>> {
        let query = newest_first_query(EXCHANGE_COLLECTION, None, "timestamp", limit);
        let docs = self.client.run_query(query).await?;
        Ok(docs.iter().map(post_from_document).collect())
    }
}
