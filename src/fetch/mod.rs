mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result, anyhow};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use std::sync::Arc;

use crate::config::{Config, FirestoreConfig};
use auth::{ApiKey, UrlParam};

/// POSTs `body` as JSON and decodes the JSON reply.
///
/// Non-success statuses become errors carrying the status and response body.
pub async fn post_json<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
    body: &serde_json::Value,
) -> Result<serde_json::Value> {
    let mut req = reqwest::Request::new(
        reqwest::Method::POST,
        url.parse().with_context(|| format!("invalid URL '{url}'"))?,
    );
    req.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    *req.body_mut() = Some(serde_json::to_vec(body)?.into());

    let response = client
        .execute(req)
        .await
        .map_err(|e| anyhow!("Failed to send request: {}", e))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(anyhow!("API returned status {}: {}", status, body));
    }

    response
        .json()
        .await
        .map_err(|e| anyhow!("Failed to parse response: {}", e))
}

/// Builds the transport for the remote backend: a [`BasicClient`] with the
/// configured timeouts, wrapped in whichever credentials are set.
pub fn client_from_config(config: &Config, firestore: &FirestoreConfig) -> Result<Arc<dyn HttpClient>> {
    let basic = BasicClient::with_timeouts(config.http_timeout, config.http_connect_timeout)?;

    let client: Arc<dyn HttpClient> = match (&firestore.api_key, &firestore.access_token) {
        (Some(key), Some(token)) => Arc::new(UrlParam::api_key(ApiKey::bearer(basic, token)?, key)),
        (Some(key), None) => Arc::new(UrlParam::api_key(basic, key)),
        (None, Some(token)) => Arc::new(ApiKey::bearer(basic, token)?),
        (None, None) => Arc::new(basic),
    };
    Ok(client)
}
