//! Runtime configuration read from the environment (and `.env` via `dotenvy`).
//!
//! The presence of `FIRESTORE_PROJECT_ID` is the single startup check that
//! selects the remote backend; without it every store runs in memory.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::time::Duration;

use crate::eligibility::DEFAULT_STUDENT_EMAIL_SUFFIX;

pub const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Connection details for the Firestore REST API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub base_url: String,
    /// Sent as the `key` query parameter.
    pub api_key: Option<String>,
    /// Sent as `Authorization: Bearer <token>`.
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub firestore: Option<FirestoreConfig>,
    pub http_timeout: Duration,
    pub http_connect_timeout: Duration,
    pub student_email_suffix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            firestore: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            http_connect_timeout: Duration::from_secs(DEFAULT_HTTP_CONNECT_TIMEOUT_SECS),
            student_email_suffix: DEFAULT_STUDENT_EMAIL_SUFFIX.to_string(),
        }
    }
}

impl Config {
    /// Loads the config from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Builds the config from explicit `(name, value)` pairs. Blank values count as unset.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v)| !v.trim().is_empty())
            .collect();
        let get = |name: &str| vars.get(name).map(|v| v.trim().to_string());

        let firestore = get("FIRESTORE_PROJECT_ID").map(|project_id| FirestoreConfig {
            project_id,
            base_url: get("FIRESTORE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_FIRESTORE_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key: get("FIRESTORE_API_KEY"),
            access_token: get("FIRESTORE_ACCESS_TOKEN"),
        });

        let http_timeout = seconds(get("HTTP_TIMEOUT_SECS"), "HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;
        let http_connect_timeout = seconds(
            get("HTTP_CONNECT_TIMEOUT_SECS"),
            "HTTP_CONNECT_TIMEOUT_SECS",
            DEFAULT_HTTP_CONNECT_TIMEOUT_SECS,
        )?;

        Ok(Self {
            firestore,
            http_timeout,
            http_connect_timeout,
            student_email_suffix: get("STUDENT_EMAIL_SUFFIX")
                .unwrap_or_else(|| DEFAULT_STUDENT_EMAIL_SUFFIX.to_string()),
        })
    }

    pub fn is_remote_configured(&self) -> bool {
        self.firestore.is_some()
    }
}

fn seconds(value: Option<String>, name: &str, default: u64) -> Result<Duration> {
    match value {
        None => Ok(Duration::from_secs(default)),
        Some(v) => {
            let secs: u64 = v
                .parse()
                .with_context(|| format!("{name} must be a whole number of seconds, got '{v}'"))?;
            Ok(Duration::from_secs(secs))
        }
    }
}
