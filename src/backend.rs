//! Startup backend selection.
//!
//! One configuration check decides, for the whole process, whether reports
//! and posts live in Firestore or in memory.

use anyhow::Result;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::Config;
use crate::exchange::{FirestorePostStore, MemoryPostStore, PostStore};
use crate::fetch::client_from_config;
use crate::infra::firestore::FirestoreClient;
use crate::store::{FirestoreStore, MemoryStore, ReportStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Firestore,
    Memory,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Firestore => f.write_str("firestore"),
            BackendKind::Memory => f.write_str("memory"),
        }
    }
}

/// The stores every service in the process shares.
#[derive(Clone)]
pub struct Backends {
    pub kind: BackendKind,
    pub reports: Arc<dyn ReportStore>,
    pub posts: Arc<dyn PostStore>,
}

impl Backends {
    /// Fresh in-memory stores stamped by `clock`.
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self {
            kind: BackendKind::Memory,
            reports: Arc::new(MemoryStore::new(clock.clone())),
            posts: Arc::new(MemoryPostStore::new(clock)),
        }
    }

    /// Opens Firestore-backed stores when a project is configured, in-memory
    /// ones otherwise. Missing credentials are not an error.
    pub fn open(config: &Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let Some(firestore) = &config.firestore else {
            warn!("No Firestore project configured, using in-memory stores for this session");
            return Ok(Self::in_memory(clock));
        };

        let http = client_from_config(config, firestore)?;
        let client = Arc::new(FirestoreClient::new(http, firestore));
        info!(project = %firestore.project_id, "Using Firestore backend");

        Ok(Self {
            kind: BackendKind::Firestore,
            reports: Arc::new(FirestoreStore::new(client.clone())),
            posts: Arc::new(FirestorePostStore::new(client)),
        })
    }
}
