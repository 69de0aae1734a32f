//! The exchange board: short listings students post for sales, study groups
//! and anything else.

mod firestore;
mod memory;

pub use firestore::FirestorePostStore;
pub use memory::MemoryPostStore;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

/// Default number of posts listed.
pub const POST_LIST_LIMIT: usize = 50;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PostKind {
    #[default]
    #[serde(rename = "sale")]
    Sale,
    #[serde(rename = "study group")]
    StudyGroup,
    #[serde(rename = "other")]
    Other,
}

impl PostKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PostKind::Sale => "sale",
            PostKind::StudyGroup => "study group",
            PostKind::Other => "other",
        }
    }
}

impl fmt::Display for PostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "sale" => Ok(PostKind::Sale),
            "study group" | "study-group" | "study_group" => Ok(PostKind::StudyGroup),
            "other" => Ok(PostKind::Other),
            other => Err(anyhow!("unknown post kind '{other}'")),
        }
    }
}

/// A post as submitted, before the store assigns an id and timestamp.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub body: String,
    pub kind: PostKind,
    pub contact: String,
}

impl NewPost {
    /// Copy with surrounding whitespace removed from every text field.
    pub fn trimmed(&self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            body: self.body.trim().to_string(),
            kind: self.kind,
            contact: self.contact.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub body: String,
    pub kind: PostKind,
    pub contact: String,
    pub timestamp: DateTime<Utc>,
}

/// Storage for exchange posts, newest first.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Stores a post. Failures are logged and reported as `false`.
    async fn add(&self, post: &NewPost) -> bool;

    /// Up to `limit` posts, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<Post>>;
}

/// Posting and listing with the same never-crash contract as the line check.
#[derive(Clone)]
pub struct ExchangeBoard {
    store: Arc<dyn PostStore>,
}

impl ExchangeBoard {
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        Self { store }
    }

    /// Stores a trimmed copy of `post`. A blank title is refused.
    #[tracing::instrument(skip_all, fields(kind = %post.kind))]
    pub async fn add_post(&self, post: &NewPost) -> bool {
        let post = post.trimmed();
        if post.title.is_empty() {
            warn!("Refusing post without a title");
            return false;
        }
        let ok = self.store.add(&post).await;
        if ok {
            info!(title = %post.title, "Post added");
        }
        ok
    }

    /// The newest posts; an unreachable store lists nothing.
    #[tracing::instrument(skip(self))]
    pub async fn recent_posts(&self, limit: usize) -> Vec<Post> {
        match self.store.recent(limit).await {
            Ok(posts) => posts,
            Err(e) => {
                warn!(error = %e, "Listing posts failed");
                Vec::new()
            }
        }
    }
}
