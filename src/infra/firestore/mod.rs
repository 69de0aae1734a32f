//! Firestore REST API access used by the remote backend.

mod client;
pub mod document;

pub use client::{FirestoreClient, newest_first_query};
pub use document::Document;

/// Collection holding line-check reports.
pub const REPORTS_COLLECTION: &str = "reports";
/// Collection holding exchange-board posts.
pub const EXCHANGE_COLLECTION: &str = "exchange";
