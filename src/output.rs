//! Output formatting and persistence for line snapshots.
//!
//! Supports a one-line summary, JSON serialization, and CSV append.

use anyhow::Result;
use tracing::{debug, info};

use crate::linecheck::LineSnapshot;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

/// Serializes appends so the header check and the write happen as one step.
static APPEND_LOCK: Mutex<()> = Mutex::new(());

/// Logs the human-readable reading for a location.
pub fn print_summary(snapshot: &LineSnapshot) {
    info!(
        location = %snapshot.location,
        total = snapshot.total,
        long_count = snapshot.long_count,
        busy = snapshot.busy.map(|b| b.as_str()).unwrap_or("no data"),
        "{}",
        snapshot.summary()
    );
}

/// Logs the snapshot as pretty-printed JSON.
pub fn print_json(snapshot: &LineSnapshot) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(snapshot)?);
    Ok(())
}

/// Appends a [`LineSnapshot`] as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist. Safe to call
/// from several threads on the same path: the header is written once.
pub fn append_record(path: &str, snapshot: &LineSnapshot) -> Result<()> {
    let _guard = APPEND_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(snapshot)?;
    writer.flush()?;

    Ok(())
}
