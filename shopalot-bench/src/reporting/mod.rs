//! Where benchmark result entries go.
//!
//! Each workload hands its per-statement entries to a [`ResultSink`]. The harness uses a
//! [`ResultLog`], which can write to a local newline-delimited JSON file, the analysis cluster's
//! socket feed and the console at the same time.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Local;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::Result;

mod log;

pub use log::ResultLog;

/// A structured result entry.
pub type Entry = Map<String, Value>;

#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn record(&mut self, entry: Entry) -> Result<()>;

    /// Flushes and releases the sink's outputs.
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Wall-clock timestamp in the format entries carry.
pub fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// An entry marking a point in time on the analysis cluster, e.g. a configuration change.
pub fn marker_entry(comment: &str) -> Entry {
    let now = timestamp();
    let mut entry = Entry::new();
    entry.insert("id".into(), Uuid::new_v4().to_string().into());
    entry.insert("startTime".into(), now.clone().into());
    entry.insert("endTime".into(), now.into());
    entry.insert("markerComment".into(), comment.into());
    entry.insert("isMarker".into(), true.into());
    entry
}

/// Keeps entries in memory. Clones share the same entries, so a caller can keep one handle and
/// give the other to a [`Harness`](crate::benchmark::Harness).
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    inner: Arc<Mutex<Recorded>>,
}

#[derive(Debug, Default)]
struct Recorded {
    entries: Vec<Entry>,
    closed: bool,
}

impl MemorySink {
    fn recorded(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.recorded().entries.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.recorded().closed
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn record(&mut self, entry: Entry) -> Result<()> {
        self.recorded().entries.push(entry);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.recorded().closed = true;
        Ok(())
    }
}
