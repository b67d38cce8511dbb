//! Bounded, persistent diagnosis history.
//!
//! The whole history is one JSON array stored under [`HISTORY_KEY`],
//! newest record first, never longer than [`HISTORY_LIMIT`]. History is a
//! convenience: every persistence failure is logged and masked so it can
//! never abort a diagnosis.

use crate::models::{Diagnosis, DiagnosisRecord};
use crate::storage::KeyValueStore;
use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

/// Key under which the history blob is stored.
pub const HISTORY_KEY: &str = "plant-disease-history";

/// Maximum number of records kept.
pub const HISTORY_LIMIT: usize = 50;

/// Source of the current time for new records.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Owner of the persisted diagnosis history.
pub struct HistoryStore<S: KeyValueStore> {
    storage: S,
    clock: Box<dyn Clock>,
}

impl<S: KeyValueStore> HistoryStore<S> {
    /// Create a history store over `storage` using the system clock.
    pub fn new(storage: S) -> Self {
        Self::with_clock(storage, Box::new(SystemClock))
    }

    pub fn with_clock(storage: S, clock: Box<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Read the history, newest first.
    ///
    /// An absent blob is an empty history. A blob that does not parse is
    /// removed and treated as empty. A failing medium is logged and also
    /// treated as empty.
    pub fn get_history(&self) -> Vec<DiagnosisRecord> {
        let raw = match self.storage.read(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                error!("Failed to read history: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<DiagnosisRecord>>(&raw) {
            Ok(history) => history,
            Err(e) => {
                warn!("Failed to parse stored history, discarding it: {}", e);
                if let Err(e) = self.storage.delete(HISTORY_KEY) {
                    error!("Failed to remove corrupt history: {}", e);
                }
                Vec::new()
            }
        }
    }

    /// Record a new diagnosis at the head of the history.
    ///
    /// The returned record is the one that was (or would have been)
    /// persisted; a failed write is only logged.
    pub fn add_to_history(&mut self, image_url: impl Into<String>, result: Diagnosis) -> DiagnosisRecord {
        let mut history = self.get_history();
        let date = self.clock.now();

        let record = DiagnosisRecord {
            id: next_id(&history, &date),
            date,
            image_url: image_url.into(),
            result,
        };

        history.insert(0, record.clone());
        history.truncate(HISTORY_LIMIT);

        match serde_json::to_string(&history) {
            Ok(blob) => match self.storage.write(HISTORY_KEY, &blob) {
                Ok(()) => debug!(
                    "Saved diagnosis {} ({} records in history)",
                    record.id,
                    history.len()
                ),
                Err(e) => error!("Failed to add diagnosis to history: {}", e),
            },
            Err(e) => error!("Failed to serialize history: {}", e),
        }

        record
    }

    /// Look up one record by id.
    pub fn get_record(&self, id: u64) -> Option<DiagnosisRecord> {
        self.get_history().into_iter().find(|r| r.id == id)
    }

    /// Remove the whole history.
    pub fn clear_history(&mut self) {
        match self.storage.delete(HISTORY_KEY) {
            Ok(()) => debug!("History cleared"),
            Err(e) => error!("Failed to clear history: {}", e),
        }
    }
}

/// Millisecond timestamp, bumped past the newest held id when the clock
/// has not moved forward since the last insertion.
fn next_id(history: &[DiagnosisRecord], date: &DateTime<Utc>) -> u64 {
    let millis = date.timestamp_millis().max(0) as u64;
    match history.first() {
        Some(newest) if newest.id >= millis => newest.id.checked_add(1).unwrap_or_else(|| {
            warn!("Newest history id {} cannot be bumped, using clock time", newest.id);
            millis
        }),
        _ => millis,
    }
}
