//! Storage trait definitions for Pitlane
//!
//! These traits define the two persistence seams of the engine:
//! - `CircuitRecordStore`: shared track records, written conditionally
//! - `RaceLedger`: scored race outcomes, replaced wholesale per race
//!
//! All traits are async and backend-agnostic. In-memory fakes live in the
//! `fakes` module, JSON-file backends in `fs`.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::schema::{CircuitRecord, LedgerEntry, LedgerKey, RecordCandidate, RecordOutcome};

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// CircuitRecordStore: shared track records
// ---------------------------------------------------------------------------

/// Best qualifying and race laps per circuit.
///
/// Guarantees:
/// - `record_if_faster` compares against the value stored *at write time*,
///   never against an earlier read, so a stored record is never replaced by
///   a slower lap regardless of how invocations interleave.
/// - A losing candidate is a no-op reported as `RecordOutcome::NotBeaten`,
///   not an error.
/// - Re-submitting the lap that set the current record reports
///   `RecordOutcome::AlreadyHeld` and writes nothing.
#[async_trait]
pub trait CircuitRecordStore: Send + Sync {
    /// Current records for a circuit, `None` if nothing was ever stored.
    async fn get(&self, circuit_id: &str) -> StorageResult<Option<CircuitRecord>>;

    /// Conditionally store `candidate` as the new record for its circuit.
    async fn record_if_faster(&self, candidate: &RecordCandidate) -> StorageResult<RecordOutcome>;

    /// All stored circuits, ordered by circuit id.
    async fn list(&self) -> StorageResult<Vec<CircuitRecord>>;
}

// ---------------------------------------------------------------------------
// RaceLedger: archive of scored races
// ---------------------------------------------------------------------------

/// Archive of scored race outcomes.
///
/// Semantics:
/// - `put` replaces any entry with the same key, so re-scoring a race
///   overwrites its previous outcome instead of accumulating.
/// - `list` is ordered by `(round, race_id)` for a stable season order.
#[async_trait]
pub trait RaceLedger: Send + Sync {
    /// Insert or replace the entry for `entry.key`.
    async fn put(&self, entry: LedgerEntry) -> StorageResult<()>;

    /// Fetch one entry.
    async fn get(&self, key: &LedgerKey) -> StorageResult<Option<LedgerEntry>>;

    /// List entries, optionally restricted to one discipline.
    async fn list(&self, discipline: Option<&str>) -> StorageResult<Vec<LedgerEntry>>;
}

/// Sort ledger entries into season order.
pub(crate) fn sort_season_order(entries: &mut [LedgerEntry]) {
    entries.sort_by(|a, b| {
        a.round
            .cmp(&b.round)
            .then_with(|| a.key.race_id.cmp(&b.key.race_id))
            .then_with(|| a.key.discipline.cmp(&b.key.discipline))
    });
}

/// Keys end up as path components in file backends.
pub(crate) fn validate_key_part(part: &str) -> StorageResult<()> {
    let valid = !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey {
            key: part.to_string(),
        })
    }
}
