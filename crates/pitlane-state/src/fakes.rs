//! In-memory implementations of the storage traits
//!
//! Provides `MemoryCircuitRecordStore` and `MemoryRaceLedger` that satisfy
//! the trait contracts without touching disk. The record store holds its
//! mutex across the compare and the write, which is what makes
//! `record_if_faster` atomic.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::StorageError;
use crate::schema::*;
use crate::storage_traits::*;

fn lock<T>(mutex: &Mutex<T>) -> StorageResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|e| StorageError::Backend(format!("poisoned lock: {e}")))
}

// ---------------------------------------------------------------------------
// MemoryCircuitRecordStore
// ---------------------------------------------------------------------------

/// In-memory record store backed by a `BTreeMap<circuit_id, CircuitRecord>`.
#[derive(Debug, Default)]
pub struct MemoryCircuitRecordStore {
    records: Mutex<BTreeMap<String, CircuitRecord>>,
}

impl MemoryCircuitRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing records.
    pub fn with_records(records: impl IntoIterator<Item = CircuitRecord>) -> Self {
        let map = records
            .into_iter()
            .map(|r| (r.circuit_id.clone(), r))
            .collect();
        Self {
            records: Mutex::new(map),
        }
    }
}

#[async_trait]
impl CircuitRecordStore for MemoryCircuitRecordStore {
    async fn get(&self, circuit_id: &str) -> StorageResult<Option<CircuitRecord>> {
        let records = lock(&self.records)?;
        Ok(records.get(circuit_id).cloned())
    }

    async fn record_if_faster(&self, candidate: &RecordCandidate) -> StorageResult<RecordOutcome> {
        let mut records = lock(&self.records)?;
        let record = records
            .entry(candidate.circuit_id.clone())
            .or_insert_with(|| CircuitRecord::new(candidate.circuit_id.clone()));
        Ok(record.apply(candidate))
    }

    async fn list(&self) -> StorageResult<Vec<CircuitRecord>> {
        let records = lock(&self.records)?;
        Ok(records.values().cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// MemoryRaceLedger
// ---------------------------------------------------------------------------

/// In-memory race ledger backed by a `HashMap<LedgerKey, LedgerEntry>`.
#[derive(Debug, Default)]
pub struct MemoryRaceLedger {
    entries: Mutex<HashMap<LedgerKey, LedgerEntry>>,
}

impl MemoryRaceLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RaceLedger for MemoryRaceLedger {
    async fn put(&self, entry: LedgerEntry) -> StorageResult<()> {
        validate_key_part(&entry.key.discipline)?;
        validate_key_part(&entry.key.race_id)?;
        let mut entries = lock(&self.entries)?;
        entries.insert(entry.key.clone(), entry);
        Ok(())
    }

    async fn get(&self, key: &LedgerKey) -> StorageResult<Option<LedgerEntry>> {
        let entries = lock(&self.entries)?;
        Ok(entries.get(key).cloned())
    }

    async fn list(&self, discipline: Option<&str>) -> StorageResult<Vec<LedgerEntry>> {
        let entries = lock(&self.entries)?;
        let mut selected: Vec<LedgerEntry> = entries
            .values()
            .filter(|e| discipline.map(|d| e.key.discipline == d).unwrap_or(true))
            .cloned()
            .collect();
        sort_season_order(&mut selected);
        Ok(selected)
    }
}
