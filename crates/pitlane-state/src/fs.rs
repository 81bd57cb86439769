//! JSON-file backed storage.
//!
//! Every write goes to a temp file in the target directory and is renamed
//! into place, so readers never observe a half-written file. Record writes
//! are additionally serialised across processes by an advisory file lock.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::StorageError;
use crate::schema::*;
use crate::storage_traits::*;

/// Attempts at taking the record lock before giving up.
const MAX_LOCK_ATTEMPTS: u32 = 500;

/// Pause between lock attempts.
const LOCK_RETRY_SLEEP: Duration = Duration::from_millis(10);

fn write_atomic(path: &Path, bytes: &[u8]) -> StorageResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;
    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// FsCircuitRecordStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RecordFile {
    records: BTreeMap<String, CircuitRecord>,
}

/// Circuit records kept in a single JSON document.
///
/// `record_if_faster` holds an exclusive advisory lock on `<path>.lock` for
/// the whole read, compare and rename, so writers in other processes (or
/// other store instances on the same path) are serialised. Readers never
/// take the lock; the rename keeps every read consistent.
#[derive(Debug, Clone)]
pub struct FsCircuitRecordStore {
    path: PathBuf,
}

impl FsCircuitRecordStore {
    /// Open (or lazily create) the record document at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn load(path: &Path) -> StorageResult<RecordFile> {
        match fs::read(path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RecordFile::default()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    /// Take the sidecar lock, retrying while another writer holds it.
    fn acquire_lock(lock_path: &Path) -> StorageResult<fs::File> {
        if let Some(dir) = lock_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(lock_path)?;
        for attempt in 1..=MAX_LOCK_ATTEMPTS {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => return Ok(file),
                Err(_) => {
                    if attempt % 100 == 0 {
                        debug!(attempt, lock = %lock_path.display(), "waiting for record lock");
                    }
                    std::thread::sleep(LOCK_RETRY_SLEEP);
                }
            }
        }
        Err(StorageError::Conflict {
            resource: lock_path.display().to_string(),
            attempts: MAX_LOCK_ATTEMPTS,
        })
    }

    fn apply_candidate(path: &Path, candidate: &RecordCandidate) -> StorageResult<RecordOutcome> {
        let mut document = Self::load(path)?;
        let outcome = document
            .records
            .entry(candidate.circuit_id.clone())
            .or_insert_with(|| CircuitRecord::new(candidate.circuit_id.clone()))
            .apply(candidate);
        if matches!(outcome, RecordOutcome::Improved { .. }) {
            write_atomic(path, &serde_json::to_vec_pretty(&document)?)?;
        }
        Ok(outcome)
    }

    /// Load, apply and write while holding the lock.
    fn record_locked(path: &Path, lock_path: &Path, candidate: &RecordCandidate) -> StorageResult<RecordOutcome> {
        let lock = Self::acquire_lock(lock_path)?;
        let result = Self::apply_candidate(path, candidate);
        let _ = FileExt::unlock(&lock);
        result
    }
}

#[async_trait]
impl CircuitRecordStore for FsCircuitRecordStore {
    async fn get(&self, circuit_id: &str) -> StorageResult<Option<CircuitRecord>> {
        Ok(Self::load(&self.path)?.records.remove(circuit_id))
    }

    async fn record_if_faster(&self, candidate: &RecordCandidate) -> StorageResult<RecordOutcome> {
        let path = self.path.clone();
        let lock_path = self.lock_path();
        let candidate = candidate.clone();
        tokio::task::spawn_blocking(move || Self::record_locked(&path, &lock_path, &candidate))
            .await
            .map_err(|e| StorageError::Backend(format!("record writer task failed: {e}")))?
    }

    async fn list(&self) -> StorageResult<Vec<CircuitRecord>> {
        Ok(Self::load(&self.path)?.records.into_values().collect())
    }
}

// ---------------------------------------------------------------------------
// FsRaceLedger
// ---------------------------------------------------------------------------

/// Race ledger stored as one JSON file per race.
///
/// Layout: `<root>/<discipline>/<race_id>.json`
pub struct FsRaceLedger {
    root: PathBuf,
}

impl FsRaceLedger {
    /// Create a ledger rooted at `root`, creating the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn entry_path(&self, key: &LedgerKey) -> StorageResult<PathBuf> {
        validate_key_part(&key.discipline)?;
        validate_key_part(&key.race_id)?;
        Ok(self
            .root
            .join(&key.discipline)
            .join(format!("{}.json", key.race_id)))
    }

    fn read_dir_entries(dir: &Path, out: &mut Vec<LedgerEntry>) -> StorageResult<()> {
        let listing = match fs::read_dir(dir) {
            Ok(listing) => listing,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StorageError::Io(e)),
        };
        for item in listing {
            let path = item?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = fs::read(&path)?;
            out.push(serde_json::from_slice(&bytes)?);
        }
        Ok(())
    }
}

#[async_trait]
impl RaceLedger for FsRaceLedger {
    async fn put(&self, entry: LedgerEntry) -> StorageResult<()> {
        let path = self.entry_path(&entry.key)?;
        write_atomic(&path, &serde_json::to_vec_pretty(&entry)?)
    }

    async fn get(&self, key: &LedgerKey) -> StorageResult<Option<LedgerEntry>> {
        let path = self.entry_path(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn list(&self, discipline: Option<&str>) -> StorageResult<Vec<LedgerEntry>> {
        let mut entries = Vec::new();
        match discipline {
            Some(d) => {
                validate_key_part(d)?;
                Self::read_dir_entries(&self.root.join(d), &mut entries)?;
            }
            None => {
                for item in fs::read_dir(&self.root)? {
                    let path = item?.path();
                    if path.is_dir() {
                        Self::read_dir_entries(&path, &mut entries)?;
                    }
                }
            }
        }
        sort_season_order(&mut entries);
        Ok(entries)
    }
}
