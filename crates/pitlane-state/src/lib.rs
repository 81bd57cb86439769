//! Pitlane-State: persistence layer for the Pitlane scoring engine
//!
//! This crate owns the only cross-race mutable state in the system (circuit
//! track records) and the archive of scored race outcomes that season
//! standings are regenerated from.
//!
//! ## Key Components
//!
//! - `CircuitRecordStore`: best qualifying/race lap per circuit, updated only
//!   through a conditional write
//! - `RaceLedger`: scored race outcomes keyed by discipline and race id
//! - `fakes`: in-memory implementations for tests and single-process runs
//! - `fs`: JSON-file backed implementations used by the CLI

mod error;
pub mod fakes;
pub mod fs;
mod schema;
pub mod storage_traits;

pub use error::StorageError;
pub use schema::{
    CircuitRecord, LedgerEntry, LedgerKey, RecordCandidate, RecordKind, RecordLap, RecordOutcome,
};
pub use storage_traits::{CircuitRecordStore, RaceLedger, StorageResult};
