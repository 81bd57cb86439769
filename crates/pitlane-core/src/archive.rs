//! Race outcomes in the ledger.
//!
//! Standings are regenerated from whatever the ledger holds, so re-scoring a
//! race replaces its entry instead of adding to it.

use chrono::Utc;
use tracing::{debug, warn};

use pitlane_state::{LedgerEntry, LedgerKey, RaceLedger};

use crate::domain::{Discipline, Result};
use crate::pipeline::RaceOutcome;

pub fn ledger_key(discipline: Discipline, race_id: &str) -> LedgerKey {
    LedgerKey::new(discipline.as_str(), race_id)
}

/// Store `outcome`, replacing any earlier outcome of the same race.
pub async fn archive_outcome(ledger: &dyn RaceLedger, outcome: &RaceOutcome) -> Result<()> {
    let entry = LedgerEntry {
        key: ledger_key(outcome.discipline, &outcome.race_id),
        round: outcome.round,
        payload: serde_json::to_value(outcome)?,
        recorded_at: Utc::now(),
    };
    debug!(key = %entry.key, round = entry.round, "archiving race outcome");
    ledger.put(entry).await?;
    Ok(())
}

/// One archived outcome, `None` if the race was never scored.
pub async fn load_outcome(ledger: &dyn RaceLedger, discipline: Discipline, race_id: &str) -> Result<Option<RaceOutcome>> {
    match ledger.get(&ledger_key(discipline, race_id)).await? {
        Some(entry) => Ok(Some(serde_json::from_value(entry.payload)?)),
        None => Ok(None),
    }
}

/// All archived outcomes in season order. Entries that no longer decode are
/// skipped with a warning so one bad payload cannot block the standings.
pub async fn load_outcomes(ledger: &dyn RaceLedger, discipline: Option<Discipline>) -> Result<Vec<RaceOutcome>> {
    let entries = ledger.list(discipline.map(|d| d.as_str())).await?;
    let mut outcomes = Vec::with_capacity(entries.len());
    for entry in entries {
        match serde_json::from_value::<RaceOutcome>(entry.payload) {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => warn!(key = %entry.key, error = %e, "skipping undecodable ledger entry"),
        }
    }
    Ok(outcomes)
}
