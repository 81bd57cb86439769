//! Persisted record shapes.
//!
//! Lap times are stored as whole milliseconds so comparisons are exact and
//! the on-disk form never depends on float formatting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which track record a lap competes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Qualifying,
    Race,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Qualifying => write!(f, "qualifying"),
            RecordKind::Race => write!(f, "race"),
        }
    }
}

/// A stored best lap, together with who set it and in which race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordLap {
    pub time_ms: u32,
    pub athlete: String,
    pub race_id: String,
    pub set_at: DateTime<Utc>,
}

/// Best qualifying and race laps for one circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitRecord {
    pub circuit_id: String,
    pub qualifying: Option<RecordLap>,
    pub race: Option<RecordLap>,
}

impl CircuitRecord {
    pub fn new(circuit_id: impl Into<String>) -> Self {
        Self {
            circuit_id: circuit_id.into(),
            qualifying: None,
            race: None,
        }
    }

    /// Stored lap for `kind`, if one has ever been set.
    pub fn lap(&self, kind: RecordKind) -> Option<&RecordLap> {
        match kind {
            RecordKind::Qualifying => self.qualifying.as_ref(),
            RecordKind::Race => self.race.as_ref(),
        }
    }

    fn lap_slot(&mut self, kind: RecordKind) -> &mut Option<RecordLap> {
        match kind {
            RecordKind::Qualifying => &mut self.qualifying,
            RecordKind::Race => &mut self.race,
        }
    }

    /// Compare `candidate` against the stored lap and write it only when it
    /// is strictly faster.
    ///
    /// Backends call this while holding whatever guard makes the
    /// read-compare-write atomic; the decision itself is shared so every
    /// backend agrees on what "beats the record" means.
    pub fn apply(&mut self, candidate: &RecordCandidate) -> RecordOutcome {
        let slot = self.lap_slot(candidate.kind);
        if let Some(stored) = slot.as_ref() {
            if candidate.is_same_lap_as(stored) {
                return RecordOutcome::AlreadyHeld;
            }
            if candidate.time_ms >= stored.time_ms {
                return RecordOutcome::NotBeaten {
                    stored_ms: stored.time_ms,
                };
            }
        }

        let previous_ms = slot.as_ref().map(|s| s.time_ms);
        *slot = Some(RecordLap {
            time_ms: candidate.time_ms,
            athlete: candidate.athlete.clone(),
            race_id: candidate.race_id.clone(),
            set_at: Utc::now(),
        });
        RecordOutcome::Improved { previous_ms }
    }
}

/// A lap proposed as a new track record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCandidate {
    pub circuit_id: String,
    pub kind: RecordKind,
    pub time_ms: u32,
    pub athlete: String,
    pub race_id: String,
}

impl RecordCandidate {
    /// Re-scoring the race that set the record yields the very same lap.
    fn is_same_lap_as(&self, stored: &RecordLap) -> bool {
        stored.time_ms == self.time_ms
            && stored.race_id == self.race_id
            && stored.athlete == self.athlete
    }
}

/// Result of a conditional record write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordOutcome {
    /// The candidate was faster and is now stored.
    Improved { previous_ms: Option<u32> },
    /// The stored record is this exact lap from this exact race.
    AlreadyHeld,
    /// The stored record is at least as fast; nothing was written.
    NotBeaten { stored_ms: u32 },
}

impl RecordOutcome {
    /// Whether the lap holds the record after the write attempt.
    pub fn holds_record(&self) -> bool {
        !matches!(self, RecordOutcome::NotBeaten { .. })
    }
}

/// Address of a scored race in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LedgerKey {
    pub discipline: String,
    pub race_id: String,
}

impl LedgerKey {
    pub fn new(discipline: impl Into<String>, race_id: impl Into<String>) -> Self {
        Self {
            discipline: discipline.into(),
            race_id: race_id.into(),
        }
    }
}

impl std::fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.discipline, self.race_id)
    }
}

/// One archived race outcome. The payload is opaque to the storage layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub key: LedgerKey,
    /// Season round, used to order entries.
    pub round: u32,
    pub payload: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(time_ms: u32, race_id: &str) -> RecordCandidate {
        RecordCandidate {
            circuit_id: "monza".to_string(),
            kind: RecordKind::Qualifying,
            time_ms,
            athlete: "leclerc".to_string(),
            race_id: race_id.to_string(),
        }
    }

    #[test]
    fn first_lap_sets_record() {
        let mut record = CircuitRecord::new("monza");
        let outcome = record.apply(&candidate(80_000, "r1"));
        assert_eq!(outcome, RecordOutcome::Improved { previous_ms: None });
        assert_eq!(record.lap(RecordKind::Qualifying).unwrap().time_ms, 80_000);
        assert!(record.race.is_none());
    }

    #[test]
    fn slower_lap_never_regresses() {
        let mut record = CircuitRecord::new("monza");
        record.apply(&candidate(88_200, "r1"));
        let outcome = record.apply(&candidate(88_500, "r2"));
        assert_eq!(outcome, RecordOutcome::NotBeaten { stored_ms: 88_200 });
        assert_eq!(record.qualifying.unwrap().time_ms, 88_200);
    }

    #[test]
    fn equal_time_from_another_race_does_not_take_record() {
        let mut record = CircuitRecord::new("monza");
        record.apply(&candidate(88_200, "r1"));
        let outcome = record.apply(&candidate(88_200, "r2"));
        assert!(!outcome.holds_record());
    }

    #[test]
    fn rescoring_same_race_is_already_held() {
        let mut record = CircuitRecord::new("monza");
        record.apply(&candidate(88_200, "r1"));
        let before = record.clone();
        let outcome = record.apply(&candidate(88_200, "r1"));
        assert_eq!(outcome, RecordOutcome::AlreadyHeld);
        assert!(outcome.holds_record());
        assert_eq!(record, before);
    }
}
