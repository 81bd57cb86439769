//! Input snapshot for one race event.
//!
//! Everything the engine needs is fetched up front by the caller and handed
//! over in a [`RaceInput`]; the engine itself performs no I/O apart from the
//! circuit record write.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Athlete, CallUp, ClassificationRow, Discipline, QualifyingRow};

/// Main race or sprint. Each is resolved, scored and ranked on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubRaceKind {
    Main,
    Sprint,
}

impl std::fmt::Display for SubRaceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubRaceKind::Main => f.write_str("main"),
            SubRaceKind::Sprint => f.write_str("sprint"),
        }
    }
}

/// Named awards handed out outside the classification table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceAwards {
    #[serde(default)]
    pub driver_of_the_day: Option<String>,
    #[serde(default)]
    pub fastest_pit_stop: Option<String>,
    #[serde(default)]
    pub top_speed: Option<String>,
    /// Overrides the fastest lap otherwise derived from `best_lap` cells.
    #[serde(default)]
    pub fastest_lap: Option<String>,
}

/// Qualifying and classification tables for one sub-race.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubRaceInput {
    #[serde(default)]
    pub qualifying: Vec<QualifyingRow>,
    #[serde(default)]
    pub classification: Vec<ClassificationRow>,
    #[serde(default)]
    pub awards: RaceAwards,
}

/// One race event of one discipline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceInput {
    pub race_id: String,
    /// Season round number.
    pub round: u32,
    pub discipline: Discipline,
    pub circuit_id: String,
    pub main: SubRaceInput,
    #[serde(default)]
    pub sprint: Option<SubRaceInput>,
    pub call_ups: Vec<CallUp>,
    pub roster: Vec<Athlete>,
    /// External per-athlete marks added to the bonus total, keyed by name.
    #[serde(default)]
    pub base_marks: BTreeMap<String, f64>,
    /// Call-up deadline; submissions after it count as late.
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
}

impl RaceInput {
    pub fn sub_race(&self, kind: SubRaceKind) -> Option<&SubRaceInput> {
        match kind {
            SubRaceKind::Main => Some(&self.main),
            SubRaceKind::Sprint => self.sprint.as_ref(),
        }
    }
}
