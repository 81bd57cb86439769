//! Scored results.

use serde::{Deserialize, Serialize};

use super::callup::{EntrySource, Slot};
use super::classification::Finish;

/// Total score forced onto every non-finishing entry.
pub const DNF_SCORE: f64 = -99.0;

/// Qualifying bracket an athlete reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualiStage {
    Eliminated,
    Intermediate,
    Top,
}

/// Every bonus the evaluator knows how to award.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusRule {
    QualiTopStage,
    QualiIntermediateStage,
    PolePosition,
    QualiTrackRecord,
    PositionDelta,
    BeatTeammateQuali,
    BeatTeammateRace,
    FastestLap,
    RaceTrackRecord,
    DriverOfTheDay,
    FastestPitStop,
    TopSpeed,
}

/// One line of a score breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedBonus {
    pub rule: BonusRule,
    pub points: f64,
}

/// A field or bonus that was dropped to its default instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Degradation {
    /// Athlete, team or circuit the note is about.
    pub subject: String,
    pub field: String,
    pub reason: String,
}

impl Degradation {
    pub fn new(
        subject: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Scored result for one effective entry. Frozen once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub team_id: String,
    pub slot: Slot,
    pub athlete: Option<String>,
    pub source: EntrySource,
    pub finish: Finish,
    /// `finish.position()`, kept flat for sorting and display.
    pub race_position: u32,
    pub quali_position: Option<u32>,
    pub quali_stage: Option<QualiStage>,
    pub pole: bool,
    pub quali_track_record: bool,
    /// `quali_position - race_position`; zero when either is unknown.
    pub position_delta: i32,
    pub beat_teammate_quali: bool,
    pub beat_teammate_race: bool,
    pub fastest_lap: bool,
    pub race_track_record: bool,
    pub driver_of_the_day: bool,
    pub fastest_pit_stop: bool,
    pub top_speed: bool,
    pub breakdown: Vec<AppliedBonus>,
    pub bonus_score: f64,
    pub base_score: f64,
    pub total_score: f64,
}

impl PerformanceRecord {
    pub fn is_dnf(&self) -> bool {
        !self.finish.is_finisher()
    }

    /// Athlete name for display, `-` for a vacant slot.
    pub fn athlete_label(&self) -> &str {
        self.athlete.as_deref().unwrap_or("-")
    }
}
