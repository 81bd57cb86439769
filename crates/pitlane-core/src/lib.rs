//! Pitlane Core Library
//!
//! Result resolution and scoring for fantasy motorsport leagues: call-ups are
//! resolved against the race classification, every effective entry is scored
//! against a typed rule set, entries are ranked into season points, and
//! standings are regenerated from the archived outcomes.

pub mod archive;
pub mod config;
pub mod domain;
pub mod index;
pub mod metrics;
pub mod normalize;
pub mod obs;
pub mod pipeline;
pub mod race;
pub mod ranking;
pub mod reporting;
pub mod resolver;
pub mod rules;
pub mod standings;
pub mod telemetry;

pub use domain::{
    AppliedBonus, Athlete, BonusRule, CallUp, ClassificationRow, ConfigError, Degradation,
    Discipline, EffectiveEntry, EntrySource, Finish, LapTime, PerformanceRecord, PitlaneError,
    QualiStage, QualifyingRow, Result, Slot, SubstitutionReason, UnresolvedReason, DNF_POSITION,
    DNF_SCORE,
};

pub use archive::{archive_outcome, load_outcome, load_outcomes};
pub use config::{DisciplineConfig, DisciplineProfile, LeagueConfig};
pub use index::RaceIndex;
pub use normalize::{NameKeyMode, NameNormalizer};
pub use pipeline::{RaceOutcome, RecordUpdate, ScoringPipeline, SubRaceOutcome};
pub use race::{RaceAwards, RaceInput, SubRaceInput, SubRaceKind};
pub use ranking::{rank, RankedEntry};
pub use resolver::{CallUpResolver, Resolution};
pub use rules::{BonusEvaluator, PointsDistribution, RuleSet, RuleTable};
pub use standings::{StandingsAggregator, StandingsRow, StandingsScope, StandingsTable};
pub use telemetry::{init_tracing, LogFormat};
