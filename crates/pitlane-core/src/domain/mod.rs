//! Domain models for Pitlane.
//!
//! Canonical definitions for the core entities:
//! - `Athlete` / `Discipline`: who races, and in which series
//! - `ClassificationRow` / `QualifyingRow` / `Finish`: scraped session results
//! - `CallUp` / `EffectiveEntry`: a team's nominations and what they resolve to
//! - `PerformanceRecord`: the scored result for one effective entry

pub mod athlete;
pub mod callup;
pub mod classification;
pub mod error;
pub mod performance;

pub use athlete::{Athlete, Discipline};
pub use callup::{CallUp, EffectiveEntry, EntrySource, Slot, SubstitutionReason, UnresolvedReason};
pub use classification::{ClassificationRow, Finish, LapTime, QualifyingRow, DNF_POSITION};
pub use error::{ConfigError, PitlaneError, Result};
pub use performance::{AppliedBonus, BonusRule, Degradation, PerformanceRecord, QualiStage, DNF_SCORE};
