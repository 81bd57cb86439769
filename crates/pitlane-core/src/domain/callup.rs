//! Weekly call-ups and the effective entries they resolve to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::classification::Finish;

/// A team's nominations for one race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallUp {
    pub team_id: String,
    pub primary: String,
    pub secondary: String,
    pub reserve: String,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    /// Late flag set by whoever enforces the submission deadline.
    #[serde(default)]
    pub late: bool,
}

impl CallUp {
    pub fn new(
        team_id: impl Into<String>,
        primary: impl Into<String>,
        secondary: impl Into<String>,
        reserve: impl Into<String>,
    ) -> Self {
        Self {
            team_id: team_id.into(),
            primary: primary.into(),
            secondary: secondary.into(),
            reserve: reserve.into(),
            submitted_at: None,
            late: false,
        }
    }

    pub fn submitted(mut self, at: DateTime<Utc>) -> Self {
        self.submitted_at = Some(at);
        self
    }

    /// Late if flagged upstream, or submitted after `deadline` when one is known.
    pub fn is_late(&self, deadline: Option<DateTime<Utc>>) -> bool {
        if self.late {
            return true;
        }
        match (self.submitted_at, deadline) {
            (Some(at), Some(deadline)) => at > deadline,
            _ => false,
        }
    }
}

/// Which nomination an effective entry fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Primary,
    Secondary,
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Slot::Primary => f.write_str("primary"),
            Slot::Secondary => f.write_str("secondary"),
        }
    }
}

/// Why a nominee had to be replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubstitutionReason {
    /// Not in the classification at all.
    NoShow,
    /// Classified as a non-finisher.
    Retired,
}

/// Why a slot could not be filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// The reserve is absent, did not finish, or is already one of the team's nominees.
    ReserveUnavailable,
    /// The reserve already filled another slot of this team.
    ReserveAlreadyUsed,
    /// The call-up named the same athlete twice.
    DuplicateNominee,
}

/// Where an effective entry's athlete came from. Audit only; scoring reads
/// `EffectiveEntry::finish`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntrySource {
    Nominee,
    Substituted {
        replaced: String,
        reason: SubstitutionReason,
    },
    Unresolved {
        reason: UnresolvedReason,
    },
}

/// One of the exactly two scoring entries a team has in a race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveEntry {
    pub team_id: String,
    pub race_id: String,
    pub slot: Slot,
    /// Athlete name as nominated; `None` only for a vacant duplicate slot.
    pub athlete: Option<String>,
    /// Normalized key used for lookups; empty when there is no athlete.
    pub key: String,
    pub source: EntrySource,
    /// Finish that scoring uses. Unresolved slots always carry a non-finish.
    pub finish: Finish,
}

impl EffectiveEntry {
    pub fn is_substituted(&self) -> bool {
        matches!(self.source, EntrySource::Substituted { .. })
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self.source, EntrySource::Unresolved { .. })
    }
}
