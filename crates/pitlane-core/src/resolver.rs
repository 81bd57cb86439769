//! Call-up resolution.
//!
//! Every team ends up with exactly two [`EffectiveEntry`] values per race.
//! Resolution is a pure function of the call-up and the indexed
//! classification: nominees are sorted into no-shows and retirements first,
//! then the reserve is handed to the first pending slot (no-shows before
//! retirements, primary before secondary). Whatever is left stays unresolved
//! and scores as a non-finish.

use std::collections::BTreeMap;

use tracing::debug;

use crate::domain::{
    CallUp, Degradation, EffectiveEntry, EntrySource, Finish, Slot, SubstitutionReason,
    UnresolvedReason,
};
use crate::index::RaceIndex;
use crate::metrics::METRICS;
use crate::normalize::NameNormalizer;
use crate::obs;

/// Entries for every team plus notes about call-ups that were ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub entries: Vec<EffectiveEntry>,
    pub notes: Vec<Degradation>,
}

/// Where a nominee stands after matching against the classification.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Standing {
    Finished(Finish),
    Absent,
    Retired(Finish),
    /// Same athlete as the primary.
    Duplicate,
}

struct Nominee<'c> {
    slot: Slot,
    name: &'c str,
    key: String,
    standing: Standing,
}

pub struct CallUpResolver<'r, 'a> {
    index: &'r RaceIndex<'a>,
    normalizer: &'r NameNormalizer,
}

impl<'r, 'a> CallUpResolver<'r, 'a> {
    pub fn new(index: &'r RaceIndex<'a>, normalizer: &'r NameNormalizer) -> Self {
        Self { index, normalizer }
    }

    /// Resolve all call-ups of a race, ordered by team id. Only the first
    /// call-up of a team is used.
    pub fn resolve_all(&self, race_id: &str, call_ups: &[CallUp]) -> Resolution {
        let mut by_team: BTreeMap<&str, &CallUp> = BTreeMap::new();
        let mut notes = Vec::new();
        for call_up in call_ups {
            if by_team.contains_key(call_up.team_id.as_str()) {
                notes.push(Degradation::new(&call_up.team_id, "call_up", "duplicate call-up ignored"));
                continue;
            }
            by_team.insert(call_up.team_id.as_str(), call_up);
        }

        let entries = by_team
            .values()
            .flat_map(|call_up| self.resolve(race_id, call_up))
            .collect();
        Resolution { entries, notes }
    }

    /// The two effective entries of one team, primary first.
    pub fn resolve(&self, race_id: &str, call_up: &CallUp) -> [EffectiveEntry; 2] {
        let primary = self.nominee(Slot::Primary, &call_up.primary, None);
        let secondary = self.nominee(Slot::Secondary, &call_up.secondary, Some(&primary.key));

        let reserve_key = self.normalizer.normalize(&call_up.reserve);
        let reserve_finish = self
            .index
            .row(&reserve_key)
            .map(|row| row.finish)
            .filter(|f| f.is_finisher() && reserve_key != primary.key && reserve_key != secondary.key);

        let mut pending: Vec<(&Nominee<'_>, SubstitutionReason)> = Vec::new();
        for nominee in [&primary, &secondary] {
            if nominee.standing == Standing::Absent {
                pending.push((nominee, SubstitutionReason::NoShow));
            }
        }
        for nominee in [&primary, &secondary] {
            if let Standing::Retired(_) = nominee.standing {
                pending.push((nominee, SubstitutionReason::Retired));
            }
        }

        let mut substituted: Option<Slot> = None;
        let mut resolved: BTreeMap<Slot, (Option<String>, String, EntrySource, Finish)> = BTreeMap::new();
        for (nominee, reason) in pending {
            let filled = match (reserve_finish, substituted) {
                (Some(finish), None) => {
                    substituted = Some(nominee.slot);
                    obs::emit_substitution(&call_up.team_id, nominee.name, &call_up.reserve, reason_label(reason));
                    METRICS.inc_substitutions();
                    (
                        Some(call_up.reserve.clone()),
                        reserve_key.clone(),
                        EntrySource::Substituted {
                            replaced: nominee.name.to_string(),
                            reason,
                        },
                        finish,
                    )
                }
                (_, used) => {
                    let reason = if used.is_some() {
                        UnresolvedReason::ReserveAlreadyUsed
                    } else {
                        UnresolvedReason::ReserveUnavailable
                    };
                    unresolved(call_up, nominee, reason)
                }
            };
            resolved.insert(nominee.slot, filled);
        }

        [primary, secondary].map(|nominee| {
            let (athlete, key, source, finish) = match resolved.remove(&nominee.slot) {
                Some(filled) => filled,
                None => match nominee.standing {
                    Standing::Finished(finish) => (
                        Some(nominee.name.to_string()),
                        nominee.key.clone(),
                        EntrySource::Nominee,
                        finish,
                    ),
                    Standing::Duplicate => {
                        unresolved(call_up, &nominee, UnresolvedReason::DuplicateNominee)
                    }
                    // Pending slots were all resolved above.
                    Standing::Absent | Standing::Retired(_) => {
                        unresolved(call_up, &nominee, UnresolvedReason::ReserveUnavailable)
                    }
                },
            };
            EffectiveEntry {
                team_id: call_up.team_id.clone(),
                race_id: race_id.to_string(),
                slot: nominee.slot,
                athlete,
                key,
                source,
                finish,
            }
        })
    }

    fn nominee<'c>(&self, slot: Slot, name: &'c str, primary_key: Option<&str>) -> Nominee<'c> {
        let key = self.normalizer.normalize(name);
        let standing = if !key.is_empty() && primary_key == Some(key.as_str()) {
            Standing::Duplicate
        } else {
            match self.index.row(&key) {
                None => Standing::Absent,
                Some(row) if row.finish.is_finisher() => Standing::Finished(row.finish),
                Some(row) => Standing::Retired(row.finish),
            }
        };
        debug!(slot = %slot, athlete = name, key = %key, ?standing, "nominee matched");
        Nominee {
            slot,
            name,
            key,
            standing,
        }
    }
}

fn reason_label(reason: SubstitutionReason) -> &'static str {
    match reason {
        SubstitutionReason::NoShow => "no_show",
        SubstitutionReason::Retired => "retired",
    }
}

/// Unfilled slot. Absent nominees score as DNS, retired ones keep their own
/// non-finish, a duplicate slot is vacant.
fn unresolved(
    call_up: &CallUp,
    nominee: &Nominee<'_>,
    reason: UnresolvedReason,
) -> (Option<String>, String, EntrySource, Finish) {
    let label = match reason {
        UnresolvedReason::ReserveUnavailable => "reserve_unavailable",
        UnresolvedReason::ReserveAlreadyUsed => "reserve_already_used",
        UnresolvedReason::DuplicateNominee => "duplicate_nominee",
    };
    obs::emit_unresolved(&call_up.team_id, &nominee.slot.to_string(), label);
    METRICS.inc_unresolved_slots();

    let source = EntrySource::Unresolved { reason };
    match nominee.standing {
        Standing::Duplicate => (None, String::new(), source, Finish::Dnf),
        Standing::Retired(finish) => (Some(nominee.name.to_string()), nominee.key.clone(), source, finish),
        Standing::Absent | Standing::Finished(_) => {
            (Some(nominee.name.to_string()), nominee.key.clone(), source, Finish::Dns)
        }
    }
}
