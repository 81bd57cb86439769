//! End-to-end scoring of one race event.
//!
//! `RaceInput` -> index -> resolve -> (records) -> evaluate -> rank, once for
//! the main race and once for the sprint. The only side effect is the
//! conditional circuit record write for the main race.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn, Instrument};

use pitlane_state::{CircuitRecordStore, RecordCandidate, RecordKind, RecordOutcome};

use crate::config::DisciplineProfile;
use crate::domain::{Degradation, Discipline, EffectiveEntry, PitlaneError, Result};
use crate::index::{RaceIndex, TimedHolder};
use crate::metrics::METRICS;
use crate::normalize::NameNormalizer;
use crate::obs;
use crate::race::{RaceInput, SubRaceKind};
use crate::ranking::{rank, RankedEntry};
use crate::resolver::CallUpResolver;
use crate::rules::{BonusEvaluator, RuleSet};

/// Resolved, scored and ranked sub-race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubRaceOutcome {
    pub kind: SubRaceKind,
    pub entries: Vec<EffectiveEntry>,
    pub ranking: Vec<RankedEntry>,
    #[serde(default)]
    pub degradations: Vec<Degradation>,
}

impl SubRaceOutcome {
    /// Season points earned per team in this sub-race.
    pub fn team_points(&self) -> BTreeMap<&str, f64> {
        let mut points = BTreeMap::new();
        for ranked in &self.ranking {
            *points.entry(ranked.record.team_id.as_str()).or_insert(0.0) += ranked.points;
        }
        points
    }
}

/// A conditional record write attempted during scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUpdate {
    pub kind: RecordKind,
    pub athlete: String,
    pub time_ms: u32,
    pub outcome: RecordOutcome,
}

/// Everything produced by scoring one race event. Frozen once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceOutcome {
    pub race_id: String,
    pub round: u32,
    pub discipline: Discipline,
    pub circuit_id: String,
    pub main: SubRaceOutcome,
    #[serde(default)]
    pub sprint: Option<SubRaceOutcome>,
    /// Team -> penalty for a late call-up in this race.
    #[serde(default)]
    pub late_penalties: BTreeMap<String, f64>,
    #[serde(default)]
    pub record_updates: Vec<RecordUpdate>,
}

impl RaceOutcome {
    pub fn sub_races(&self) -> impl Iterator<Item = &SubRaceOutcome> {
        std::iter::once(&self.main).chain(self.sprint.as_ref())
    }
}

/// Scores races against a shared circuit record store.
#[derive(Clone)]
pub struct ScoringPipeline {
    records: Arc<dyn CircuitRecordStore>,
}

/// Key of each record holder after the conditional writes.
#[derive(Debug, Default)]
struct RecordHolders {
    quali: Option<String>,
    race: Option<String>,
}

impl ScoringPipeline {
    pub fn new(records: Arc<dyn CircuitRecordStore>) -> Self {
        Self { records }
    }

    /// Score one race event.
    ///
    /// Fails only when the main classification is empty; every per-record
    /// problem is noted on the outcome instead.
    pub async fn score_race(&self, input: &RaceInput, profile: &DisciplineProfile) -> Result<RaceOutcome> {
        if input.main.classification.is_empty() {
            return Err(PitlaneError::ResultsUnavailable {
                race_id: input.race_id.clone(),
            });
        }
        let run_id = uuid::Uuid::new_v4().to_string();
        let span = obs::race_span(&run_id, input.discipline, &input.race_id);
        self.score_race_inner(input, profile).instrument(span).await
    }

    async fn score_race_inner(&self, input: &RaceInput, profile: &DisciplineProfile) -> Result<RaceOutcome> {
        if profile.discipline != input.discipline {
            warn!(
                profile = %profile.discipline,
                race = %input.discipline,
                "profile discipline differs from race discipline"
            );
        }
        obs::emit_race_started(&input.race_id, input.call_ups.len(), input.sprint.is_some());

        let normalizer = &profile.normalizer;
        let main_index = RaceIndex::build(&input.main, &input.roster, &input.base_marks, normalizer);

        let mut record_notes = Vec::new();
        let mut record_updates = Vec::new();
        let holders = self
            .update_records(input, &main_index, &mut record_updates, &mut record_notes)
            .await;
        let main_index = main_index.with_record_holders(holders.quali, holders.race);

        let mut main = score_sub_race(SubRaceKind::Main, input, main_index, &profile.main_rules, normalizer);
        main.degradations.extend(record_notes);
        main.degradations.extend(
            profile
                .warnings
                .iter()
                .map(|w| Degradation::new(&w.label, "rule", &w.reason)),
        );
        finish_sub_race(&input.race_id, &main);

        let sprint = match input.sprint.as_ref() {
            Some(sub) if sub.classification.is_empty() => {
                warn!(race_id = %input.race_id, "sprint has no classification, skipped");
                None
            }
            Some(sub) => {
                let index = RaceIndex::build(sub, &input.roster, &input.base_marks, normalizer);
                let outcome = score_sub_race(SubRaceKind::Sprint, input, index, &profile.sprint_rules, normalizer);
                finish_sub_race(&input.race_id, &outcome);
                Some(outcome)
            }
            None => None,
        };

        let late_penalties = late_penalties(input, &profile.main_rules);

        METRICS.inc_races_scored();
        info!(
            teams = main.entries.len() / 2,
            late = late_penalties.len(),
            records = record_updates.len(),
            "race scored"
        );

        Ok(RaceOutcome {
            race_id: input.race_id.clone(),
            round: input.round,
            discipline: input.discipline,
            circuit_id: input.circuit_id.clone(),
            main,
            sprint,
            late_penalties,
            record_updates,
        })
    }

    /// Offer the pole lap and the fastest race lap to the record store.
    /// Store failures leave the record rules inactive for this run.
    async fn update_records(
        &self,
        input: &RaceInput,
        index: &RaceIndex<'_>,
        updates: &mut Vec<RecordUpdate>,
        notes: &mut Vec<Degradation>,
    ) -> RecordHolders {
        let mut holders = RecordHolders::default();
        if input.circuit_id.trim().is_empty() {
            notes.push(Degradation::new(&input.race_id, "circuit_id", "no circuit, records skipped"));
            return holders;
        }

        let candidates = [
            (RecordKind::Qualifying, index.pole()),
            (RecordKind::Race, index.fastest_lap()),
        ];
        for (kind, holder) in candidates {
            let Some(TimedHolder {
                key,
                athlete,
                time: Some(time),
            }) = holder
            else {
                continue;
            };
            let candidate = RecordCandidate {
                circuit_id: input.circuit_id.clone(),
                kind,
                time_ms: time.as_millis(),
                athlete: athlete.clone(),
                race_id: input.race_id.clone(),
            };
            match self.records.record_if_faster(&candidate).await {
                Ok(outcome) => {
                    if let RecordOutcome::Improved { previous_ms } = outcome {
                        obs::emit_track_record(
                            &input.circuit_id,
                            &kind.to_string(),
                            athlete,
                            candidate.time_ms,
                            previous_ms,
                        );
                        METRICS.inc_track_records_broken();
                    }
                    if outcome.holds_record() {
                        match kind {
                            RecordKind::Qualifying => holders.quali = Some(key.clone()),
                            RecordKind::Race => holders.race = Some(key.clone()),
                        }
                    }
                    updates.push(RecordUpdate {
                        kind,
                        athlete: athlete.clone(),
                        time_ms: candidate.time_ms,
                        outcome,
                    });
                }
                Err(e) => {
                    obs::emit_record_store_error(&input.circuit_id, &e);
                    notes.push(Degradation::new(
                        &input.circuit_id,
                        format!("{kind}_track_record"),
                        format!("record store unavailable: {e}"),
                    ));
                }
            }
        }
        holders
    }
}

fn score_sub_race(
    kind: SubRaceKind,
    input: &RaceInput,
    index: RaceIndex<'_>,
    rules: &RuleSet,
    normalizer: &NameNormalizer,
) -> SubRaceOutcome {
    let resolution = CallUpResolver::new(&index, normalizer).resolve_all(&input.race_id, &input.call_ups);

    let mut degradations = index.degradations().to_vec();
    degradations.extend(resolution.notes);

    let evaluator = BonusEvaluator::new(rules, &index);
    let records = resolution
        .entries
        .iter()
        .map(|entry| evaluator.evaluate(entry, &mut degradations))
        .collect();

    SubRaceOutcome {
        kind,
        entries: resolution.entries,
        ranking: rank(records, &rules.points),
        degradations,
    }
}

fn finish_sub_race(race_id: &str, outcome: &SubRaceOutcome) {
    for note in &outcome.degradations {
        obs::emit_degradation(note);
    }
    METRICS.add_degradations(outcome.degradations.len() as u64);
    obs::emit_race_scored(race_id, outcome.kind, outcome.ranking.len(), outcome.degradations.len());
}

/// Penalty per team whose (first) call-up was late.
fn late_penalties(input: &RaceInput, rules: &RuleSet) -> BTreeMap<String, f64> {
    let mut penalties = BTreeMap::new();
    if rules.late_penalty == 0.0 {
        return penalties;
    }
    let mut seen = std::collections::HashSet::new();
    for call_up in &input.call_ups {
        if seen.insert(call_up.team_id.as_str()) && call_up.is_late(input.deadline) {
            penalties.insert(call_up.team_id.clone(), rules.late_penalty);
        }
    }
    penalties
}
