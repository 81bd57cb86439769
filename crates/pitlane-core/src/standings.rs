//! Season standings.
//!
//! Always recomputed from the full set of race outcomes. Nothing is carried
//! over between runs, so the same outcomes always give the same table (and
//! the same [`StandingsTable::digest`]).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{Discipline, Result};
use crate::obs;
use crate::pipeline::RaceOutcome;
use crate::race::SubRaceKind;

/// Which races a table covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StandingsScope {
    Discipline(Discipline),
    /// Both disciplines together.
    Combined,
}

impl StandingsScope {
    fn includes(&self, discipline: Discipline) -> bool {
        match self {
            StandingsScope::Discipline(d) => *d == discipline,
            StandingsScope::Combined => true,
        }
    }
}

impl std::fmt::Display for StandingsScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StandingsScope::Discipline(d) => write!(f, "{d}"),
            StandingsScope::Combined => f.write_str("combined"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingsRow {
    pub team_id: String,
    pub race_points: f64,
    pub sprint_points: f64,
    /// Late call-up penalties, already subtracted from `cumulative_points`.
    pub penalty: f64,
    pub cumulative_points: f64,
    /// 1-based.
    pub position: u32,
    pub gap_previous: f64,
    pub gap_leader: f64,
    /// Races the team was scored in.
    pub races: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingsTable {
    pub scope: StandingsScope,
    pub rows: Vec<StandingsRow>,
}

impl StandingsTable {
    /// Hex SHA-256 of the canonical JSON form.
    pub fn digest(&self) -> Result<String> {
        let bytes = serde_json::to_vec(self)?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }

    pub fn row(&self, team_id: &str) -> Option<&StandingsRow> {
        self.rows.iter().find(|r| r.team_id == team_id)
    }

    pub fn leader(&self) -> Option<&StandingsRow> {
        self.rows.first()
    }
}

#[derive(Debug, Default)]
struct Tally {
    race_points: f64,
    sprint_points: f64,
    penalty: f64,
    races: u32,
}

/// Builds standings tables for a league.
#[derive(Debug, Clone, Default)]
pub struct StandingsAggregator {
    teams: Vec<String>,
}

impl StandingsAggregator {
    /// `teams` always appear in the table, even without points.
    pub fn new(teams: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            teams: teams.into_iter().map(Into::into).collect(),
        }
    }

    pub fn compute(&self, scope: StandingsScope, outcomes: &[RaceOutcome]) -> Result<StandingsTable> {
        // One outcome per race; a later copy of the same race replaces an earlier one.
        let mut races: BTreeMap<(Discipline, &str), &RaceOutcome> = BTreeMap::new();
        for outcome in outcomes.iter().filter(|o| scope.includes(o.discipline)) {
            races.insert((outcome.discipline, outcome.race_id.as_str()), outcome);
        }

        let mut tallies: BTreeMap<&str, Tally> = self
            .teams
            .iter()
            .map(|t| (t.as_str(), Tally::default()))
            .collect();

        for outcome in races.values() {
            let mut scored = BTreeSet::new();
            for sub in outcome.sub_races() {
                let is_sprint = sub.kind == SubRaceKind::Sprint;
                for (team, points) in sub.team_points() {
                    let tally = tallies.entry(team).or_default();
                    if is_sprint {
                        tally.sprint_points += points;
                    } else {
                        tally.race_points += points;
                    }
                    scored.insert(team);
                }
            }
            for (team, penalty) in &outcome.late_penalties {
                tallies.entry(team.as_str()).or_default().penalty += penalty;
            }
            for team in scored {
                if let Some(tally) = tallies.get_mut(team) {
                    tally.races += 1;
                }
            }
        }

        let mut rows: Vec<StandingsRow> = tallies
            .into_iter()
            .map(|(team, t)| StandingsRow {
                team_id: team.to_string(),
                race_points: t.race_points,
                sprint_points: t.sprint_points,
                penalty: t.penalty,
                cumulative_points: t.race_points + t.sprint_points - t.penalty,
                position: 0,
                gap_previous: 0.0,
                gap_leader: 0.0,
                races: t.races,
            })
            .collect();

        rows.sort_by(|a, b| {
            b.cumulative_points
                .total_cmp(&a.cumulative_points)
                .then(b.race_points.total_cmp(&a.race_points))
                .then_with(|| a.team_id.cmp(&b.team_id))
        });

        let leader = rows.first().map(|r| r.cumulative_points).unwrap_or(0.0);
        let mut previous = leader;
        for (i, row) in rows.iter_mut().enumerate() {
            row.position = i as u32 + 1;
            row.gap_previous = (previous - row.cumulative_points).max(0.0);
            row.gap_leader = leader - row.cumulative_points;
            previous = row.cumulative_points;
        }

        let table = StandingsTable { scope, rows };
        obs::emit_standings_computed(&scope.to_string(), table.rows.len(), &table.digest()?);
        Ok(table)
    }

    pub fn discipline(&self, discipline: Discipline, outcomes: &[RaceOutcome]) -> Result<StandingsTable> {
        self.compute(StandingsScope::Discipline(discipline), outcomes)
    }

    pub fn combined(&self, outcomes: &[RaceOutcome]) -> Result<StandingsTable> {
        self.compute(StandingsScope::Combined, outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntrySource, Finish, PerformanceRecord, Slot};
    use crate::pipeline::SubRaceOutcome;
    use crate::ranking::RankedEntry;

    fn ranked(team: &str, points: f64) -> RankedEntry {
        RankedEntry {
            rank: 1,
            points,
            record: PerformanceRecord {
                team_id: team.to_string(),
                slot: Slot::Primary,
                athlete: None,
                source: EntrySource::Nominee,
                finish: Finish::Classified(1),
                race_position: 1,
                quali_position: None,
                quali_stage: None,
                pole: false,
                quali_track_record: false,
                position_delta: 0,
                beat_teammate_quali: false,
                beat_teammate_race: false,
                fastest_lap: false,
                race_track_record: false,
                driver_of_the_day: false,
                fastest_pit_stop: false,
                top_speed: false,
                breakdown: Vec::new(),
                bonus_score: 0.0,
                base_score: 0.0,
                total_score: 0.0,
            },
        }
    }

    fn sub(kind: SubRaceKind, points: &[(&str, f64)]) -> SubRaceOutcome {
        SubRaceOutcome {
            kind,
            entries: Vec::new(),
            ranking: points.iter().map(|(t, p)| ranked(t, *p)).collect(),
            degradations: Vec::new(),
        }
    }

    fn outcome(discipline: Discipline, race_id: &str, main: &[(&str, f64)]) -> RaceOutcome {
        RaceOutcome {
            race_id: race_id.to_string(),
            round: 1,
            discipline,
            circuit_id: "c".to_string(),
            main: sub(SubRaceKind::Main, main),
            sprint: None,
            late_penalties: BTreeMap::new(),
            record_updates: Vec::new(),
        }
    }

    #[test]
    fn sums_race_sprint_and_penalties() {
        let mut r1 = outcome(Discipline::Formula, "r1", &[("a", 25.0), ("a", 10.0), ("b", 18.0)]);
        r1.sprint = Some(sub(SubRaceKind::Sprint, &[("b", 8.0), ("a", 7.0)]));
        r1.late_penalties.insert("a".to_string(), 5.0);
        let r2 = outcome(Discipline::Formula, "r2", &[("b", 25.0), ("a", 18.0)]);

        let table = StandingsAggregator::default()
            .discipline(Discipline::Formula, &[r1, r2])
            .unwrap();
        let a = table.row("a").unwrap();
        assert_eq!(a.race_points, 53.0);
        assert_eq!(a.sprint_points, 7.0);
        assert_eq!(a.penalty, 5.0);
        assert_eq!(a.cumulative_points, 55.0);
        assert_eq!(a.races, 2);

        let b = table.row("b").unwrap();
        assert_eq!(b.cumulative_points, 51.0);
        assert_eq!(b.position, 2);
        assert_eq!(b.gap_previous, 4.0);
        assert_eq!(b.gap_leader, 4.0);
    }

    #[test]
    fn configured_teams_without_points_are_listed() {
        let r1 = outcome(Discipline::Moto, "r1", &[("a", 5.0)]);
        let table = StandingsAggregator::new(["a", "idle"])
            .discipline(Discipline::Moto, &[r1])
            .unwrap();
        assert_eq!(table.rows.len(), 2);
        let idle = table.row("idle").unwrap();
        assert_eq!(idle.position, 2);
        assert_eq!(idle.races, 0);
        assert_eq!(idle.gap_leader, 5.0);
    }

    #[test]
    fn ties_fall_back_to_race_points_then_team_id() {
        let mut r1 = outcome(Discipline::Formula, "r1", &[("b", 10.0), ("a", 10.0), ("c", 6.0)]);
        r1.sprint = Some(sub(SubRaceKind::Sprint, &[("c", 4.0)]));
        let table = StandingsAggregator::default().combined(&[r1]).unwrap();
        let order: Vec<_> = table.rows.iter().map(|r| r.team_id.as_str()).collect();
        assert_eq!(order, ["a", "b", "c"]);
        assert_eq!(table.rows[1].gap_previous, 0.0);
    }

    #[test]
    fn combined_spans_both_disciplines() {
        let f = outcome(Discipline::Formula, "r1", &[("a", 25.0)]);
        let m = outcome(Discipline::Moto, "r1", &[("a", 20.0), ("b", 16.0)]);
        let outcomes = [f, m];
        let agg = StandingsAggregator::default();

        assert_eq!(agg.combined(&outcomes).unwrap().row("a").unwrap().cumulative_points, 45.0);
        assert_eq!(
            agg.discipline(Discipline::Formula, &outcomes).unwrap().row("a").unwrap().cumulative_points,
            25.0
        );
        assert!(agg.discipline(Discipline::Formula, &outcomes).unwrap().row("b").is_none());
    }

    #[test]
    fn rescored_race_replaces_previous_copy() {
        let first = outcome(Discipline::Formula, "r1", &[("a", 25.0)]);
        let rerun = outcome(Discipline::Formula, "r1", &[("a", 18.0)]);
        let table = StandingsAggregator::default().combined(&[first, rerun]).unwrap();
        assert_eq!(table.row("a").unwrap().race_points, 18.0);
    }

    #[test]
    fn digest_is_stable_across_recomputation() {
        let outcomes = [
            outcome(Discipline::Formula, "r2", &[("a", 25.0), ("b", 18.0)]),
            outcome(Discipline::Formula, "r1", &[("b", 25.0), ("a", 18.0)]),
        ];
        let agg = StandingsAggregator::new(["a", "b"]);
        let first = agg.combined(&outcomes).unwrap();
        let second = agg.combined(&outcomes).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.digest().unwrap(), second.digest().unwrap());
        assert_eq!(first.digest().unwrap().len(), 64);
    }

    #[test]
    fn empty_season_is_empty_table() {
        let table = StandingsAggregator::default().combined(&[]).unwrap();
        assert!(table.rows.is_empty());
        assert!(table.leader().is_none());
    }
}
