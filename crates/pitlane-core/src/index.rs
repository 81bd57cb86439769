//! Per-race lookup tables.
//!
//! Built once per sub-race before resolution and scoring so every lookup
//! (classification, qualifying, roster, teammates, awards) is a map hit on
//! the normalized athlete key.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::domain::{Athlete, ClassificationRow, Degradation, LapTime, QualifyingRow};
use crate::normalize::NameNormalizer;
use crate::race::SubRaceInput;

/// An athlete key together with the lap that earned a distinction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedHolder {
    pub key: String,
    pub athlete: String,
    pub time: Option<LapTime>,
}

/// Indexed view of one sub-race.
#[derive(Debug)]
pub struct RaceIndex<'a> {
    classification: HashMap<String, &'a ClassificationRow>,
    quali: HashMap<String, &'a QualifyingRow>,
    roster: HashMap<String, &'a Athlete>,
    /// Real-world team -> member keys, roster order.
    team_members: HashMap<&'a str, Vec<String>>,
    base_marks: HashMap<String, f64>,
    pole: Option<TimedHolder>,
    fastest_lap: Option<TimedHolder>,
    driver_of_the_day: String,
    fastest_pit_stop: String,
    top_speed: String,
    quali_record_holder: Option<String>,
    race_record_holder: Option<String>,
    has_qualifying: bool,
    degradations: Vec<Degradation>,
}

impl<'a> RaceIndex<'a> {
    /// Index one sub-race. First occurrence of a key wins; unusable rows are
    /// skipped and noted as degradations.
    pub fn build(
        sub: &'a SubRaceInput,
        roster: &'a [Athlete],
        base_marks: &BTreeMap<String, f64>,
        normalizer: &NameNormalizer,
    ) -> Self {
        let mut degradations = Vec::new();

        let mut classification = HashMap::new();
        for row in &sub.classification {
            let key = normalizer.normalize(&row.name);
            if key.is_empty() {
                degradations.push(Degradation::new(&row.name, "name", "unparseable athlete name"));
                continue;
            }
            classification.entry(key).or_insert(row);
        }

        let mut quali = HashMap::new();
        for row in &sub.qualifying {
            let key = normalizer.normalize(&row.name);
            if key.is_empty() || row.position == 0 {
                degradations.push(Degradation::new(&row.name, "qualifying", "unusable qualifying row"));
                continue;
            }
            quali.entry(key).or_insert(row);
        }

        let mut roster_by_key = HashMap::new();
        let mut team_members: HashMap<&'a str, Vec<String>> = HashMap::new();
        for athlete in roster {
            let key = normalizer.normalize(&athlete.display_name);
            if key.is_empty() {
                continue;
            }
            roster_by_key.entry(key.clone()).or_insert(athlete);
            let id_key = normalizer.normalize(&athlete.id);
            if !id_key.is_empty() {
                roster_by_key.entry(id_key).or_insert(athlete);
            }
            team_members.entry(athlete.team.as_str()).or_default().push(key);
        }

        let mut marks = HashMap::new();
        for (name, mark) in base_marks {
            let key = normalizer.normalize(name);
            if key.is_empty() || !mark.is_finite() {
                degradations.push(Degradation::new(name, "base_score", "unusable base mark"));
                continue;
            }
            marks.insert(key, *mark);
        }

        let pole = sub
            .qualifying
            .iter()
            .find(|r| r.position == 1)
            .and_then(|row| {
                let key = normalizer.normalize(&row.name);
                if key.is_empty() {
                    return None;
                }
                let time = parse_lap(row.time.as_deref(), &row.name, "pole_time", &mut degradations);
                Some(TimedHolder {
                    key,
                    athlete: row.name.clone(),
                    time,
                })
            });

        let fastest_lap = match sub.awards.fastest_lap.as_deref() {
            Some(name) => {
                let key = normalizer.normalize(name);
                let time = classification
                    .get(&key)
                    .and_then(|row| row.best_lap.as_deref())
                    .and_then(LapTime::parse);
                (!key.is_empty()).then(|| TimedHolder {
                    key,
                    athlete: name.to_string(),
                    time,
                })
            }
            None => derive_fastest_lap(&sub.classification, normalizer, &mut degradations),
        };

        let award_key = |name: &Option<String>| normalizer.normalize_opt(name.as_deref());

        debug!(
            classified = classification.len(),
            qualified = quali.len(),
            roster = roster_by_key.len(),
            "race index built"
        );

        Self {
            classification,
            quali,
            roster: roster_by_key,
            team_members,
            base_marks: marks,
            pole,
            fastest_lap,
            driver_of_the_day: award_key(&sub.awards.driver_of_the_day),
            fastest_pit_stop: award_key(&sub.awards.fastest_pit_stop),
            top_speed: award_key(&sub.awards.top_speed),
            quali_record_holder: None,
            race_record_holder: None,
            has_qualifying: !sub.qualifying.is_empty(),
            degradations,
        }
    }

    /// Mark which athletes hold the circuit records after the conditional write.
    pub fn with_record_holders(mut self, quali: Option<String>, race: Option<String>) -> Self {
        self.quali_record_holder = quali;
        self.race_record_holder = race;
        self
    }

    /// Classification row for `key`; `None` for an empty key.
    pub fn row(&self, key: &str) -> Option<&'a ClassificationRow> {
        if key.is_empty() {
            return None;
        }
        self.classification.get(key).copied()
    }

    /// Whether the sub-race has any classification rows.
    pub fn is_classified(&self) -> bool {
        !self.classification.is_empty()
    }

    /// Whether a qualifying table was supplied.
    pub fn has_qualifying(&self) -> bool {
        self.has_qualifying
    }

    /// Qualifying position for `key`; `None` for an empty key.
    pub fn quali_position(&self, key: &str) -> Option<u32> {
        if key.is_empty() {
            return None;
        }
        self.quali.get(key).map(|r| r.position)
    }

    /// External base mark for `key`, if one was supplied.
    pub fn base_mark(&self, key: &str) -> Option<f64> {
        self.base_marks.get(key).copied()
    }

    /// Other members of `key`'s real-world team, in roster order.
    pub fn teammates(&self, key: &str) -> Vec<&str> {
        let Some(athlete) = self.roster.get(key) else {
            return Vec::new();
        };
        self.team_members
            .get(athlete.team.as_str())
            .map(|members| {
                members
                    .iter()
                    .filter(|m| {
                        self.roster
                            .get(m.as_str())
                            .map_or(true, |a| a.id != athlete.id)
                    })
                    .map(String::as_str)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The qualifying P1 athlete and their lap.
    pub fn pole(&self) -> Option<&TimedHolder> {
        self.pole.as_ref()
    }

    /// The fastest-lap holder, award override first.
    pub fn fastest_lap(&self) -> Option<&TimedHolder> {
        self.fastest_lap.as_ref()
    }

    /// Whether `key` is the pole sitter.
    pub fn is_pole(&self, key: &str) -> bool {
        !key.is_empty() && self.pole.as_ref().is_some_and(|p| p.key == key)
    }

    /// Whether `key` set the fastest lap.
    pub fn has_fastest_lap(&self, key: &str) -> bool {
        !key.is_empty() && self.fastest_lap.as_ref().is_some_and(|f| f.key == key)
    }

    /// Whether `key` holds the qualifying record after this race's write.
    pub fn holds_quali_record(&self, key: &str) -> bool {
        !key.is_empty() && self.quali_record_holder.as_deref() == Some(key)
    }

    /// Whether `key` holds the race lap record after this race's write.
    pub fn holds_race_record(&self, key: &str) -> bool {
        !key.is_empty() && self.race_record_holder.as_deref() == Some(key)
    }

    /// Whether `key` won driver of the day.
    pub fn is_driver_of_the_day(&self, key: &str) -> bool {
        !key.is_empty() && self.driver_of_the_day == key
    }

    /// Whether `key`'s crew set the fastest pit stop.
    pub fn has_fastest_pit_stop(&self, key: &str) -> bool {
        !key.is_empty() && self.fastest_pit_stop == key
    }

    /// Whether `key` recorded the top speed.
    pub fn has_top_speed(&self, key: &str) -> bool {
        !key.is_empty() && self.top_speed == key
    }

    /// Notes collected while building the index.
    pub fn degradations(&self) -> &[Degradation] {
        &self.degradations
    }
}

fn parse_lap(
    raw: Option<&str>,
    subject: &str,
    field: &str,
    degradations: &mut Vec<Degradation>,
) -> Option<LapTime> {
    let raw = raw?;
    let parsed = LapTime::parse(raw);
    if parsed.is_none() {
        degradations.push(Degradation::new(subject, field, format!("unparseable lap time {raw:?}")));
    }
    parsed
}

/// Fastest lap from the `best_lap` column; ties go to the higher-classified row.
fn derive_fastest_lap(
    rows: &[ClassificationRow],
    normalizer: &NameNormalizer,
    degradations: &mut Vec<Degradation>,
) -> Option<TimedHolder> {
    let mut best: Option<(LapTime, &ClassificationRow)> = None;
    for row in rows {
        let Some(time) = parse_lap(row.best_lap.as_deref(), &row.name, "best_lap", degradations) else {
            continue;
        };
        if best.map_or(true, |(t, _)| time < t) {
            best = Some((time, row));
        }
    }
    let (time, row) = best?;
    let key = normalizer.normalize(&row.name);
    (!key.is_empty()).then(|| TimedHolder {
        key,
        athlete: row.name.clone(),
        time: Some(time),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Finish;
    use crate::normalize::NameKeyMode;

    fn roster() -> Vec<Athlete> {
        vec![
            Athlete::new("16", "Charles Leclerc", "Ferrari"),
            Athlete::new("44", "Lewis Hamilton", "Ferrari"),
            Athlete::new("4", "Lando Norris", "McLaren"),
            Athlete::new("81", "Oscar Piastri", "McLaren"),
            Athlete::new("1", "Max Verstappen", "Red Bull"),
        ]
    }

    fn sub_race() -> SubRaceInput {
        SubRaceInput {
            qualifying: vec![
                QualifyingRow::new(1, "Charles Leclerc").with_time("1:19.327"),
                QualifyingRow::new(2, "Lando Norris").with_time("1:19.436"),
                QualifyingRow::new(3, "Lewis Hamilton").with_time("bad"),
            ],
            classification: vec![
                ClassificationRow::new("Lando Norris", Finish::Classified(1)).with_best_lap("1:21.002"),
                ClassificationRow::new("Charles LECLERC", Finish::Classified(2)).with_best_lap("1:20.998"),
                ClassificationRow::new("Lewis Hamilton", Finish::Dnf).with_best_lap("1:20.998"),
                ClassificationRow::new("Lando Norris", Finish::Classified(9)),
            ],
            awards: Default::default(),
        }
    }

    #[test]
    fn first_classification_row_wins() {
        let sub = sub_race();
        let roster = roster();
        let n = NameNormalizer::new(NameKeyMode::Surname);
        let idx = RaceIndex::build(&sub, &roster, &BTreeMap::new(), &n);
        assert_eq!(idx.row("norris").unwrap().finish, Finish::Classified(1));
        assert_eq!(idx.row("leclerc").unwrap().finish, Finish::Classified(2));
        assert!(idx.row("").is_none());
    }

    #[test]
    fn pole_and_fastest_lap_are_derived() {
        let sub = sub_race();
        let roster = roster();
        let n = NameNormalizer::new(NameKeyMode::Surname);
        let idx = RaceIndex::build(&sub, &roster, &BTreeMap::new(), &n);

        let pole = idx.pole().unwrap();
        assert_eq!(pole.key, "leclerc");
        assert_eq!(pole.time.unwrap().as_millis(), 79_327);

        // Leclerc and Hamilton share the time; Leclerc is classified higher.
        let fastest = idx.fastest_lap().unwrap();
        assert_eq!(fastest.key, "leclerc");
        assert!(idx.has_fastest_lap("leclerc"));
        assert!(!idx.has_fastest_lap(""));
    }

    #[test]
    fn teammates_exclude_self() {
        let sub = sub_race();
        let roster = roster();
        let n = NameNormalizer::new(NameKeyMode::Surname);
        let idx = RaceIndex::build(&sub, &roster, &BTreeMap::new(), &n);
        assert_eq!(idx.teammates("leclerc"), vec!["hamilton"]);
        assert_eq!(idx.teammates("piastri"), vec!["norris"]);
        assert!(idx.teammates("verstappen").is_empty());
        assert!(idx.teammates("unknown").is_empty());
    }

    #[test]
    fn roster_resolves_by_id_too() {
        let sub = sub_race();
        let roster = roster();
        let n = NameNormalizer::new(NameKeyMode::Surname);
        let idx = RaceIndex::build(&sub, &roster, &BTreeMap::new(), &n);
        assert_eq!(idx.teammates("16"), vec!["hamilton"]);
    }

    #[test]
    fn malformed_cells_degrade() {
        let sub = sub_race();
        let roster = roster();
        let n = NameNormalizer::new(NameKeyMode::Surname);
        let marks = BTreeMap::from([("Norris".to_string(), f64::NAN)]);
        let idx = RaceIndex::build(&sub, &roster, &marks, &n);
        assert!(idx.base_mark("norris").is_none());
        assert!(idx.degradations().iter().any(|d| d.field == "base_score"));
        // Hamilton's quali time is bad but he is not on pole, so only the
        // classification laps are parsed here.
        assert_eq!(idx.quali_position("hamilton"), Some(3));
    }

    #[test]
    fn fastest_lap_award_overrides_derivation() {
        let mut sub = sub_race();
        sub.awards.fastest_lap = Some("Lando Norris".to_string());
        let roster = roster();
        let n = NameNormalizer::new(NameKeyMode::Surname);
        let idx = RaceIndex::build(&sub, &roster, &BTreeMap::new(), &n);
        let fastest = idx.fastest_lap().unwrap();
        assert_eq!(fastest.key, "norris");
        assert_eq!(fastest.time.unwrap().as_millis(), 81_002);
    }
}
