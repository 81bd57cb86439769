//! Shared race fixtures for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;

use pitlane_core::{
    Athlete, CallUp, ClassificationRow, Discipline, Finish, QualifyingRow, RaceInput,
    SubRaceInput,
};

pub const CIRCUIT: &str = "bahrain";

pub fn roster() -> Vec<Athlete> {
    [
        ("1", "Max Verstappen", "Red Bull"),
        ("22", "Yuki Tsunoda", "Red Bull"),
        ("4", "Lando Norris", "McLaren"),
        ("81", "Oscar Piastri", "McLaren"),
        ("16", "Charles Leclerc", "Ferrari"),
        ("44", "Lewis Hamilton", "Ferrari"),
        ("63", "George Russell", "Mercedes"),
        ("12", "Kimi Antonelli", "Mercedes"),
        ("14", "Fernando Alonso", "Aston Martin"),
        ("18", "Lance Stroll", "Aston Martin"),
        ("23", "Alex Albon", "Williams"),
        ("55", "Carlos Sainz", "Williams"),
    ]
    .into_iter()
    .map(|(id, name, team)| Athlete::new(id, name, team))
    .collect()
}

/// Stroll is absent all weekend; Leclerc takes pole and the fastest lap,
/// then retires.
pub fn main_race(pole_time: &str, leclerc_best: &str) -> SubRaceInput {
    let qualifying = [
        "Charles Leclerc",
        "Max Verstappen",
        "Lando Norris",
        "Oscar Piastri",
        "George Russell",
        "Lewis Hamilton",
        "Kimi Antonelli",
        "Fernando Alonso",
        "Carlos Sainz",
        "Alex Albon",
        "Yuki Tsunoda",
    ]
    .into_iter()
    .enumerate()
    .map(|(i, name)| {
        let row = QualifyingRow::new(i as u32 + 1, name);
        if i == 0 {
            row.with_time(pole_time)
        } else {
            row.with_time(format!("1:29.{:03}", i * 50))
        }
    })
    .collect();

    let mut classification: Vec<ClassificationRow> = [
        "Max Verstappen",
        "Lando Norris",
        "Oscar Piastri",
        "George Russell",
        "Lewis Hamilton",
        "Kimi Antonelli",
        "Carlos Sainz",
        "Alex Albon",
        "Yuki Tsunoda",
        "Fernando Alonso",
    ]
    .into_iter()
    .enumerate()
    .map(|(i, name)| {
        ClassificationRow::new(name, Finish::Classified(i as u32 + 1))
            .with_best_lap(format!("1:32.{:03}", 100 + i * 10))
    })
    .collect();
    classification.push(ClassificationRow::new("Charles Leclerc", Finish::Dnf).with_best_lap(leclerc_best));

    SubRaceInput {
        qualifying,
        classification,
        awards: Default::default(),
    }
}

pub fn sprint() -> SubRaceInput {
    let classification = [
        "Lando Norris",
        "Max Verstappen",
        "Charles Leclerc",
        "Oscar Piastri",
        "George Russell",
        "Lewis Hamilton",
        "Carlos Sainz",
        "Alex Albon",
    ]
    .into_iter()
    .enumerate()
    .map(|(i, name)| ClassificationRow::new(name, Finish::Classified(i as u32 + 1)))
    .collect();
    SubRaceInput {
        qualifying: Vec::new(),
        classification,
        awards: Default::default(),
    }
}

pub fn call_ups() -> Vec<CallUp> {
    vec![
        // Absent primary, reserve classified.
        CallUp::new("apex", "Lance Stroll", "Lando Norris", "Alex Albon"),
        // Pole sitter retires, reserve absent.
        CallUp::new("brake", "Charles Leclerc", "Lewis Hamilton", "Lance Stroll"),
        CallUp::new("chicane", "Max Verstappen", "Oscar Piastri", "Carlos Sainz"),
        CallUp::new("drs", "George Russell", "Kimi Antonelli", "Yuki Tsunoda"),
        CallUp::new("eau_rouge", "Fernando Alonso", "Carlos Sainz", "Lando Norris"),
        // Malformed: same athlete twice.
        CallUp::new("flatout", "Yuki Tsunoda", "TSUNODA", "George Russell"),
    ]
}

pub fn league_teams() -> Vec<String> {
    ["apex", "brake", "chicane", "drs", "eau_rouge", "flatout", "garage"]
        .into_iter()
        .map(String::from)
        .collect()
}

pub fn race(race_id: &str, round: u32, pole_time: &str, leclerc_best: &str) -> RaceInput {
    RaceInput {
        race_id: race_id.to_string(),
        round,
        discipline: Discipline::Formula,
        circuit_id: CIRCUIT.to_string(),
        main: main_race(pole_time, leclerc_best),
        sprint: None,
        call_ups: call_ups(),
        roster: roster(),
        base_marks: BTreeMap::new(),
        deadline: None,
    }
}
