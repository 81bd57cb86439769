//! Typed rule sets and the single conversion boundary for raw rule tables.
//!
//! League configuration stores rules as a loose label -> value table whose
//! values may be numbers, booleans, lists, or strings holding any of those
//! (older tables kept distributions as Python-style list literals). All of
//! that tolerance lives in [`RuleValue::parse`]; everything downstream sees
//! a [`RuleSet`] with typed, optional fields. A missing or unreadable rule
//! is simply inactive.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::Discipline;

/// Rule labels as they appear in configuration tables.
pub mod labels {
    pub const QUALI_TOP_STAGE_CUTOFF: &str = "quali_top_stage_cutoff";
    pub const QUALI_TOP_STAGE: &str = "quali_top_stage";
    pub const QUALI_INTERMEDIATE_STAGE_CUTOFF: &str = "quali_intermediate_stage_cutoff";
    pub const QUALI_INTERMEDIATE_STAGE: &str = "quali_intermediate_stage";
    pub const POLE_POSITION: &str = "pole_position";
    pub const QUALI_TRACK_RECORD: &str = "quali_track_record";
    pub const POSITION_DELTA_COEFFICIENT: &str = "position_delta_coefficient";
    pub const OVERTAKE_MIN_POSITION: &str = "overtake_min_position";
    pub const BEAT_TEAMMATE_QUALI: &str = "beat_teammate_quali";
    pub const BEAT_TEAMMATE_RACE: &str = "beat_teammate_race";
    pub const FASTEST_LAP: &str = "fastest_lap";
    pub const RACE_TRACK_RECORD: &str = "race_track_record";
    pub const DRIVER_OF_THE_DAY: &str = "driver_of_the_day";
    pub const FASTEST_PIT_STOP: &str = "fastest_pit_stop";
    pub const TOP_SPEED: &str = "top_speed";
    pub const POINTS: &str = "points";
    pub const LATE_PENALTY: &str = "late_penalty";

    pub const ALL: [&str; 17] = [
        QUALI_TOP_STAGE_CUTOFF,
        QUALI_TOP_STAGE,
        QUALI_INTERMEDIATE_STAGE_CUTOFF,
        QUALI_INTERMEDIATE_STAGE,
        POLE_POSITION,
        QUALI_TRACK_RECORD,
        POSITION_DELTA_COEFFICIENT,
        OVERTAKE_MIN_POSITION,
        BEAT_TEAMMATE_QUALI,
        BEAT_TEAMMATE_RACE,
        FASTEST_LAP,
        RACE_TRACK_RECORD,
        DRIVER_OF_THE_DAY,
        FASTEST_PIT_STOP,
        TOP_SPEED,
        POINTS,
        LATE_PENALTY,
    ];
}

/// A rule value as stored, before interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawRuleValue {
    Flag(bool),
    Number(f64),
    List(Vec<f64>),
    Text(String),
}

impl From<f64> for RawRuleValue {
    fn from(v: f64) -> Self {
        RawRuleValue::Number(v)
    }
}

impl From<Vec<f64>> for RawRuleValue {
    fn from(v: Vec<f64>) -> Self {
        RawRuleValue::List(v)
    }
}

impl From<&str> for RawRuleValue {
    fn from(v: &str) -> Self {
        RawRuleValue::Text(v.to_string())
    }
}

/// Label -> raw value, as read from configuration.
pub type RuleTable = BTreeMap<String, RawRuleValue>;

/// An interpreted rule value.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleValue {
    Scalar(f64),
    Distribution(Vec<f64>),
    Disabled,
}

/// A rule that could not be used as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleWarning {
    pub label: String,
    pub reason: String,
}

impl RuleValue {
    /// Interpret a raw value.
    ///
    /// Strings are tried, in order, as JSON (`"[25, 18]"`, `"3"`,
    /// `"false"`), as a legacy list literal (`"(25, 18, 15)"`,
    /// `"25,18,15"`, `"['25', '18']"`), and finally as a single number.
    pub fn parse(raw: &RawRuleValue) -> Result<RuleValue, String> {
        match raw {
            RawRuleValue::Flag(false) => Ok(RuleValue::Disabled),
            RawRuleValue::Flag(true) => Err("boolean `true` carries no value".to_string()),
            RawRuleValue::Number(v) => finite(*v).map(RuleValue::Scalar),
            RawRuleValue::List(values) => values
                .iter()
                .map(|v| finite(*v))
                .collect::<Result<Vec<_>, _>>()
                .map(RuleValue::Distribution),
            RawRuleValue::Text(text) => parse_text(text),
        }
    }

    fn as_scalar(&self) -> Option<f64> {
        match self {
            RuleValue::Scalar(v) => Some(*v),
            RuleValue::Distribution(values) if values.len() == 1 => Some(values[0]),
            _ => None,
        }
    }

    fn into_distribution(self) -> Option<Vec<f64>> {
        match self {
            RuleValue::Distribution(values) => Some(values),
            RuleValue::Scalar(v) => Some(vec![v]),
            RuleValue::Disabled => None,
        }
    }
}

fn finite(v: f64) -> Result<f64, String> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("non-finite number {v}"))
    }
}

fn parse_text(text: &str) -> Result<RuleValue, String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err("empty value".to_string());
    }

    if let Ok(structured) = serde_json::from_str::<RawRuleValue>(trimmed) {
        if !matches!(structured, RawRuleValue::Text(_)) {
            return RuleValue::parse(&structured);
        }
    }

    let inner = trimmed
        .trim_start_matches(['[', '('])
        .trim_end_matches([']', ')']);
    let parts: Vec<&str> = inner
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .map(|p| p.trim_matches(|c: char| c == '\'' || c == '"'))
        .filter(|p| !p.is_empty())
        .collect();
    let numbers = parts
        .iter()
        .map(|p| p.parse::<f64>().map_err(|_| format!("not a number: {p:?}")))
        .map(|r| r.and_then(finite))
        .collect::<Result<Vec<_>, _>>()?;

    match numbers.len() {
        0 => Err(format!("no numbers in {trimmed:?}")),
        1 => Ok(RuleValue::Scalar(numbers[0])),
        _ => Ok(RuleValue::Distribution(numbers)),
    }
}

/// Season points by finishing rank in the fantasy ranking.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointsDistribution(Vec<f64>);

impl PointsDistribution {
    pub fn new(points: Vec<f64>) -> Self {
        PointsDistribution(points)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// The table zero-padded to at least `field_size` entries.
    pub fn padded(&self, field_size: usize) -> Vec<f64> {
        let mut points = self.0.clone();
        if points.len() < field_size {
            points.resize(field_size, 0.0);
        }
        points
    }
}

/// Every rule that drives scoring, typed. `None` means inactive.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuleSet {
    pub quali_top_stage_cutoff: Option<u32>,
    pub quali_top_stage: Option<f64>,
    pub quali_intermediate_stage_cutoff: Option<u32>,
    pub quali_intermediate_stage: Option<f64>,
    pub pole_position: Option<f64>,
    pub quali_track_record: Option<f64>,
    pub position_delta_coefficient: Option<f64>,
    pub overtake_min_position: Option<u32>,
    pub beat_teammate_quali: Option<f64>,
    pub beat_teammate_race: Option<f64>,
    pub fastest_lap: Option<f64>,
    pub race_track_record: Option<f64>,
    pub driver_of_the_day: Option<f64>,
    pub fastest_pit_stop: Option<f64>,
    pub top_speed: Option<f64>,
    pub points: PointsDistribution,
    pub late_penalty: f64,
}

/// A built rule set plus whatever could not be used.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSetBuild {
    pub rules: RuleSet,
    pub warnings: Vec<RuleWarning>,
}

struct TableReader<'a> {
    table: &'a RuleTable,
    warnings: Vec<RuleWarning>,
}

impl TableReader<'_> {
    fn warn(&mut self, label: &str, reason: impl Into<String>) {
        self.warnings.push(RuleWarning {
            label: label.to_string(),
            reason: reason.into(),
        });
    }

    fn value(&mut self, label: &str) -> Option<RuleValue> {
        let raw = self.table.get(label)?;
        match RuleValue::parse(raw) {
            Ok(RuleValue::Disabled) => None,
            Ok(v) => Some(v),
            Err(reason) => {
                self.warn(label, reason);
                None
            }
        }
    }

    fn scalar(&mut self, label: &str) -> Option<f64> {
        let value = self.value(label)?;
        let scalar = value.as_scalar();
        if scalar.is_none() {
            self.warn(label, "expected a single number, found a list");
        }
        scalar
    }

    fn position(&mut self, label: &str) -> Option<u32> {
        let v = self.scalar(label)?;
        if v >= 1.0 && v.fract() == 0.0 && v <= u32::MAX as f64 {
            Some(v as u32)
        } else {
            self.warn(label, format!("expected a positive whole position, found {v}"));
            None
        }
    }

    fn distribution(&mut self, label: &str) -> Option<Vec<f64>> {
        self.value(label)?.into_distribution()
    }
}

impl RuleSet {
    /// Convert a raw table into a typed rule set. Total: bad entries become
    /// warnings and leave their rule inactive.
    pub fn from_table(table: &RuleTable) -> RuleSetBuild {
        let mut r = TableReader {
            table,
            warnings: Vec::new(),
        };

        let rules = RuleSet {
            quali_top_stage_cutoff: r.position(labels::QUALI_TOP_STAGE_CUTOFF),
            quali_top_stage: r.scalar(labels::QUALI_TOP_STAGE),
            quali_intermediate_stage_cutoff: r.position(labels::QUALI_INTERMEDIATE_STAGE_CUTOFF),
            quali_intermediate_stage: r.scalar(labels::QUALI_INTERMEDIATE_STAGE),
            pole_position: r.scalar(labels::POLE_POSITION),
            quali_track_record: r.scalar(labels::QUALI_TRACK_RECORD),
            position_delta_coefficient: r.scalar(labels::POSITION_DELTA_COEFFICIENT),
            overtake_min_position: r.position(labels::OVERTAKE_MIN_POSITION),
            beat_teammate_quali: r.scalar(labels::BEAT_TEAMMATE_QUALI),
            beat_teammate_race: r.scalar(labels::BEAT_TEAMMATE_RACE),
            fastest_lap: r.scalar(labels::FASTEST_LAP),
            race_track_record: r.scalar(labels::RACE_TRACK_RECORD),
            driver_of_the_day: r.scalar(labels::DRIVER_OF_THE_DAY),
            fastest_pit_stop: r.scalar(labels::FASTEST_PIT_STOP),
            top_speed: r.scalar(labels::TOP_SPEED),
            points: PointsDistribution::new(r.distribution(labels::POINTS).unwrap_or_default()),
            late_penalty: r.scalar(labels::LATE_PENALTY).unwrap_or(0.0),
        };

        for label in table.keys() {
            if !labels::ALL.contains(&label.as_str()) {
                r.warn(label, "unknown rule label");
            }
        }

        RuleSetBuild {
            rules,
            warnings: r.warnings,
        }
    }

    /// Built-in main-race table for a discipline.
    pub fn default_table(discipline: Discipline) -> RuleTable {
        let mut t = RuleTable::new();
        let mut set = |label: &str, value: RawRuleValue| {
            t.insert(label.to_string(), value);
        };
        match discipline {
            Discipline::Formula => {
                set(labels::QUALI_TOP_STAGE_CUTOFF, 10.0.into());
                set(labels::QUALI_TOP_STAGE, 3.0.into());
                set(labels::QUALI_INTERMEDIATE_STAGE_CUTOFF, 15.0.into());
                set(labels::QUALI_INTERMEDIATE_STAGE, 1.0.into());
                set(labels::DRIVER_OF_THE_DAY, 2.0.into());
                set(labels::FASTEST_PIT_STOP, 1.0.into());
                set(
                    labels::POINTS,
                    vec![25.0, 18.0, 15.0, 12.0, 10.0, 8.0, 6.0, 4.0, 2.0, 1.0].into(),
                );
            }
            Discipline::Moto => {
                set(labels::QUALI_TOP_STAGE_CUTOFF, 12.0.into());
                set(labels::QUALI_TOP_STAGE, 3.0.into());
                set(labels::TOP_SPEED, 1.0.into());
                set(
                    labels::POINTS,
                    vec![
                        25.0, 20.0, 16.0, 13.0, 11.0, 10.0, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0,
                        2.0, 1.0,
                    ]
                    .into(),
                );
            }
        }
        set(labels::POLE_POSITION, 3.0.into());
        set(labels::QUALI_TRACK_RECORD, 2.0.into());
        set(labels::POSITION_DELTA_COEFFICIENT, 1.0.into());
        set(labels::OVERTAKE_MIN_POSITION, 10.0.into());
        set(labels::BEAT_TEAMMATE_QUALI, 2.0.into());
        set(labels::BEAT_TEAMMATE_RACE, 2.0.into());
        set(labels::FASTEST_LAP, 2.0.into());
        set(labels::RACE_TRACK_RECORD, 2.0.into());
        set(labels::LATE_PENALTY, 5.0.into());
        t
    }

    /// Built-in sprint overrides, layered over the main table.
    pub fn default_sprint_overrides(discipline: Discipline) -> RuleTable {
        let points = match discipline {
            Discipline::Formula => vec![8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0],
            Discipline::Moto => vec![12.0, 9.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0],
        };
        RuleTable::from([
            (labels::POINTS.to_string(), RawRuleValue::List(points)),
            (labels::DRIVER_OF_THE_DAY.to_string(), RawRuleValue::Flag(false)),
            (labels::FASTEST_PIT_STOP.to_string(), RawRuleValue::Flag(false)),
            (labels::LATE_PENALTY.to_string(), RawRuleValue::Flag(false)),
        ])
    }
}

/// `base` with every entry of `overrides` replacing it.
pub fn overlay(base: &RuleTable, overrides: &RuleTable) -> RuleTable {
    let mut merged = base.clone();
    merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}
