//! League configuration.
//!
//! One TOML file describes the league's teams and, per discipline, how names
//! are keyed, which misspellings to correct, and which rules deviate from the
//! built-in tables:
//!
//! ```toml
//! [league]
//! name = "Paddock Club"
//! teams = ["apex", "slipstream"]
//!
//! [disciplines.formula]
//! name_key = "surname"
//! corrections = { "Max Verstapen" = "Max Verstappen" }
//!
//! [disciplines.formula.rules]
//! pole_position = 4
//! points = "[25, 18, 15, 12, 10]"
//!
//! [disciplines.formula.sprint_rules]
//! driver_of_the_day = false
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{ConfigError, Discipline};
use crate::normalize::{NameKeyMode, NameNormalizer};
use crate::rules::{overlay, RuleSet, RuleTable, RuleWarning};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeagueSection {
    #[serde(default)]
    pub name: String,
    /// Teams listed here appear in standings even before scoring a point.
    #[serde(default)]
    pub teams: Vec<String>,
}

/// Per-discipline overrides. Everything is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisciplineConfig {
    #[serde(default)]
    pub name_key: Option<NameKeyMode>,
    #[serde(default)]
    pub corrections: BTreeMap<String, String>,
    /// Laid over the built-in main-race table.
    #[serde(default)]
    pub rules: RuleTable,
    /// Laid over the resolved main table plus the built-in sprint overrides.
    #[serde(default)]
    pub sprint_rules: RuleTable,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeagueConfig {
    #[serde(default)]
    pub league: LeagueSection,
    #[serde(default)]
    pub disciplines: BTreeMap<Discipline, DisciplineConfig>,
}

/// Everything scoring needs for one discipline, built once per run.
#[derive(Debug, Clone)]
pub struct DisciplineProfile {
    pub discipline: Discipline,
    pub normalizer: NameNormalizer,
    pub main_rules: RuleSet,
    pub sprint_rules: RuleSet,
    /// Rule entries that were ignored.
    pub warnings: Vec<RuleWarning>,
}

impl DisciplineProfile {
    /// Built-in tables, no corrections.
    pub fn defaults(discipline: Discipline) -> Self {
        LeagueConfig::default().profile(discipline)
    }
}

impl LeagueConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: LeagueConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&raw)?;
        debug!(path = %path.display(), teams = config.league.teams.len(), "league config loaded");
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for team in &self.league.teams {
            if team.trim().is_empty() {
                return Err(ConfigError::Invalid("empty team id in league.teams".to_string()));
            }
            if !seen.insert(team.as_str()) {
                return Err(ConfigError::Invalid(format!("team {team:?} listed twice")));
            }
        }
        Ok(())
    }

    /// Resolve the rule tables and normalizer for `discipline`.
    pub fn profile(&self, discipline: Discipline) -> DisciplineProfile {
        let overrides = self.disciplines.get(&discipline).cloned().unwrap_or_default();

        let main_table = overlay(&RuleSet::default_table(discipline), &overrides.rules);
        let sprint_table = overlay(
            &overlay(&main_table, &RuleSet::default_sprint_overrides(discipline)),
            &overrides.sprint_rules,
        );

        let main = RuleSet::from_table(&main_table);
        let sprint = RuleSet::from_table(&sprint_table);

        let mut warnings = main.warnings;
        for w in sprint.warnings {
            if !warnings.contains(&w) {
                warnings.push(w);
            }
        }
        for w in &warnings {
            warn!(discipline = %discipline, label = %w.label, reason = %w.reason, "rule ignored");
        }

        let mode = overrides
            .name_key
            .unwrap_or_else(|| NameKeyMode::default_for(discipline));
        let normalizer = NameNormalizer::new(mode).with_corrections(&overrides.corrections);

        DisciplineProfile {
            discipline,
            normalizer,
            main_rules: main.rules,
            sprint_rules: sprint.rules,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[league]
name = "Paddock Club"
teams = ["apex", "slipstream"]

[disciplines.formula]
corrections = { "Max Verstapen" = "Max Verstappen" }

[disciplines.formula.rules]
pole_position = 4
points = "[30, 20, 10]"
not_a_rule = 1

[disciplines.formula.sprint_rules]
points = "5, 3, 1"

[disciplines.moto]
name_key = "surname"

[disciplines.moto.rules]
top_speed = false
"#;

    #[test]
    fn overrides_are_layered_on_defaults() {
        let config = LeagueConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.league.teams, ["apex", "slipstream"]);

        let formula = config.profile(Discipline::Formula);
        assert_eq!(formula.main_rules.pole_position, Some(4.0));
        assert_eq!(formula.main_rules.fastest_lap, Some(2.0));
        assert_eq!(formula.main_rules.points.as_slice(), &[30.0, 20.0, 10.0]);
        assert_eq!(formula.sprint_rules.points.as_slice(), &[5.0, 3.0, 1.0]);
        assert_eq!(formula.sprint_rules.pole_position, Some(4.0));
        assert_eq!(formula.sprint_rules.driver_of_the_day, None);
        assert_eq!(formula.sprint_rules.late_penalty, 0.0);
        assert_eq!(formula.normalizer.normalize("max verstapen"), "verstappen");
    }

    #[test]
    fn unknown_labels_warn_once() {
        let config = LeagueConfig::from_toml_str(SAMPLE).unwrap();
        let formula = config.profile(Discipline::Formula);
        let unknown: Vec<_> = formula
            .warnings
            .iter()
            .filter(|w| w.label == "not_a_rule")
            .collect();
        assert_eq!(unknown.len(), 1);
    }

    #[test]
    fn name_key_and_disabled_rules() {
        let config = LeagueConfig::from_toml_str(SAMPLE).unwrap();
        let moto = config.profile(Discipline::Moto);
        assert_eq!(moto.normalizer.mode(), NameKeyMode::Surname);
        assert_eq!(moto.main_rules.top_speed, None);
        assert!(moto.warnings.is_empty());
    }

    #[test]
    fn defaults_without_config() {
        let moto = DisciplineProfile::defaults(Discipline::Moto);
        assert_eq!(moto.normalizer.mode(), NameKeyMode::FullName);
        assert_eq!(moto.main_rules.quali_top_stage_cutoff, Some(12));
        assert_eq!(moto.main_rules.points.as_slice().len(), 15);
        assert!(moto.warnings.is_empty());
    }

    #[test]
    fn duplicate_teams_are_rejected() {
        let err = LeagueConfig::from_toml_str("[league]\nteams = [\"a\", \"a\"]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = LeagueConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
