//! Athletes and the two race disciplines.

use serde::{Deserialize, Serialize};

/// A racing series scored by the league. Both are structurally identical;
/// they differ only in default rules and how names are keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Discipline {
    /// Single-seater car racing.
    Formula,
    /// Motorcycle grand prix racing.
    Moto,
}

impl Discipline {
    pub const ALL: [Discipline; 2] = [Discipline::Formula, Discipline::Moto];

    pub fn as_str(&self) -> &'static str {
        match self {
            Discipline::Formula => "formula",
            Discipline::Moto => "moto",
        }
    }
}

impl std::fmt::Display for Discipline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Discipline {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "formula" | "f1" => Ok(Discipline::Formula),
            "moto" | "motogp" => Ok(Discipline::Moto),
            other => Err(format!("unknown discipline: {other}")),
        }
    }
}

/// A roster entry: one real-world competitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Athlete {
    /// Stable identifier from the roster source.
    pub id: String,
    pub display_name: String,
    /// Real-world team, used to find teammates.
    pub team: String,
}

impl Athlete {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        team: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            team: team.into(),
        }
    }
}
