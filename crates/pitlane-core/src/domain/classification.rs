//! Scraped session results.
//!
//! Rows arrive already tabulated; this module only gives them types. Every
//! conversion here is total: anything that cannot be read as a finishing
//! position becomes a non-finish, anything that cannot be read as a lap time
//! becomes `None`.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Sentinel race position shared by every non-finishing state.
pub const DNF_POSITION: u32 = 99;

/// How an athlete's race ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "FinishRepr", into = "FinishRepr")]
pub enum Finish {
    Classified(u32),
    /// Did not finish (retired, not classified).
    Dnf,
    /// Disqualified.
    Dq,
    /// Did not start.
    Dns,
}

impl Finish {
    /// Read a position cell: `"3"`, `"DNF"`, `"RET"`, `"DSQ"`, `"DNS"`, ...
    ///
    /// Unknown codes and out-of-range numbers are non-finishes.
    pub fn parse(raw: &str) -> Finish {
        let cell = raw.trim().trim_end_matches('.').to_ascii_uppercase();
        match cell.as_str() {
            "DNS" | "WD" | "DNQ" | "DNPQ" => Finish::Dns,
            "DQ" | "DSQ" | "EX" | "EXC" => Finish::Dq,
            _ => match cell.parse::<u32>() {
                Ok(p) => Finish::from_position(p),
                Err(_) => Finish::Dnf,
            },
        }
    }

    pub fn from_position(position: u32) -> Finish {
        if position == 0 || position >= DNF_POSITION {
            Finish::Dnf
        } else {
            Finish::Classified(position)
        }
    }

    /// Position used for sorting and deltas; non-finishes map to the sentinel.
    pub fn position(&self) -> u32 {
        match self {
            Finish::Classified(p) => *p,
            _ => DNF_POSITION,
        }
    }

    pub fn is_finisher(&self) -> bool {
        matches!(self, Finish::Classified(_))
    }
}

impl std::fmt::Display for Finish {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Finish::Classified(p) => write!(f, "P{p}"),
            Finish::Dnf => f.write_str("DNF"),
            Finish::Dq => f.write_str("DQ"),
            Finish::Dns => f.write_str("DNS"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum FinishRepr {
    Position(u32),
    Code(String),
}

impl TryFrom<FinishRepr> for Finish {
    type Error = std::convert::Infallible;

    fn try_from(repr: FinishRepr) -> std::result::Result<Self, Self::Error> {
        Ok(match repr {
            FinishRepr::Position(p) => Finish::from_position(p),
            FinishRepr::Code(code) => Finish::parse(&code),
        })
    }
}

impl From<Finish> for FinishRepr {
    fn from(finish: Finish) -> Self {
        match finish {
            Finish::Classified(p) => FinishRepr::Position(p),
            other => FinishRepr::Code(other.to_string()),
        }
    }
}

/// A lap time in whole milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LapTime(u32);

fn lap_time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:(?P<min>\d{1,2})\s*[:'′]\s*)?(?P<sec>\d{1,3})(?:[.,](?P<frac>\d{1,3}))?$")
            .expect("lap time pattern is valid")
    })
}

impl LapTime {
    pub fn from_millis(ms: u32) -> Self {
        LapTime(ms)
    }

    pub fn as_millis(&self) -> u32 {
        self.0
    }

    /// Parse `1:28.204`, `1'28.204` or `88.204`. Gaps (`+1.234`), zero and
    /// impossible values (`1:75.000`) yield `None`.
    pub fn parse(raw: &str) -> Option<LapTime> {
        let caps = lap_time_pattern().captures(raw.trim())?;
        let minutes: u32 = caps.name("min").map_or(Ok(0), |m| m.as_str().parse()).ok()?;
        let seconds: u32 = caps.name("sec")?.as_str().parse().ok()?;
        if caps.name("min").is_some() && seconds >= 60 {
            return None;
        }
        let millis = match caps.name("frac") {
            Some(frac) => {
                let digits = frac.as_str();
                let scale = 10u32.pow(3 - digits.len() as u32);
                digits.parse::<u32>().ok()? * scale
            }
            None => 0,
        };
        let total = (minutes * 60 + seconds) * 1000 + millis;
        (total > 0).then_some(LapTime(total))
    }
}

impl std::fmt::Display for LapTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let minutes = self.0 / 60_000;
        let seconds = (self.0 % 60_000) / 1000;
        let millis = self.0 % 1000;
        write!(f, "{minutes}:{seconds:02}.{millis:03}")
    }
}

/// One row of a race (or sprint) classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRow {
    /// Athlete name exactly as scraped.
    pub name: String,
    pub finish: Finish,
    /// Athlete's best lap in this race, as scraped.
    #[serde(default)]
    pub best_lap: Option<String>,
}

impl ClassificationRow {
    pub fn new(name: impl Into<String>, finish: Finish) -> Self {
        Self {
            name: name.into(),
            finish,
            best_lap: None,
        }
    }

    pub fn with_best_lap(mut self, lap: impl Into<String>) -> Self {
        self.best_lap = Some(lap.into());
        self
    }
}

/// One row of a qualifying classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualifyingRow {
    pub position: u32,
    pub name: String,
    /// Best qualifying lap, as scraped.
    #[serde(default)]
    pub time: Option<String>,
}

impl QualifyingRow {
    pub fn new(position: u32, name: impl Into<String>) -> Self {
        Self {
            position,
            name: name.into(),
            time: None,
        }
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_codes() {
        assert_eq!(Finish::parse("3"), Finish::Classified(3));
        assert_eq!(Finish::parse(" 12. "), Finish::Classified(12));
        assert_eq!(Finish::parse("RET"), Finish::Dnf);
        assert_eq!(Finish::parse("nc"), Finish::Dnf);
        assert_eq!(Finish::parse("DSQ"), Finish::Dq);
        assert_eq!(Finish::parse("DNS"), Finish::Dns);
        assert_eq!(Finish::parse("99"), Finish::Dnf);
        assert_eq!(Finish::parse("0"), Finish::Dnf);
    }

    #[test]
    fn non_finishes_share_sentinel_position() {
        for f in [Finish::Dnf, Finish::Dq, Finish::Dns] {
            assert_eq!(f.position(), DNF_POSITION);
            assert!(!f.is_finisher());
        }
        assert_eq!(Finish::Classified(4).position(), 4);
    }

    #[test]
    fn finish_deserializes_numbers_and_codes() {
        let rows: Vec<ClassificationRow> = serde_json::from_str(
            r#"[{"name": "A", "finish": 1}, {"name": "B", "finish": "DNF"}, {"name": "C", "finish": "7"}]"#,
        )
        .unwrap();
        assert_eq!(rows[0].finish, Finish::Classified(1));
        assert_eq!(rows[1].finish, Finish::Dnf);
        assert_eq!(rows[2].finish, Finish::Classified(7));
    }

    #[test]
    fn lap_time_formats() {
        assert_eq!(LapTime::parse("1:28.204").unwrap().as_millis(), 88_204);
        assert_eq!(LapTime::parse("1'28.204").unwrap().as_millis(), 88_204);
        assert_eq!(LapTime::parse("88.2").unwrap().as_millis(), 88_200);
        assert_eq!(LapTime::parse("1:28,2").unwrap().as_millis(), 88_200);
    }

    #[test]
    fn lap_time_rejects_garbage() {
        assert!(LapTime::parse("").is_none());
        assert!(LapTime::parse("+1.234").is_none());
        assert!(LapTime::parse("1:75.000").is_none());
        assert!(LapTime::parse("0.000").is_none());
        assert!(LapTime::parse("1 lap").is_none());
    }

    #[test]
    fn lap_time_display() {
        assert_eq!(LapTime::from_millis(88_204).to_string(), "1:28.204");
        assert_eq!(LapTime::from_millis(5_007).to_string(), "0:05.007");
    }
}
