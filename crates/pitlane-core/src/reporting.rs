//! Markdown and JSON renderings of scoring results.

use std::fmt::Write as _;

use serde::Serialize;

use crate::domain::{EntrySource, Result};
use crate::pipeline::{RaceOutcome, SubRaceOutcome};
use crate::standings::StandingsTable;

/// `25` for whole numbers, `2.5` otherwise.
pub fn format_points(points: f64) -> String {
    if points.fract() == 0.0 {
        format!("{points:.0}")
    } else {
        format!("{points:.2}")
            .trim_end_matches('0')
            .to_string()
    }
}

fn source_label(source: &EntrySource) -> String {
    match source {
        EntrySource::Nominee => "nominee".to_string(),
        EntrySource::Substituted { replaced, .. } => format!("for {replaced}"),
        EntrySource::Unresolved { .. } => "unresolved".to_string(),
    }
}

/// Ranking table of one sub-race.
pub fn render_ranking_md(race_id: &str, outcome: &SubRaceOutcome) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "## {race_id} ({})\n", outcome.kind);
    md.push_str("| Rank | Team | Slot | Athlete | Source | Finish | Score | Points |\n");
    md.push_str("|---:|---|---|---|---|---|---:|---:|\n");
    for r in &outcome.ranking {
        let rec = &r.record;
        let _ = writeln!(
            md,
            "| {} | {} | {} | {} | {} | {} | {} | {} |",
            r.rank,
            rec.team_id,
            rec.slot,
            rec.athlete_label(),
            source_label(&rec.source),
            rec.finish,
            format_points(rec.total_score),
            format_points(r.points),
        );
    }
    if !outcome.degradations.is_empty() {
        let _ = writeln!(md, "\n{} field(s) defaulted:\n", outcome.degradations.len());
        for d in &outcome.degradations {
            let _ = writeln!(md, "- {} `{}`: {}", d.subject, d.field, d.reason);
        }
    }
    md
}

/// Main and sprint rankings plus record updates.
pub fn render_race_md(outcome: &RaceOutcome) -> String {
    let mut md = String::new();
    let _ = writeln!(
        md,
        "# {} round {} ({})\n",
        outcome.discipline, outcome.round, outcome.circuit_id
    );
    for sub in outcome.sub_races() {
        md.push_str(&render_ranking_md(&outcome.race_id, sub));
        md.push('\n');
    }
    for update in &outcome.record_updates {
        let _ = writeln!(
            md,
            "- {} record: {} {} ms ({:?})",
            update.kind, update.athlete, update.time_ms, update.outcome
        );
    }
    for (team, penalty) in &outcome.late_penalties {
        let _ = writeln!(md, "- late call-up: {team} -{}", format_points(*penalty));
    }
    md
}

pub fn render_standings_md(table: &StandingsTable) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "# Standings ({})\n", table.scope);
    md.push_str("| Pos | Team | Race | Sprint | Penalty | Total | Gap prev | Gap leader |\n");
    md.push_str("|---:|---|---:|---:|---:|---:|---:|---:|\n");
    for row in &table.rows {
        let _ = writeln!(
            md,
            "| {} | {} | {} | {} | {} | {} | {} | {} |",
            row.position,
            row.team_id,
            format_points(row.race_points),
            format_points(row.sprint_points),
            format_points(row.penalty),
            format_points(row.cumulative_points),
            format_points(row.gap_previous),
            format_points(row.gap_leader),
        );
    }
    md
}

/// Pretty JSON with a trailing newline.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    Ok(json)
}
