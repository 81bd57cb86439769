//! Structured lifecycle events for a scoring run.
//!
//! Every event carries an `event` field so log pipelines can filter on it.
//! Runs are wrapped in [`race_span`] so everything beneath carries the race.

use tracing::{info, warn};

use crate::domain::{Degradation, Discipline};
use crate::race::SubRaceKind;

/// `pitlane.race` span for one scoring run. Attach it with
/// `tracing::Instrument` so it follows the future across awaits.
pub fn race_span(run_id: &str, discipline: Discipline, race_id: &str) -> tracing::Span {
    tracing::info_span!(
        "pitlane.race",
        run_id = %run_id,
        discipline = %discipline,
        race_id = %race_id,
    )
}

pub fn emit_race_started(race_id: &str, teams: usize, sprint: bool) {
    info!(event = "race.started", race_id = %race_id, teams, sprint);
}

pub fn emit_race_scored(race_id: &str, kind: SubRaceKind, entries: usize, degradations: usize) {
    info!(
        event = "race.scored",
        race_id = %race_id,
        kind = %kind,
        entries,
        degradations,
    );
}

pub fn emit_substitution(team_id: &str, replaced: &str, reserve: &str, reason: &str) {
    info!(
        event = "callup.substituted",
        team_id = %team_id,
        replaced = %replaced,
        reserve = %reserve,
        reason = %reason,
    );
}

/// A slot could not be filled and will score as a non-finish.
pub fn emit_unresolved(team_id: &str, slot: &str, reason: &str) {
    warn!(event = "callup.unresolved", team_id = %team_id, slot = %slot, reason = %reason);
}

pub fn emit_track_record(circuit_id: &str, kind: &str, athlete: &str, time_ms: u32, previous_ms: Option<u32>) {
    info!(
        event = "record.broken",
        circuit_id = %circuit_id,
        kind = %kind,
        athlete = %athlete,
        time_ms,
        previous_ms = ?previous_ms,
    );
}

/// Record store unreachable; record bonuses stay inactive for this run.
pub fn emit_record_store_error(circuit_id: &str, error: &dyn std::fmt::Display) {
    warn!(event = "record.store_error", circuit_id = %circuit_id, error = %error);
}

pub fn emit_degradation(note: &Degradation) {
    warn!(
        event = "input.degraded",
        subject = %note.subject,
        field = %note.field,
        reason = %note.reason,
    );
}

pub fn emit_standings_computed(scope: &str, teams: usize, digest: &str) {
    info!(event = "standings.computed", scope = %scope, teams, digest = %digest);
}
