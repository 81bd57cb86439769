//! Bonus rule evaluation.
//!
//! Turns one [`EffectiveEntry`] into a [`PerformanceRecord`] by applying every
//! active rule of a [`RuleSet`] against the indexed race. Each rule is
//! independent: a rule whose inputs are missing simply does not fire.

use tracing::debug;

use crate::domain::{
    AppliedBonus, BonusRule, Degradation, EffectiveEntry, PerformanceRecord, QualiStage,
    DNF_SCORE,
};
use crate::index::RaceIndex;
use crate::rules::ruleset::RuleSet;

/// Evaluates entries of one sub-race against one rule set.
pub struct BonusEvaluator<'r, 'a> {
    rules: &'r RuleSet,
    index: &'r RaceIndex<'a>,
}

/// Head-to-head outcome against the real-world teammate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct HeadToHead {
    quali: bool,
    race: bool,
}

impl<'r, 'a> BonusEvaluator<'r, 'a> {
    pub fn new(rules: &'r RuleSet, index: &'r RaceIndex<'a>) -> Self {
        Self { rules, index }
    }

    /// Score one entry. Notes about fields that had to be defaulted are
    /// appended to `notes`.
    pub fn evaluate(&self, entry: &EffectiveEntry, notes: &mut Vec<Degradation>) -> PerformanceRecord {
        let key = entry.key.as_str();
        let finish = entry.finish;
        let race_position = finish.position();
        let subject = entry.athlete.as_deref().unwrap_or(&entry.team_id);

        let quali_position = self.index.quali_position(key);
        if quali_position.is_none()
            && finish.is_finisher()
            && self.index.has_qualifying()
        {
            notes.push(Degradation::new(subject, "quali_position", "no qualifying row"));
        }
        let quali_stage = quali_position.map(|p| self.stage(p));

        let pole = self.index.is_pole(key);
        let quali_track_record = pole && self.index.holds_quali_record(key);

        let position_delta = match (quali_position, finish.is_finisher()) {
            (Some(q), true) => q as i32 - race_position as i32,
            _ => 0,
        };

        let h2h = self.head_to_head(key, quali_position, race_position, finish.is_finisher());
        let fastest_lap = self.index.has_fastest_lap(key);
        let race_track_record = fastest_lap && self.index.holds_race_record(key);
        let driver_of_the_day = self.index.is_driver_of_the_day(key);
        let fastest_pit_stop = self.index.has_fastest_pit_stop(key);
        let top_speed = self.index.has_top_speed(key);

        let r = self.rules;
        let mut breakdown = Vec::new();
        let mut award = |rule: BonusRule, value: Option<f64>, hit: bool| {
            if let (true, Some(points)) = (hit, value) {
                breakdown.push(AppliedBonus { rule, points });
            }
        };

        award(
            BonusRule::QualiTopStage,
            r.quali_top_stage,
            quali_stage == Some(QualiStage::Top),
        );
        // Stacks with the top stage: every top-stage athlete also cleared the
        // intermediate cutoff.
        award(
            BonusRule::QualiIntermediateStage,
            r.quali_intermediate_stage,
            matches!(
                (quali_position, r.quali_intermediate_stage_cutoff),
                (Some(p), Some(cutoff)) if p <= cutoff
            ),
        );
        award(BonusRule::PolePosition, r.pole_position, pole);
        award(BonusRule::QualiTrackRecord, r.quali_track_record, quali_track_record);
        let delta_points = self.delta_points(position_delta, race_position);
        award(BonusRule::PositionDelta, delta_points, delta_points.is_some_and(|p| p != 0.0));
        award(BonusRule::BeatTeammateQuali, r.beat_teammate_quali, h2h.quali);
        award(BonusRule::BeatTeammateRace, r.beat_teammate_race, h2h.race);
        award(BonusRule::FastestLap, r.fastest_lap, fastest_lap);
        award(BonusRule::RaceTrackRecord, r.race_track_record, race_track_record);
        award(BonusRule::DriverOfTheDay, r.driver_of_the_day, driver_of_the_day);
        award(BonusRule::FastestPitStop, r.fastest_pit_stop, fastest_pit_stop);
        award(BonusRule::TopSpeed, r.top_speed, top_speed);

        let bonus_score: f64 = breakdown.iter().map(|b| b.points).sum();
        let base_score = self.index.base_mark(key).unwrap_or(0.0);
        let total_score = if finish.is_finisher() {
            base_score + bonus_score
        } else {
            DNF_SCORE
        };

        debug!(
            team = %entry.team_id,
            slot = %entry.slot,
            athlete = subject,
            bonus_score,
            total_score,
            "entry evaluated"
        );

        PerformanceRecord {
            team_id: entry.team_id.clone(),
            slot: entry.slot,
            athlete: entry.athlete.clone(),
            source: entry.source.clone(),
            finish,
            race_position,
            quali_position,
            quali_stage,
            pole,
            quali_track_record,
            position_delta,
            beat_teammate_quali: h2h.quali,
            beat_teammate_race: h2h.race,
            fastest_lap,
            race_track_record,
            driver_of_the_day,
            fastest_pit_stop,
            top_speed,
            breakdown,
            bonus_score,
            base_score,
            total_score,
        }
    }

    fn stage(&self, position: u32) -> QualiStage {
        let within = |cutoff: Option<u32>| cutoff.is_some_and(|c| position <= c);
        if within(self.rules.quali_top_stage_cutoff) {
            QualiStage::Top
        } else if within(self.rules.quali_intermediate_stage_cutoff) {
            QualiStage::Intermediate
        } else {
            QualiStage::Eliminated
        }
    }

    /// Places lost always cost; places gained only pay when the athlete
    /// finished at or above the overtake threshold.
    fn delta_points(&self, delta: i32, race_position: u32) -> Option<f64> {
        let coefficient = self.rules.position_delta_coefficient?;
        if delta < 0 {
            return Some(delta as f64 * coefficient);
        }
        match self.rules.overtake_min_position {
            Some(threshold) if delta > 0 && race_position <= threshold => {
                Some(delta as f64 * coefficient)
            }
            _ => Some(0.0),
        }
    }

    /// Compare against the first teammate with a usable position. A
    /// non-finisher never beats anyone; a finisher beats a non-finishing mate.
    fn head_to_head(
        &self,
        key: &str,
        quali_position: Option<u32>,
        race_position: u32,
        finished: bool,
    ) -> HeadToHead {
        let mates = self.index.teammates(key);
        if mates.is_empty() {
            return HeadToHead::default();
        }

        let quali = quali_position
            .zip(mates.iter().find_map(|m| self.index.quali_position(m)))
            .is_some_and(|(own, mate)| own < mate);

        let race = finished
            && mates
                .iter()
                .find_map(|m| self.index.row(m))
                .is_some_and(|row| race_position < row.finish.position());

        HeadToHead { quali, race }
    }
}
