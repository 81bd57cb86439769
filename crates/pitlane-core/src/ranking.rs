//! Ranking and points distribution for one sub-race.

use serde::{Deserialize, Serialize};

use crate::domain::PerformanceRecord;
use crate::rules::PointsDistribution;

/// A scored record with its place in the fantasy ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    /// 1-based.
    pub rank: u32,
    pub points: f64,
    pub record: PerformanceRecord,
}

/// Order finishers before non-finishers, then by total score (higher
/// first), then by the better race position, and zip the result with the
/// zero-padded distribution.
///
/// A finisher can score below the non-finisher sentinel (a heavy position
/// loss, a negative base mark) and still ranks ahead of every non-finisher.
/// The sort is stable, so records equal on all keys keep their input order.
pub fn rank(mut records: Vec<PerformanceRecord>, distribution: &PointsDistribution) -> Vec<RankedEntry> {
    records.sort_by(|a, b| {
        a.is_dnf()
            .cmp(&b.is_dnf())
            .then(b.total_score.total_cmp(&a.total_score))
            .then(a.race_position.cmp(&b.race_position))
    });
    let points = distribution.padded(records.len());
    records
        .into_iter()
        .zip(points)
        .enumerate()
        .map(|(i, (record, points))| RankedEntry {
            rank: i as u32 + 1,
            points,
            record,
        })
        .collect()
}
