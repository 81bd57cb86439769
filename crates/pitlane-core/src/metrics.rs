//! Process-wide scoring counters.
//!
//! Incremented at the call site; [`Metrics::flush`] emits them as one
//! `info!` event at the end of a command.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Atomic counters for one process.
pub struct Metrics {
    races_scored: AtomicU64,
    substitutions: AtomicU64,
    unresolved_slots: AtomicU64,
    track_records_broken: AtomicU64,
    degradations: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn bump(counter: &AtomicU64, by: u64, name: &'static str) {
    if by == 0 {
        return;
    }
    counter.fetch_add(by, Ordering::Relaxed);
    tracing::trace!(metric = name, by, "counter incremented");
}

impl Metrics {
    /// All counters at zero.
    pub const fn new() -> Self {
        Self {
            races_scored: AtomicU64::new(0),
            substitutions: AtomicU64::new(0),
            unresolved_slots: AtomicU64::new(0),
            track_records_broken: AtomicU64::new(0),
            degradations: AtomicU64::new(0),
        }
    }

    /// Increment the races-scored counter by one.
    pub fn inc_races_scored(&self) {
        bump(&self.races_scored, 1, "races_scored");
    }

    /// Increment the reserve-substitution counter by one.
    pub fn inc_substitutions(&self) {
        bump(&self.substitutions, 1, "substitutions");
    }

    /// Increment the unresolved-slot counter by one.
    pub fn inc_unresolved_slots(&self) {
        bump(&self.unresolved_slots, 1, "unresolved_slots");
    }

    /// Increment the track-records-broken counter by one.
    pub fn inc_track_records_broken(&self) {
        bump(&self.track_records_broken, 1, "track_records_broken");
    }

    /// Add `n` degraded fields.
    pub fn add_degradations(&self, n: u64) {
        bump(&self.degradations, n, "degradations");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            races_scored = self.races_scored(),
            substitutions = self.substitutions(),
            unresolved_slots = self.unresolved_slots(),
            track_records_broken = self.track_records_broken(),
            degradations = self.degradations(),
        );
    }

    /// Current races-scored count.
    pub fn races_scored(&self) -> u64 {
        self.races_scored.load(Ordering::Relaxed)
    }

    /// Current substitution count.
    pub fn substitutions(&self) -> u64 {
        self.substitutions.load(Ordering::Relaxed)
    }

    /// Current unresolved-slot count.
    pub fn unresolved_slots(&self) -> u64 {
        self.unresolved_slots.load(Ordering::Relaxed)
    }

    /// Current track-records-broken count.
    pub fn track_records_broken(&self) -> u64 {
        self.track_records_broken.load(Ordering::Relaxed)
    }

    /// Current degraded-field count.
    pub fn degradations(&self) -> u64 {
        self.degradations.load(Ordering::Relaxed)
    }

    /// Zero every counter.
    pub fn reset(&self) {
        for counter in [
            &self.races_scored,
            &self.substitutions,
            &self.unresolved_slots,
            &self.track_records_broken,
            &self.degradations,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
