//! Adaptive sampling of units of work per harvest cycle.
//!
//! The collector asks for a target number of sampled units (e.g. transactions) per harvest cycle.
//! The number of arrivals per cycle is not known in advance, so [`HarvestState::should_sample`]
//! estimates it from the previous cycle:
//!
//!  - During the very first cycle after connecting, the first `target` units are admitted
//!    deterministically.
//!  - Afterwards, while fewer than `target` units have been sampled in the current cycle, each unit
//!    is admitted with probability `target / prev_seen`.
//!  - Once the target is met, admission backs off exponentially using [`compute_threshold`].

use harvest_common::{TimeDelta, Timestamp};
use serde::Serialize;

use crate::RandomSource;

/// Computes the exponential back-off threshold once a cycle has met its target.
///
/// Returns `0` if `target` or `sampled` is zero, or if fewer than `target` units have been sampled.
/// Otherwise, returns `target^(target / sampled) - target^0.5`, truncated to an integer. Negative
/// results truncate to `0`.
///
/// # Example
///
/// ```
/// use harvest_sampling::compute_threshold;
///
/// assert_eq!(compute_threshold(10, 10), 6);
/// assert_eq!(compute_threshold(10, 9), 0);
/// ```
pub fn compute_threshold(target: u64, sampled: u64) -> u64 {
    if target == 0 || sampled == 0 || sampled < target {
        return 0;
    }

    let target = target as f64;
    let exponent = target / sampled as f64;

    // Float to int casts saturate, so negative values become zero.
    (target.powf(exponent) - target.sqrt()) as u64
}

/// Harvest cycle bookkeeping for one monitored application.
///
/// The state is reset whenever the connection parameters change, and is otherwise mutated once per
/// sampling decision. Access must be serialized by the caller.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HarvestState {
    connect_timestamp: Timestamp,
    frequency: TimeDelta,
    target_per_cycle: u64,
    next_harvest: Timestamp,
    threshold: u64,
    prev_seen: u64,
    seen: u64,
    sampled: u64,
}

impl HarvestState {
    /// Creates and initializes a harvest state.
    pub fn new(
        connect_timestamp: Timestamp,
        frequency: TimeDelta,
        target_per_cycle: u64,
        now: Timestamp,
    ) -> Self {
        let mut state = Self::default();
        state.init(connect_timestamp, frequency, target_per_cycle, now);
        state
    }

    /// (Re-)initializes the state with the parameters of a connection.
    ///
    /// If the connect timestamp or frequency changed, the next harvest time is recomputed and all
    /// counters are cleared. Otherwise, counters are preserved so that refreshing unrelated
    /// configuration does not disturb the current cycle. The target always takes the new value.
    pub fn init(
        &mut self,
        connect_timestamp: Timestamp,
        frequency: TimeDelta,
        target_per_cycle: u64,
        now: Timestamp,
    ) {
        let reset = self.connect_timestamp != connect_timestamp || self.frequency != frequency;

        self.connect_timestamp = connect_timestamp;
        self.frequency = frequency;
        self.target_per_cycle = target_per_cycle;

        if reset {
            if frequency.is_zero() {
                harvest_log::warn!(
                    connect_timestamp = connect_timestamp.as_micros(),
                    "harvest frequency is zero, no units will be sampled"
                );
            }

            self.next_harvest = self.compute_next_harvest(now);
            self.threshold = 0;
            self.prev_seen = 0;
            self.seen = 0;
            self.sampled = 0;
        }
    }

    /// Computes the start of the harvest cycle following `now`.
    ///
    /// Falls back to the connect timestamp if `now` lies before it, or if the frequency is zero.
    pub fn compute_next_harvest(&self, now: Timestamp) -> Timestamp {
        if now < self.connect_timestamp {
            harvest_log::warn!(
                now = now.as_micros(),
                connect_timestamp = self.connect_timestamp.as_micros(),
                "current time is before the connect timestamp"
            );
            return self.connect_timestamp;
        }

        let frequency = self.frequency.as_micros();
        if frequency == 0 {
            harvest_log::debug!("harvest frequency is zero");
            return self.connect_timestamp;
        }

        let cycles = now.saturating_sub(self.connect_timestamp).as_micros() / frequency;
        let offset = frequency.saturating_mul(cycles.saturating_add(1));

        self.connect_timestamp
            .saturating_add(TimeDelta::from_micros(offset))
    }

    /// Returns `true` if `now` falls into the first harvest cycle after connecting.
    pub fn is_first_cycle(&self, now: Timestamp) -> bool {
        now < self.connect_timestamp.saturating_add(self.frequency)
    }

    /// Decides whether the current unit of work should be sampled.
    ///
    /// This has side effects and must be called exactly once per unit of work. It rolls over to a
    /// new cycle if `now` has passed the next harvest time, counts the unit, and then admits it
    /// according to the rules described in the [module docs](self).
    pub fn should_sample<R>(&mut self, rng: &mut R, now: Timestamp) -> bool
    where
        R: RandomSource + ?Sized,
    {
        if now >= self.next_harvest {
            self.roll_over(now);
        }

        self.seen += 1;

        let admit = if self.is_first_cycle(now) {
            self.sampled < self.target_per_cycle
        } else if self.sampled < self.target_per_cycle {
            rng.uniform_int(self.prev_seen)
                .is_some_and(|r| r < self.target_per_cycle)
        } else {
            self.threshold = compute_threshold(self.target_per_cycle, self.sampled);
            rng.uniform_int(self.seen)
                .is_some_and(|r| r < self.threshold)
        };

        if admit {
            self.sampled += 1;
        }

        harvest_log::trace!(
            admit,
            seen = self.seen,
            sampled = self.sampled,
            threshold = self.threshold,
            "sampling decision"
        );

        admit
    }

    fn roll_over(&mut self, now: Timestamp) {
        self.threshold = compute_threshold(self.target_per_cycle, self.sampled);

        // More than one full cycle without a single call means the previous cycle saw nothing.
        let skipped = now >= self.next_harvest.saturating_add(self.frequency);
        self.prev_seen = if skipped { 0 } else { self.seen };

        harvest_log::trace!(
            seen = self.seen,
            sampled = self.sampled,
            skipped,
            "harvest cycle rolled over"
        );

        self.seen = 0;
        self.sampled = 0;
        self.next_harvest = self.compute_next_harvest(now);
    }

    /// The time the current reporting session began.
    pub fn connect_timestamp(&self) -> Timestamp {
        self.connect_timestamp
    }

    /// The length of one harvest cycle.
    pub fn frequency(&self) -> TimeDelta {
        self.frequency
    }

    /// The desired number of sampled units per cycle.
    pub fn target_per_cycle(&self) -> u64 {
        self.target_per_cycle
    }

    /// The start of the next harvest cycle.
    pub fn next_harvest(&self) -> Timestamp {
        self.next_harvest
    }

    /// The last computed back-off threshold.
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Number of units seen in the previous cycle, or `0` if cycles were skipped.
    pub fn prev_seen(&self) -> u64 {
        self.prev_seen
    }

    /// Number of units seen in the current cycle.
    pub fn seen(&self) -> u64 {
        self.seen
    }

    /// Number of units sampled in the current cycle.
    pub fn sampled(&self) -> u64 {
        self.sampled
    }
}
