//! Hysteresis gate — minimum spacing between core-count changes.
//!
//! Without it, a load signal hovering around a threshold would online
//! and offline cores every tick. The gate compares elapsed time since
//! the last actuation against a per-zone minimum interval.

use crate::policy::Zone;

/// Base minimum interval between actuations, in milliseconds.
pub const BASE_INTERVAL_MS: u64 = 2000;

/// Tracks the last actuation timestamp and answers go/no-go per zone.
///
/// Timestamps are caller-supplied monotonic milliseconds, which keeps
/// the gate pure and lets tests drive simulated time.
#[derive(Debug, Clone)]
pub struct HysteresisGate {
    last_action_ms: u64,
}

impl HysteresisGate {
    pub fn new() -> Self {
        Self { last_action_ms: 0 }
    }

    /// Milliseconds of the last recorded actuation.
    pub fn last_action_ms(&self) -> u64 {
        self.last_action_ms
    }

    /// Record that an actuation occurred at `now_ms`.
    ///
    /// Called only when an actuator call actually succeeded, not when
    /// a zone was merely entered.
    pub fn record_action(&mut self, now_ms: u64) {
        self.last_action_ms = now_ms;
    }

    /// Reset the timestamp, e.g. after a resume transition.
    pub fn reset(&mut self, now_ms: u64) {
        self.last_action_ms = now_ms;
    }

    /// Whether an actuation for `zone` may fire at `now_ms`.
    ///
    /// MediumHigh carries two special cases: with a single core online
    /// it is always allowed (the bootstrap fast path out of single-core
    /// operation), and otherwise it requires twice the base interval.
    /// The doubled interval keeps the fast path from being followed by
    /// a second onlining the moment the second core is up.
    pub fn allow(&self, zone: Zone, online_cores: u32, now_ms: u64) -> bool {
        let elapsed = now_ms.saturating_sub(self.last_action_ms);
        match zone {
            Zone::High => elapsed >= BASE_INTERVAL_MS,
            Zone::MediumHigh => online_cores == 1 || elapsed >= 2 * BASE_INTERVAL_MS,
            Zone::Low => elapsed >= BASE_INTERVAL_MS,
            // These zones never actuate.
            Zone::MediumLow | Zone::Hold => false,
        }
    }
}

impl Default for HysteresisGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_respects_base_interval() {
        let mut gate = HysteresisGate::new();
        gate.record_action(10_000);
        assert!(!gate.allow(Zone::High, 2, 11_999));
        assert!(gate.allow(Zone::High, 2, 12_000));
    }

    #[test]
    fn low_respects_base_interval() {
        let mut gate = HysteresisGate::new();
        gate.record_action(10_000);
        assert!(!gate.allow(Zone::Low, 4, 10_500));
        assert!(gate.allow(Zone::Low, 4, 12_500));
    }

    #[test]
    fn medium_high_fast_path_ignores_elapsed_time() {
        let mut gate = HysteresisGate::new();
        gate.record_action(10_000);
        // One core online: allowed immediately.
        assert!(gate.allow(Zone::MediumHigh, 1, 10_001));
    }

    #[test]
    fn medium_high_doubles_interval_after_fast_path() {
        let mut gate = HysteresisGate::new();
        // Fast path fired and actuated at t=10s; now two cores online.
        gate.record_action(10_000);
        assert!(!gate.allow(Zone::MediumHigh, 2, 12_500));
        assert!(!gate.allow(Zone::MediumHigh, 2, 13_999));
        assert!(gate.allow(Zone::MediumHigh, 2, 14_000));
    }

    #[test]
    fn hold_zones_never_allowed() {
        let gate = HysteresisGate::new();
        assert!(!gate.allow(Zone::Hold, 2, u64::MAX));
        assert!(!gate.allow(Zone::MediumLow, 2, u64::MAX));
    }

    #[test]
    fn stale_timestamp_does_not_underflow() {
        let mut gate = HysteresisGate::new();
        // A timestamp ahead of `now` (e.g. around a clock source swap)
        // must gate, not wrap.
        gate.record_action(50_000);
        assert!(!gate.allow(Zone::High, 2, 49_000));
    }
}
