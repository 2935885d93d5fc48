//! Governor — one tick of sample, classify, gate, actuate.
//!
//! The governor is synchronous and owns all per-tick state: the load
//! history, the hysteresis gate, and the cached online-core count. The
//! async [`Controller`](crate::Controller) calls [`Governor::tick`]
//! once per period and `suspend`/`resume` from the lifecycle hooks;
//! the two are never invoked concurrently, which makes the governor
//! the single writer of its own state.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, warn};

use coreplug_policy::{HysteresisGate, LoadSampler, ThresholdPolicy, Zone};

use crate::actuator::{CoreActuator, CoreId, FreqLimit, FrequencyCapper, LoadSource};
use crate::error::{ControlError, ControlResult};

/// The threshold policy shared between the governor and the config
/// surface. Writers replace the whole set under the lock, so a
/// concurrent classify never sees a partially updated bundle.
pub type SharedThresholds = Arc<RwLock<ThresholdPolicy>>;

/// What one tick observed and did. Returned for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub averaged_load: u32,
    pub online_cores: u32,
    pub zone: Zone,
    /// Number of cores whose state actually changed this tick.
    pub actuated: u32,
}

pub struct Governor {
    /// Managed cores, ascending. The first entry is the core that
    /// always stays online.
    cores: Vec<CoreId>,
    sampler: LoadSampler,
    thresholds: SharedThresholds,
    gate: HysteresisGate,
    online_cores: u32,
    /// Suspend-time frequency ceiling in kHz, shared with the config
    /// surface.
    suspend_freq_khz: Arc<AtomicU32>,
    actuator: Arc<dyn CoreActuator>,
    capper: Arc<dyn FrequencyCapper>,
    load: Arc<dyn LoadSource>,
}

impl Governor {
    pub fn new(
        cores: Vec<CoreId>,
        thresholds: SharedThresholds,
        suspend_freq_khz: Arc<AtomicU32>,
        actuator: Arc<dyn CoreActuator>,
        capper: Arc<dyn FrequencyCapper>,
        load: Arc<dyn LoadSource>,
    ) -> ControlResult<Self> {
        let mut cores = cores;
        cores.sort_unstable();
        cores.dedup();
        if cores.is_empty() {
            return Err(ControlError::NoCores);
        }

        let mut governor = Self {
            cores,
            sampler: LoadSampler::new(),
            thresholds,
            gate: HysteresisGate::new(),
            online_cores: 0,
            suspend_freq_khz,
            actuator,
            capper,
            load,
        };
        governor.refresh_online();
        Ok(governor)
    }

    /// Total number of managed cores.
    pub fn total_cores(&self) -> u32 {
        self.cores.len() as u32
    }

    /// Online count as of the last refresh.
    pub fn online_cores(&self) -> u32 {
        self.online_cores
    }

    /// Milliseconds of the last successful actuation.
    pub fn last_action_ms(&self) -> u64 {
        self.gate.last_action_ms()
    }

    /// Run one control tick at monotonic time `now_ms`.
    pub fn tick(&mut self, now_ms: u64) -> TickReport {
        let raw = self.load.current_load();
        let averaged = self.sampler.record(raw);
        let online = self.refresh_online();

        let zone = self
            .thresholds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .classify(averaged, online);

        debug!(raw, averaged, online, ?zone, "tick");

        let mut actuated = 0;
        if zone.actuates() && self.gate.allow(zone, online, now_ms) {
            actuated = match zone {
                Zone::High => self.bring_all_online(),
                Zone::MediumHigh => self.bring_one_online(),
                Zone::Low => self.sweep_offline(),
                Zone::MediumLow | Zone::Hold => 0,
            };
            if actuated > 0 {
                self.gate.record_action(now_ms);
                self.refresh_online();
            }
        }

        TickReport {
            averaged_load: averaged,
            online_cores: self.online_cores,
            zone,
            actuated,
        }
    }

    /// Suspend actuation: take every core but the lowest-indexed one
    /// offline (best-effort per core) and cap the survivor's maximum
    /// frequency. The caller must have drained the control loop first.
    pub fn suspend(&mut self) {
        for &core in self.cores.iter().skip(1) {
            if !self.actuator.is_online(core) {
                continue;
            }
            match self.actuator.take_offline(core) {
                Ok(()) => debug!(core, "core down for suspend"),
                Err(e) => warn!(core, error = %e, "failed to offline core for suspend"),
            }
        }

        let base = self.cores[0];
        let cap_khz = self.suspend_freq_khz.load(Ordering::Relaxed);
        match self
            .capper
            .set_ceiling(base, FreqLimit::Unlimited, FreqLimit::Khz(cap_khz))
        {
            Ok(()) => info!(core = base, cap_khz, "suspend frequency cap applied"),
            Err(e) => warn!(core = base, error = %e, "failed to apply suspend frequency cap"),
        }

        self.refresh_online();
    }

    /// Resume actuation: online every offline core, lift every core's
    /// frequency ceiling, and reset the hysteresis clock so the first
    /// post-resume tick measures from now.
    pub fn resume(&mut self, now_ms: u64) {
        for &core in &self.cores {
            if self.actuator.is_online(core) {
                continue;
            }
            match self.actuator.bring_online(core) {
                Ok(()) => debug!(core, "core up for resume"),
                Err(e) => warn!(core, error = %e, "failed to online core for resume"),
            }
        }

        for &core in &self.cores {
            if let Err(e) =
                self.capper
                    .set_ceiling(core, FreqLimit::Unlimited, FreqLimit::Unlimited)
            {
                warn!(core, error = %e, "failed to restore frequency ceiling");
            }
        }

        self.gate.reset(now_ms);
        self.refresh_online();
    }

    /// Re-read online state from the actuator.
    fn refresh_online(&mut self) -> u32 {
        self.online_cores = self
            .cores
            .iter()
            .filter(|&&c| self.actuator.is_online(c))
            .count() as u32;
        self.online_cores
    }

    /// High zone: online every offline core. Zero calls when all are
    /// already online.
    fn bring_all_online(&mut self) -> u32 {
        let mut changed = 0;
        for &core in &self.cores {
            if self.actuator.is_online(core) {
                continue;
            }
            match self.actuator.bring_online(core) {
                Ok(()) => {
                    debug!(core, "core up - high load");
                    changed += 1;
                }
                Err(e) => warn!(core, error = %e, "failed to online core"),
            }
        }
        changed
    }

    /// MediumHigh zone: online exactly one offline core, never more.
    fn bring_one_online(&mut self) -> u32 {
        for &core in &self.cores {
            if self.actuator.is_online(core) {
                continue;
            }
            match self.actuator.bring_online(core) {
                Ok(()) => {
                    debug!(core, "core up - medium load");
                    return 1;
                }
                Err(e) => {
                    warn!(core, error = %e, "failed to online core");
                    return 0;
                }
            }
        }
        0
    }

    /// Low zone: take every core except the lowest-indexed one offline
    /// in a single sweep. Zero calls when only one core remains.
    fn sweep_offline(&mut self) -> u32 {
        let mut changed = 0;
        for &core in self.cores.iter().skip(1) {
            if !self.actuator.is_online(core) {
                continue;
            }
            match self.actuator.take_offline(core) {
                Ok(()) => {
                    debug!(core, "core down - low load");
                    changed += 1;
                }
                Err(e) => warn!(core, error = %e, "failed to offline core"),
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use coreplug_policy::{ThresholdSet, BASE_INTERVAL_MS};

    use crate::error::ActuationError;

    /// Recording fake for CoreActuator + FrequencyCapper.
    struct FakeCluster {
        online: Mutex<BTreeMap<CoreId, bool>>,
        calls: Mutex<Vec<String>>,
        /// Cores that refuse to transition.
        stuck: Vec<CoreId>,
    }

    impl FakeCluster {
        fn new(total: u32, online: u32) -> Arc<Self> {
            let map = (0..total).map(|c| (c, c < online)).collect();
            Arc::new(Self {
                online: Mutex::new(map),
                calls: Mutex::new(Vec::new()),
                stuck: Vec::new(),
            })
        }

        fn with_stuck(total: u32, online: u32, stuck: Vec<CoreId>) -> Arc<Self> {
            let map = (0..total).map(|c| (c, c < online)).collect();
            Arc::new(Self {
                online: Mutex::new(map),
                calls: Mutex::new(Vec::new()),
                stuck,
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CoreActuator for FakeCluster {
        fn bring_online(&self, core: CoreId) -> Result<(), ActuationError> {
            self.calls.lock().unwrap().push(format!("up {core}"));
            if self.stuck.contains(&core) {
                return Err(ActuationError::Transition {
                    core,
                    reason: "stuck".into(),
                });
            }
            self.online.lock().unwrap().insert(core, true);
            Ok(())
        }

        fn take_offline(&self, core: CoreId) -> Result<(), ActuationError> {
            self.calls.lock().unwrap().push(format!("down {core}"));
            if self.stuck.contains(&core) {
                return Err(ActuationError::Transition {
                    core,
                    reason: "stuck".into(),
                });
            }
            self.online.lock().unwrap().insert(core, false);
            Ok(())
        }

        fn is_online(&self, core: CoreId) -> bool {
            *self.online.lock().unwrap().get(&core).unwrap_or(&false)
        }
    }

    impl FrequencyCapper for FakeCluster {
        fn set_ceiling(
            &self,
            core: CoreId,
            _floor: FreqLimit,
            ceiling: FreqLimit,
        ) -> Result<(), ActuationError> {
            self.calls.lock().unwrap().push(format!("cap {core} {ceiling:?}"));
            Ok(())
        }

        fn hardware_range(&self, _core: CoreId) -> Result<(u32, u32), ActuationError> {
            Ok((384_000, 1_512_000))
        }
    }

    struct FixedLoad(AtomicU32);

    impl LoadSource for FixedLoad {
        fn current_load(&self) -> u32 {
            self.0.load(Ordering::Relaxed)
        }
    }

    fn shared_thresholds() -> SharedThresholds {
        Arc::new(RwLock::new(ThresholdPolicy::new(
            ThresholdSet::default_four_level(),
        )))
    }

    fn governor(cluster: Arc<FakeCluster>, load: Arc<FixedLoad>) -> Governor {
        Governor::new(
            vec![0, 1, 2, 3],
            shared_thresholds(),
            Arc::new(AtomicU32::new(702_000)),
            cluster.clone(),
            cluster,
            load,
        )
        .unwrap()
    }

    /// Push enough identical samples to saturate the history buffer so
    /// the average equals the raw load.
    fn warm_up(gov: &mut Governor, load: &FixedLoad, value: u32, start_ms: u64) -> u64 {
        load.0.store(value, Ordering::Relaxed);
        let mut now = start_ms;
        for _ in 0..coreplug_policy::sampler::HISTORY_SIZE {
            gov.tick(now);
            now += 1;
        }
        now
    }

    #[test]
    fn rejects_empty_core_set() {
        let cluster = FakeCluster::new(0, 0);
        let load = Arc::new(FixedLoad(AtomicU32::new(0)));
        let result = Governor::new(
            vec![],
            shared_thresholds(),
            Arc::new(AtomicU32::new(702_000)),
            cluster.clone(),
            cluster,
            load,
        );
        assert!(matches!(result, Err(ControlError::NoCores)));
    }

    #[test]
    fn high_zone_onlines_all_cores() {
        let cluster = FakeCluster::new(4, 2);
        let load = Arc::new(FixedLoad(AtomicU32::new(0)));
        let mut gov = governor(cluster.clone(), load.clone());

        // Defaults: first = 90, two cores online → effective 180.
        // Load 400 averages past it once the buffer is warm.
        let now = warm_up(&mut gov, &load, 400, 0);
        // Warm-up ticks all sit inside the hysteresis window; the
        // decisive tick lands past it.
        let report = gov.tick(now + BASE_INTERVAL_MS);
        assert_eq!(report.zone, Zone::High);
        assert_eq!(report.online_cores, 4);
        assert!(cluster.is_online(3));
    }

    #[test]
    fn high_zone_idempotent_when_all_online() {
        let cluster = FakeCluster::new(4, 4);
        let load = Arc::new(FixedLoad(AtomicU32::new(0)));
        let mut gov = governor(cluster.clone(), load.clone());

        let now = warm_up(&mut gov, &load, 800, 0);
        cluster.calls.lock().unwrap().clear();

        let report = gov.tick(now + BASE_INTERVAL_MS);
        assert_eq!(report.zone, Zone::High);
        assert_eq!(report.actuated, 0);
        // Zero actuator transition calls.
        assert!(cluster.calls().is_empty());
    }

    #[test]
    fn medium_high_brings_exactly_one_core() {
        let cluster = FakeCluster::new(4, 2);
        let load = Arc::new(FixedLoad(AtomicU32::new(0)));
        let mut gov = governor(cluster.clone(), load.clone());

        // Two cores online: effective second = 100, effective first = 180.
        let now = warm_up(&mut gov, &load, 150, 0);
        let report = gov.tick(now + 2 * BASE_INTERVAL_MS);
        assert_eq!(report.zone, Zone::MediumHigh);
        assert_eq!(report.actuated, 1);
        assert_eq!(report.online_cores, 3);
    }

    #[test]
    fn medium_high_fast_path_from_single_core() {
        let cluster = FakeCluster::new(4, 1);
        let load = Arc::new(FixedLoad(AtomicU32::new(60)));
        let mut gov = governor(cluster.clone(), load.clone());

        // Make the elapsed time tiny: record a recent action first.
        gov.gate.record_action(1_000);
        // One sample of 600 averages to 60 ≥ second (50) with one core.
        load.0.store(600, Ordering::Relaxed);
        let report = gov.tick(1_001);
        assert_eq!(report.zone, Zone::MediumHigh);
        assert_eq!(report.actuated, 1);
        assert_eq!(report.online_cores, 2);
    }

    #[test]
    fn hysteresis_blocks_rapid_high_actuations() {
        let cluster = FakeCluster::new(4, 2);
        let load = Arc::new(FixedLoad(AtomicU32::new(0)));
        let mut gov = governor(cluster.clone(), load.clone());

        let now = warm_up(&mut gov, &load, 800, 0);
        let first = gov.tick(now + BASE_INTERVAL_MS);
        assert!(first.actuated > 0);

        // Take a core back down manually, then qualify again within
        // the interval: gated.
        cluster.take_offline(3).unwrap();
        let second = gov.tick(now + BASE_INTERVAL_MS + 500);
        assert_eq!(second.zone, Zone::High);
        assert_eq!(second.actuated, 0);

        // Past the interval: allowed again.
        let third = gov.tick(now + 2 * BASE_INTERVAL_MS + 500);
        assert_eq!(third.actuated, 1);
    }

    #[test]
    fn low_zone_sweeps_down_to_one_core() {
        let cluster = FakeCluster::new(4, 4);
        let load = Arc::new(FixedLoad(AtomicU32::new(0)));
        let mut gov = governor(cluster.clone(), load.clone());

        // Four cores online: effective fourth = 240; zero load is Low.
        // Warm-up ticks sit inside the hysteresis window, so the sweep
        // fires only on the decisive tick.
        let now = warm_up(&mut gov, &load, 0, 0);
        let report = gov.tick(now + BASE_INTERVAL_MS);
        assert_eq!(report.zone, Zone::Low);
        assert_eq!(report.online_cores, 1);
        assert!(cluster.is_online(0));
        assert!(!cluster.is_online(1));
    }

    #[test]
    fn low_zone_never_drops_last_core() {
        let cluster = FakeCluster::new(4, 1);
        let load = Arc::new(FixedLoad(AtomicU32::new(0)));
        let mut gov = governor(cluster.clone(), load.clone());

        let now = warm_up(&mut gov, &load, 0, 100_000);
        cluster.calls.lock().unwrap().clear();
        let report = gov.tick(now + BASE_INTERVAL_MS);
        // With one core online, zero load is Hold, not Low.
        assert_eq!(report.zone, Zone::Hold);
        assert_eq!(report.online_cores, 1);
        assert!(cluster.calls().is_empty());
    }

    #[test]
    fn failed_actuation_does_not_advance_timestamp() {
        let cluster = FakeCluster::with_stuck(2, 1, vec![1]);
        let load = Arc::new(FixedLoad(AtomicU32::new(0)));
        let mut gov = Governor::new(
            vec![0, 1],
            shared_thresholds(),
            Arc::new(AtomicU32::new(702_000)),
            cluster.clone(),
            cluster.clone(),
            load.clone(),
        )
        .unwrap();

        let before = gov.last_action_ms();
        let now = warm_up(&mut gov, &load, 800, 0);
        let report = gov.tick(now + BASE_INTERVAL_MS);
        // The only offline core is stuck: nothing changed, timestamp
        // untouched, and the next tick will retry naturally.
        assert_eq!(report.actuated, 0);
        assert_eq!(gov.last_action_ms(), before);
    }

    #[test]
    fn suspend_leaves_only_lowest_core_capped() {
        let cluster = FakeCluster::new(4, 4);
        let load = Arc::new(FixedLoad(AtomicU32::new(0)));
        let mut gov = governor(cluster.clone(), load);

        gov.suspend();
        assert_eq!(gov.online_cores(), 1);
        assert!(cluster.is_online(0));
        assert!(cluster
            .calls()
            .contains(&"cap 0 Khz(702000)".to_string()));
    }

    #[test]
    fn suspend_is_best_effort_on_stuck_cores() {
        let cluster = FakeCluster::with_stuck(4, 4, vec![2]);
        let load = Arc::new(FixedLoad(AtomicU32::new(0)));
        let mut gov = governor(cluster.clone(), load);

        gov.suspend();
        // Core 2 refused; the others still went down and the count
        // reflects reality.
        assert_eq!(gov.online_cores(), 2);
        assert!(cluster.is_online(2));
        assert!(!cluster.is_online(3));
    }

    #[test]
    fn resume_restores_all_cores_and_ceilings() {
        let cluster = FakeCluster::new(4, 4);
        let load = Arc::new(FixedLoad(AtomicU32::new(0)));
        let mut gov = governor(cluster.clone(), load);

        gov.suspend();
        cluster.calls.lock().unwrap().clear();

        gov.resume(90_000);
        assert_eq!(gov.online_cores(), 4);
        assert_eq!(gov.last_action_ms(), 90_000);
        let calls = cluster.calls();
        for core in 0..4 {
            assert!(calls.contains(&format!("cap {core} Unlimited")));
        }
    }
}
