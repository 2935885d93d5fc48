//! Suspend/resume round-trip against a recording fake cluster.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use coreplug_control::{
    ConfigSurface, Controller, ControllerConfig, CoreActuator, CoreId, FreqLimit,
    FrequencyCapper, Governor, LoadSource, SharedThresholds, DEFAULT_SUSPEND_FREQ_KHZ,
};
use coreplug_control::error::ActuationError;
use coreplug_policy::{ThresholdPolicy, ThresholdSet};

/// Fake cluster tracking online state and the last ceiling applied to
/// each core.
struct FakeCluster {
    online: Mutex<BTreeMap<CoreId, bool>>,
    ceilings: Mutex<BTreeMap<CoreId, FreqLimit>>,
}

impl FakeCluster {
    fn new(total: u32) -> Arc<Self> {
        Arc::new(Self {
            online: Mutex::new((0..total).map(|c| (c, true)).collect()),
            ceilings: Mutex::new(BTreeMap::new()),
        })
    }

    fn ceiling(&self, core: CoreId) -> Option<FreqLimit> {
        self.ceilings.lock().unwrap().get(&core).copied()
    }
}

impl CoreActuator for FakeCluster {
    fn bring_online(&self, core: CoreId) -> Result<(), ActuationError> {
        self.online.lock().unwrap().insert(core, true);
        Ok(())
    }
    fn take_offline(&self, core: CoreId) -> Result<(), ActuationError> {
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
        self.ceilings.lock().unwrap().insert(core, ceiling);
        Ok(())
    }
    fn hardware_range(&self, _core: CoreId) -> Result<(u32, u32), ActuationError> {
        Ok((384_000, 1_512_000))
    }
}

struct IdleLoad;

impl LoadSource for IdleLoad {
    fn current_load(&self) -> u32 {
        0
    }
}

fn build(total: u32) -> (Controller, ConfigSurface, Arc<FakeCluster>) {
    let cluster = FakeCluster::new(total);
    let thresholds: SharedThresholds = Arc::new(RwLock::new(ThresholdPolicy::new(
        ThresholdSet::default_four_level(),
    )));
    let suspend_freq = Arc::new(AtomicU32::new(DEFAULT_SUSPEND_FREQ_KHZ));

    let governor = Governor::new(
        (0..total).collect(),
        thresholds.clone(),
        suspend_freq.clone(),
        cluster.clone(),
        cluster.clone(),
        Arc::new(IdleLoad),
    )
    .unwrap();

    let controller = Controller::new(
        governor,
        ControllerConfig {
            tick_period: Duration::from_millis(20),
            startup_delay: Duration::from_millis(20),
        },
    );
    let surface = ConfigSurface::new(thresholds, suspend_freq, cluster.clone(), 0);
    (controller, surface, cluster)
}

#[tokio::test]
async fn suspend_resume_round_trip() {
    let (mut controller, _surface, cluster) = build(4);
    controller.start();
    assert!(controller.is_running());

    controller.suspend().await;
    assert!(!controller.is_running());
    assert!(cluster.is_online(0));
    for core in 1..4 {
        assert!(!cluster.is_online(core), "core {core} should be offline");
    }
    assert_eq!(cluster.ceiling(0), Some(FreqLimit::Khz(DEFAULT_SUSPEND_FREQ_KHZ)));

    controller.resume().await;
    assert!(controller.is_running());
    for core in 0..4 {
        assert!(cluster.is_online(core), "core {core} should be online");
        assert_eq!(cluster.ceiling(core), Some(FreqLimit::Unlimited));
    }
    assert_eq!(controller.governor().lock().await.online_cores(), 4);

    controller.shutdown().await;
}

#[tokio::test]
async fn configured_suspend_cap_is_applied() {
    let (mut controller, surface, cluster) = build(2);
    surface.set_suspend_frequency(1_026_000).unwrap();

    controller.suspend().await;
    assert_eq!(cluster.ceiling(0), Some(FreqLimit::Khz(1_026_000)));

    controller.resume().await;
    controller.shutdown().await;
}

#[tokio::test]
async fn repeated_suspend_is_harmless() {
    let (mut controller, _surface, cluster) = build(4);
    controller.start();

    controller.suspend().await;
    controller.suspend().await;
    assert_eq!(controller.governor().lock().await.online_cores(), 1);
    assert!(cluster.is_online(0));
}
