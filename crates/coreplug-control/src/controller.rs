//! Controller — the periodic task and the suspend/resume ordering.
//!
//! Owns the tokio task that drives [`Governor::tick`] and the two
//! lifecycle hooks. The hard invariant lives here: a suspend or resume
//! transition never executes concurrently with a tick. Suspend sends
//! the shutdown signal and then awaits the loop's join handle, so any
//! in-flight tick completes before the suspend sweep touches a core;
//! resume finishes its whole actuation sequence before a new task is
//! spawned.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::governor::Governor;

/// Timing knobs for the control loop.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Interval between ticks.
    pub tick_period: Duration,
    /// Delay before the very first tick after startup.
    pub startup_delay: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_secs(1),
            startup_delay: Duration::from_secs(25),
        }
    }
}

/// Handle to a running loop task.
struct LoopHandle {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

enum LoopState {
    Running(LoopHandle),
    SuspendedQuiescent,
}

/// The controller: loop lifecycle plus the suspend/resume hooks.
///
/// An external lifecycle notifier (display power events, a signal
/// handler, a test harness) calls [`suspend`](Controller::suspend) and
/// [`resume`](Controller::resume); the controller serializes them
/// against the periodic tick.
pub struct Controller {
    governor: Arc<Mutex<Governor>>,
    config: ControllerConfig,
    state: LoopState,
    /// Monotonic epoch for the millisecond timestamps fed to the
    /// governor and its hysteresis gate.
    epoch: Instant,
}

impl Controller {
    pub fn new(governor: Governor, config: ControllerConfig) -> Self {
        Self {
            governor: Arc::new(Mutex::new(governor)),
            config,
            state: LoopState::SuspendedQuiescent,
            epoch: Instant::now(),
        }
    }

    /// Shared handle to the governor, for the config surface or tests.
    pub fn governor(&self) -> Arc<Mutex<Governor>> {
        self.governor.clone()
    }

    /// Whether the periodic loop is currently scheduled.
    pub fn is_running(&self) -> bool {
        matches!(self.state, LoopState::Running(_))
    }

    /// Schedule the loop with the configured startup delay.
    pub fn start(&mut self) {
        if self.is_running() {
            warn!("control loop already running");
            return;
        }
        self.spawn_loop(self.config.startup_delay);
        info!(
            period_ms = self.config.tick_period.as_millis() as u64,
            startup_delay_ms = self.config.startup_delay.as_millis() as u64,
            "control loop scheduled"
        );
    }

    /// Suspend lifecycle hook (display off).
    ///
    /// Drains the loop first — this await does not return until any
    /// in-flight tick has completed and the task has exited — then
    /// runs the suspend sweep.
    pub async fn suspend(&mut self) {
        self.stop_loop().await;
        info!("suspend: control loop drained");

        let mut governor = self.governor.lock().await;
        governor.suspend();
        info!(online = governor.online_cores(), "suspend transition complete");
    }

    /// Resume lifecycle hook (display on).
    ///
    /// Completes the full resume actuation sequence before the loop is
    /// rescheduled, at the base period rather than the startup delay.
    pub async fn resume(&mut self) {
        {
            let mut governor = self.governor.lock().await;
            governor.resume(self.now_ms());
            info!(online = governor.online_cores(), "resume transition complete");
        }

        if !self.is_running() {
            self.spawn_loop(self.config.tick_period);
            info!("resume: control loop rescheduled");
        }
    }

    /// Stop the loop for process shutdown. Cores are left as they are.
    pub async fn shutdown(&mut self) {
        self.stop_loop().await;
        info!("control loop stopped");
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn spawn_loop(&mut self, initial_delay: Duration) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let governor = self.governor.clone();
        let epoch = self.epoch;
        let period = self.config.tick_period;

        let handle = tokio::spawn(async move {
            run_loop(governor, epoch, period, initial_delay, shutdown_rx).await;
        });

        self.state = LoopState::Running(LoopHandle {
            shutdown_tx,
            handle,
        });
    }

    async fn stop_loop(&mut self) {
        let state = std::mem::replace(&mut self.state, LoopState::SuspendedQuiescent);
        if let LoopState::Running(loop_handle) = state {
            let _ = loop_handle.shutdown_tx.send(true);
            // Await, never abort: an in-flight tick must finish.
            if let Err(e) = loop_handle.handle.await {
                error!(error = %e, "control loop task failed");
            }
        }
    }
}

/// The periodic tick task.
async fn run_loop(
    governor: Arc<Mutex<Governor>>,
    epoch: Instant,
    period: Duration,
    initial_delay: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    tokio::select! {
        _ = tokio::time::sleep(initial_delay) => {}
        _ = shutdown.changed() => {
            debug!("control loop cancelled before first tick");
            return;
        }
    }

    loop {
        {
            let mut governor = governor.lock().await;
            let now_ms = epoch.elapsed().as_millis() as u64;
            governor.tick(now_ms);
        }

        tokio::select! {
            _ = tokio::time::sleep(period) => {}
            _ = shutdown.changed() => {
                debug!("control loop shutting down");
                return;
            }
        }
    }
}
