//! Configuration surface — validated tunables.
//!
//! Exposes the three knobs the original driver put behind sysfs
//! attributes: the threshold levels, the suspend frequency cap, and a
//! read-only version identifier. Writes validate before anything is
//! applied; a rejected write leaves the prior configuration untouched.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, PoisonError};

use tracing::info;

use coreplug_policy::{PolicyError, ThresholdSet};

use crate::actuator::{CoreId, FrequencyCapper};
use crate::error::{ControlError, ControlResult};
use crate::governor::SharedThresholds;

/// Version identifier exposed read-only. Bumped to 2 with the
/// four-level threshold generation.
pub const CONFIG_VERSION: u32 = 2;

/// Default suspend-time frequency ceiling in kHz.
pub const DEFAULT_SUSPEND_FREQ_KHZ: u32 = 702_000;

/// Read/write access to the controller's tunables.
///
/// Shares the threshold policy with the governor through
/// [`SharedThresholds`]; threshold writes swap the whole set under the
/// lock so a concurrently running classify never observes a partially
/// updated bundle.
pub struct ConfigSurface {
    thresholds: SharedThresholds,
    suspend_freq_khz: Arc<AtomicU32>,
    capper: Arc<dyn FrequencyCapper>,
    /// Core whose hardware range bounds the suspend frequency — the
    /// one that stays online through suspend.
    base_core: CoreId,
}

impl ConfigSurface {
    pub fn new(
        thresholds: SharedThresholds,
        suspend_freq_khz: Arc<AtomicU32>,
        capper: Arc<dyn FrequencyCapper>,
        base_core: CoreId,
    ) -> Self {
        Self {
            thresholds,
            suspend_freq_khz,
            capper,
            base_core,
        }
    }

    /// The read-only version identifier.
    pub fn version(&self) -> u32 {
        CONFIG_VERSION
    }

    /// Current base threshold levels in configuration order.
    pub fn levels(&self) -> Vec<u32> {
        self.thresholds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .set()
            .levels()
    }

    /// Replace the threshold levels.
    ///
    /// The tuple arity must match the active policy generation (3 or
    /// 4 levels) and every member must lie strictly between 0 and
    /// 100. Any invalid member rejects the whole tuple; nothing is
    /// applied partially.
    pub fn set_levels(&self, levels: &[u32]) -> ControlResult<()> {
        let expected = self
            .thresholds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .set()
            .level_count();
        if levels.len() != expected {
            return Err(PolicyError::LevelCount {
                expected,
                got: levels.len(),
            }
            .into());
        }

        let set = ThresholdSet::from_levels(levels)?;
        self.thresholds
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(set);
        info!(?levels, "threshold levels updated");
        Ok(())
    }

    /// Current suspend frequency cap in kHz.
    pub fn suspend_frequency(&self) -> u32 {
        self.suspend_freq_khz.load(Ordering::Relaxed)
    }

    /// Set the suspend frequency cap, validated against the base
    /// core's hardware range at write time (not at apply time).
    pub fn set_suspend_frequency(&self, khz: u32) -> ControlResult<()> {
        let (min_khz, max_khz) = self.capper.hardware_range(self.base_core)?;
        if khz < min_khz || khz > max_khz {
            return Err(ControlError::FrequencyOutOfRange {
                khz,
                min_khz,
                max_khz,
            });
        }
        self.suspend_freq_khz.store(khz, Ordering::Relaxed);
        info!(khz, "suspend frequency updated");
        Ok(())
    }
}
