//! Cpufreq frequency capper — `cpuN/cpufreq/scaling_{min,max}_freq`.
//!
//! The unlimited sentinel maps to the hardware bounds advertised in
//! `cpuinfo_min_freq` / `cpuinfo_max_freq`, so "no limit" is written
//! as the widest range the hardware supports.

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use coreplug_control::{ActuationError, CoreId, FreqLimit, FrequencyCapper};

use crate::topology::{core_dir, DEFAULT_CPU_ROOT};

pub struct CpufreqCapper {
    root: PathBuf,
}

impl CpufreqCapper {
    pub fn new() -> Self {
        Self::with_root(DEFAULT_CPU_ROOT)
    }

    /// Use an alternate sysfs root, for tests.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn cpufreq_dir(&self, core: CoreId) -> PathBuf {
        core_dir(&self.root, core).join("cpufreq")
    }

    fn read_khz(&self, core: CoreId, file: &str) -> Result<u32, ActuationError> {
        let path = self.cpufreq_dir(core).join(file);
        let raw = fs::read_to_string(&path).map_err(|e| ActuationError::Frequency {
            core,
            reason: format!("read {}: {e}", path.display()),
        })?;
        raw.trim().parse().map_err(|_| ActuationError::Frequency {
            core,
            reason: format!("malformed value in {}: {raw:?}", path.display()),
        })
    }

    fn write_khz(&self, core: CoreId, file: &str, khz: u32) -> Result<(), ActuationError> {
        let path = self.cpufreq_dir(core).join(file);
        fs::write(&path, khz.to_string()).map_err(|e| ActuationError::Frequency {
            core,
            reason: format!("write {}: {e}", path.display()),
        })
    }

    fn resolve(&self, core: CoreId, limit: FreqLimit, hw_file: &str) -> Result<u32, ActuationError> {
        match limit {
            FreqLimit::Khz(khz) => Ok(khz),
            FreqLimit::Unlimited => self.read_khz(core, hw_file),
        }
    }
}

impl Default for CpufreqCapper {
    fn default() -> Self {
        Self::new()
    }
}

impl FrequencyCapper for CpufreqCapper {
    fn set_ceiling(
        &self,
        core: CoreId,
        floor: FreqLimit,
        ceiling: FreqLimit,
    ) -> Result<(), ActuationError> {
        let floor_khz = self.resolve(core, floor, "cpuinfo_min_freq")?;
        let ceiling_khz = self.resolve(core, ceiling, "cpuinfo_max_freq")?;

        // The kernel rejects scaling_min_freq > scaling_max_freq; the
        // floor never exceeds the requested ceiling here, so min-first
        // keeps the window valid at every step.
        self.write_khz(core, "scaling_min_freq", floor_khz)?;
        self.write_khz(core, "scaling_max_freq", ceiling_khz)?;
        debug!(core, floor_khz, ceiling_khz, "frequency limits written");
        Ok(())
    }

    fn hardware_range(&self, core: CoreId) -> Result<(u32, u32), ActuationError> {
        let min = self.read_khz(core, "cpuinfo_min_freq")?;
        let max = self.read_khz(core, "cpuinfo_max_freq")?;
        Ok((min, max))
    }
}
