//! coreplug-sysfs — Linux implementations of the controller traits.
//!
//! Maps the capability traits from `coreplug-control` onto the kernel
//! interfaces a userspace hotplug daemon has available:
//!
//! - core online/offline via `/sys/devices/system/cpu/cpuN/online`
//! - frequency limits via `cpufreq/scaling_{min,max}_freq`
//! - instantaneous load from `/proc/stat` busy-time deltas
//! - topology discovery from `/sys/devices/system/cpu/present`
//!
//! All adapters take a configurable root path so tests can point them
//! at a fixture tree instead of the live sysfs.

pub mod cpu;
pub mod cpufreq;
pub mod error;
pub mod load;
pub mod topology;

pub use cpu::SysfsCoreActuator;
pub use cpufreq::CpufreqCapper;
pub use error::SysfsError;
pub use load::ProcStatLoadSource;
pub use topology::present_cores;
