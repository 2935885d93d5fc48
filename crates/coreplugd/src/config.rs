//! Daemon configuration file.
//!
//! A small TOML file mapping onto the controller's tunables:
//!
//! ```toml
//! tick_period_ms = 1000
//! startup_delay_ms = 25000
//! levels = [90, 50, 25, 60]
//! suspend_frequency_khz = 702000
//! ```
//!
//! Values are validated by the config surface before anything is
//! applied; an invalid file aborts startup rather than running with a
//! partial configuration.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    /// Interval between control ticks, in milliseconds.
    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,

    /// Delay before the first tick after startup, in milliseconds.
    #[serde(default = "default_startup_delay_ms")]
    pub startup_delay_ms: u64,

    /// Base threshold levels (3 or 4 entries). Defaults to the
    /// four-level generation's built-ins when absent.
    #[serde(default)]
    pub levels: Option<Vec<u32>>,

    /// Maximum frequency while suspended, in kHz.
    #[serde(default)]
    pub suspend_frequency_khz: Option<u32>,

    /// Sysfs CPU root, overridable for testing.
    #[serde(default = "default_cpu_root")]
    pub cpu_root: String,

    /// Stat file supplying load readings.
    #[serde(default = "default_proc_stat")]
    pub proc_stat: String,
}

fn default_tick_period_ms() -> u64 {
    1000
}

fn default_startup_delay_ms() -> u64 {
    25_000
}

fn default_cpu_root() -> String {
    "/sys/devices/system/cpu".to_string()
}

fn default_proc_stat() -> String {
    "/proc/stat".to_string()
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: default_tick_period_ms(),
            startup_delay_ms: default_startup_delay_ms(),
            levels: None,
            suspend_frequency_khz: None,
            cpu_root: default_cpu_root(),
            proc_stat: default_proc_stat(),
        }
    }
}

impl DaemonConfig {
    /// Load and parse a config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}
