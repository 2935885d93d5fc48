//! Load source backed by `/proc/stat`.
//!
//! Sums per-core busy percentages over the interval since the previous
//! sample, so with four cores fully busy the reading approaches 400 —
//! the aggregate scale the threshold policy expects. The first call
//! after startup has no previous sample and reads zero, which only
//! deepens the sampler's deliberate warm-up bias.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::warn;

use coreplug_control::LoadSource;

/// Cumulative jiffy counters for one core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CpuTimes {
    busy: u64,
    total: u64,
}

pub struct ProcStatLoadSource {
    path: PathBuf,
    /// Previous counters per core name ("cpu0", "cpu1", ...).
    previous: Mutex<HashMap<String, CpuTimes>>,
}

impl ProcStatLoadSource {
    pub fn new() -> Self {
        Self::with_path("/proc/stat")
    }

    /// Use an alternate stat file, for tests.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            previous: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for ProcStatLoadSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadSource for ProcStatLoadSource {
    fn current_load(&self) -> u32 {
        let raw = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read stat file");
                return 0;
            }
        };

        let current = parse_per_cpu_times(&raw);
        let mut previous = self
            .previous
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let mut load = 0;
        for (name, times) in &current {
            if let Some(prev) = previous.get(name) {
                load += busy_percent(*prev, *times);
            }
        }
        *previous = current;
        load
    }
}

/// Parse the `cpuN` lines (not the aggregate `cpu` line) into
/// cumulative busy/total jiffies.
fn parse_per_cpu_times(raw: &str) -> HashMap<String, CpuTimes> {
    let mut times = HashMap::new();
    for line in raw.lines() {
        let mut fields = line.split_whitespace();
        let Some(name) = fields.next() else { continue };
        if !name.starts_with("cpu") || name == "cpu" {
            continue;
        }

        // user nice system idle iowait irq softirq steal ...
        let values: Vec<u64> = fields.filter_map(|f| f.parse().ok()).collect();
        if values.len() < 4 {
            continue;
        }
        let total: u64 = values.iter().sum();
        let idle = values[3] + values.get(4).copied().unwrap_or(0);
        times.insert(
            name.to_string(),
            CpuTimes {
                busy: total - idle,
                total,
            },
        );
    }
    times
}

/// Busy percentage of one core over the interval between two readings.
fn busy_percent(prev: CpuTimes, current: CpuTimes) -> u32 {
    let total = current.total.saturating_sub(prev.total);
    if total == 0 {
        return 0;
    }
    let busy = current.busy.saturating_sub(prev.busy);
    ((busy * 100) / total) as u32
}
