//! CPU topology discovery.
//!
//! The kernel lists present CPUs as a range list, e.g. `0-3` or
//! `0-1,4-7`. The controller needs the set up front: it iterates a
//! finite, statically known collection of core ids rather than probing
//! "each possible" core.

use std::fs;
use std::path::{Path, PathBuf};

use coreplug_control::CoreId;

use crate::error::{SysfsError, SysfsResult};

pub const DEFAULT_CPU_ROOT: &str = "/sys/devices/system/cpu";

/// Read the present core ids from `<root>/present`, ascending.
pub fn present_cores(root: &Path) -> SysfsResult<Vec<CoreId>> {
    let path = root.join("present");
    let raw = fs::read_to_string(&path).map_err(|source| SysfsError::Read {
        path: path.clone(),
        source,
    })?;
    parse_cpu_list(raw.trim()).ok_or(SysfsError::Parse { path, value: raw })
}

/// Parse a kernel CPU range list like `0-3,5,7-8`.
fn parse_cpu_list(s: &str) -> Option<Vec<CoreId>> {
    let mut cores = Vec::new();
    for part in s.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match part.split_once('-') {
            Some((lo, hi)) => {
                let lo: CoreId = lo.trim().parse().ok()?;
                let hi: CoreId = hi.trim().parse().ok()?;
                if hi < lo {
                    return None;
                }
                cores.extend(lo..=hi);
            }
            None => cores.push(part.parse().ok()?),
        }
    }
    if cores.is_empty() {
        return None;
    }
    cores.sort_unstable();
    cores.dedup();
    Some(cores)
}

/// Path to a core's sysfs directory.
pub(crate) fn core_dir(root: &Path, core: CoreId) -> PathBuf {
    root.join(format!("cpu{core}"))
}
