//! Sysfs core actuator — `/sys/devices/system/cpu/cpuN/online`.
//!
//! Writing `1`/`0` to the `online` file hotplugs a core in and out.
//! The boot core (usually cpu0) has no `online` file because the
//! kernel refuses to offline it; the actuator treats a missing file as
//! permanently online.

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use coreplug_control::{ActuationError, CoreActuator, CoreId};

use crate::topology::{core_dir, DEFAULT_CPU_ROOT};

pub struct SysfsCoreActuator {
    root: PathBuf,
}

impl SysfsCoreActuator {
    pub fn new() -> Self {
        Self::with_root(DEFAULT_CPU_ROOT)
    }

    /// Use an alternate sysfs root, for tests.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn online_path(&self, core: CoreId) -> PathBuf {
        core_dir(&self.root, core).join("online")
    }

    fn set_state(&self, core: CoreId, online: bool) -> Result<(), ActuationError> {
        let path = self.online_path(core);
        if !path.exists() {
            if !core_dir(&self.root, core).exists() {
                return Err(ActuationError::UnknownCore { core });
            }
            if online {
                // No online file: the core cannot be offlined, so it
                // is already in the requested state.
                return Ok(());
            }
            return Err(ActuationError::Transition {
                core,
                reason: format!("{} does not exist", path.display()),
            });
        }

        fs::write(&path, if online { "1" } else { "0" }).map_err(|e| {
            ActuationError::Transition {
                core,
                reason: e.to_string(),
            }
        })?;
        debug!(core, online, "core state written");
        Ok(())
    }
}

impl Default for SysfsCoreActuator {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreActuator for SysfsCoreActuator {
    fn bring_online(&self, core: CoreId) -> Result<(), ActuationError> {
        if self.is_online(core) {
            return Ok(());
        }
        self.set_state(core, true)
    }

    fn take_offline(&self, core: CoreId) -> Result<(), ActuationError> {
        if !self.is_online(core) {
            return Ok(());
        }
        self.set_state(core, false)
    }

    fn is_online(&self, core: CoreId) -> bool {
        match fs::read_to_string(self.online_path(core)) {
            Ok(s) => s.trim() == "1",
            // Missing file: not offlinable, hence online.
            Err(_) => core_dir(&self.root, core).exists(),
        }
    }
}
