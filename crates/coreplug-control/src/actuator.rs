//! Capability traits the controller is wired against.
//!
//! The controller never touches hardware directly: core transitions,
//! frequency caps, and load readings all go through these traits.
//! `coreplug-sysfs` provides the Linux implementations; tests inject
//! recording fakes.

use crate::error::ActuationError;

/// Identifier of a processing core, matching the kernel's CPU index.
pub type CoreId = u32;

/// An operating-frequency bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreqLimit {
    /// A bound at the given frequency in kHz.
    Khz(u32),
    /// No bound — the hardware limit applies.
    Unlimited,
}

/// Brings cores online and takes them offline.
///
/// Implementations must be idempotent-safe: a request targeting a core
/// already in the requested state is a no-op, not an error. They must
/// also return in bounded time; the control loop imposes no timeout of
/// its own.
pub trait CoreActuator: Send + Sync {
    fn bring_online(&self, core: CoreId) -> Result<(), ActuationError>;
    fn take_offline(&self, core: CoreId) -> Result<(), ActuationError>;
    /// Current online state of a core, re-read on every call.
    fn is_online(&self, core: CoreId) -> bool;
}

/// Sets the operating-frequency ceiling for a core.
pub trait FrequencyCapper: Send + Sync {
    /// Apply a frequency floor and ceiling to a core.
    /// [`FreqLimit::Unlimited`] means the hardware bound.
    fn set_ceiling(
        &self,
        core: CoreId,
        floor: FreqLimit,
        ceiling: FreqLimit,
    ) -> Result<(), ActuationError>;

    /// The hardware (min_khz, max_khz) frequency range of a core,
    /// used to validate configuration writes.
    fn hardware_range(&self, core: CoreId) -> Result<(u32, u32), ActuationError>;
}

/// Supplies the instantaneous load percentage, sampled once per tick.
pub trait LoadSource: Send + Sync {
    fn current_load(&self) -> u32;
}
