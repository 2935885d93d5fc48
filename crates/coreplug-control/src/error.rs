//! Error types for the controller.

use thiserror::Error;

use crate::actuator::CoreId;

/// Result type alias for controller operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Failure reported by a [`CoreActuator`](crate::CoreActuator) or
/// [`FrequencyCapper`](crate::FrequencyCapper) implementation.
///
/// Actuation failures are logged and the tick proceeds; controller
/// state is not advanced for the failed core, so the next tick
/// re-evaluates naturally.
#[derive(Debug, Error)]
pub enum ActuationError {
    #[error("core {core} transition failed: {reason}")]
    Transition { core: CoreId, reason: String },

    #[error("core {core} frequency limit rejected: {reason}")]
    Frequency { core: CoreId, reason: String },

    #[error("core {core} is not present")]
    UnknownCore { core: CoreId },
}

/// Errors surfaced by the controller and its configuration surface.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("invalid configuration: {0}")]
    Config(#[from] coreplug_policy::PolicyError),

    #[error("suspend frequency {khz} kHz outside hardware range {min_khz}..={max_khz} kHz")]
    FrequencyOutOfRange {
        khz: u32,
        min_khz: u32,
        max_khz: u32,
    },

    #[error("no cores to manage")]
    NoCores,

    #[error(transparent)]
    Actuation(#[from] ActuationError),
}
