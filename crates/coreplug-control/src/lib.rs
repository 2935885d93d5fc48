//! coreplug-control — the adaptive core-count controller.
//!
//! Drives the decision engine from `coreplug-policy` once per tick:
//! sample load, classify a zone, consult the hysteresis gate, and
//! actuate core transitions through an injected [`CoreActuator`].
//! Suspend/resume lifecycle hooks bypass the tick cadence, draining
//! any in-flight tick before forcing the core set to its suspend or
//! resume shape and (re)applying frequency caps.
//!
//! The split mirrors the rest of the workspace: [`Governor`] is the
//! synchronous, fully testable decision-and-actuation core;
//! [`Controller`] is the async shell that owns the periodic task and
//! the suspend/resume ordering guarantee.

pub mod actuator;
pub mod config;
pub mod controller;
pub mod error;
pub mod governor;

pub use actuator::{CoreActuator, CoreId, FreqLimit, FrequencyCapper, LoadSource};
pub use config::{ConfigSurface, CONFIG_VERSION, DEFAULT_SUSPEND_FREQ_KHZ};
pub use controller::{Controller, ControllerConfig};
pub use error::{ActuationError, ControlError};
pub use governor::{Governor, SharedThresholds, TickReport};
