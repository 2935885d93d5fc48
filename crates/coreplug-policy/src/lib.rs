//! coreplug-policy — the hotplug decision engine.
//!
//! Pure, synchronous logic with no I/O: a load smoother, a zone
//! classifier, and a hysteresis gate. The control loop in
//! `coreplug-control` drives these once per tick.
//!
//! # Decision pipeline
//!
//! ```text
//! raw load ──▶ LoadSampler.record() ──▶ averaged load
//! averaged load + online cores ──▶ ThresholdPolicy.classify() ──▶ Zone
//! Zone + elapsed since last action ──▶ HysteresisGate.allow() ──▶ go / no-go
//! ```
//!
//! Thresholds scale with the number of online cores: with 4 cores
//! online and a base level of 40, the effective level is 160. The gate
//! enforces a minimum interval between core-count changes so a noisy
//! load signal cannot toggle cores every tick.

pub mod error;
pub mod hysteresis;
pub mod policy;
pub mod sampler;

pub use error::PolicyError;
pub use hysteresis::{HysteresisGate, BASE_INTERVAL_MS};
pub use policy::{ThresholdPolicy, ThresholdSet, Zone};
pub use sampler::LoadSampler;
