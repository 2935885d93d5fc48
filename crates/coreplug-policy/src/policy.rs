//! Zone classification against core-count-scaled thresholds.
//!
//! Base levels are percentages of a single core's capacity; the
//! effective level for a decision is `base * online_cores`, since
//! aggregate load naturally rises with more active cores.
//!
//! Two threshold generations exist behind one interface: the legacy
//! three-level scheme (up-all / up-one / down) and the four-level
//! scheme that adds an explicit two-core hold band so a second core
//! isn't toggled on and off during short interaction bursts.

use crate::error::{PolicyError, PolicyResult};

/// Load classification for one tick, in decreasing urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// Load well above capacity: bring up every offline core.
    High,
    /// Load above the single-core comfort band: bring up one core.
    MediumHigh,
    /// Two cores online with moderate load: hold, do not toggle.
    MediumLow,
    /// Load low enough to take cores down.
    Low,
    /// No action implied.
    Hold,
}

impl Zone {
    /// Whether this zone implies an actuator call at all.
    pub fn actuates(self) -> bool {
        matches!(self, Zone::High | Zone::MediumHigh | Zone::Low)
    }
}

/// A validated bundle of base threshold percentages.
///
/// Every level must lie strictly between 0 and 100. No ordering is
/// enforced across levels: overlapping configurations are legal and
/// resolve deterministically because classification is top-down,
/// first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdSet {
    /// Legacy generation: up-all / up-one / down-all boundaries.
    ThreeLevel { first: u32, second: u32, third: u32 },
    /// Current generation, with a dedicated two-core hold boundary
    /// (`third`) and a separate down boundary (`fourth`).
    FourLevel {
        first: u32,
        second: u32,
        third: u32,
        fourth: u32,
    },
}

impl ThresholdSet {
    /// Defaults for the legacy three-level generation.
    pub fn default_three_level() -> Self {
        ThresholdSet::ThreeLevel {
            first: 90,
            second: 25,
            third: 50,
        }
    }

    /// Defaults for the four-level generation.
    pub fn default_four_level() -> Self {
        ThresholdSet::FourLevel {
            first: 90,
            second: 50,
            third: 25,
            fourth: 60,
        }
    }

    /// Build a set from a slice of 3 or 4 levels, validating each
    /// member. Any invalid member rejects the whole tuple.
    pub fn from_levels(levels: &[u32]) -> PolicyResult<Self> {
        for &level in levels {
            if level == 0 || level >= 100 {
                return Err(PolicyError::LevelOutOfRange(level));
            }
        }
        match *levels {
            [first, second, third] => Ok(ThresholdSet::ThreeLevel {
                first,
                second,
                third,
            }),
            [first, second, third, fourth] => Ok(ThresholdSet::FourLevel {
                first,
                second,
                third,
                fourth,
            }),
            _ => Err(PolicyError::LevelCount {
                expected: 4,
                got: levels.len(),
            }),
        }
    }

    /// The base levels in configuration order.
    pub fn levels(&self) -> Vec<u32> {
        match *self {
            ThresholdSet::ThreeLevel {
                first,
                second,
                third,
            } => vec![first, second, third],
            ThresholdSet::FourLevel {
                first,
                second,
                third,
                fourth,
            } => vec![first, second, third, fourth],
        }
    }

    /// Number of levels this generation carries.
    pub fn level_count(&self) -> usize {
        match self {
            ThresholdSet::ThreeLevel { .. } => 3,
            ThresholdSet::FourLevel { .. } => 4,
        }
    }
}

/// Classifies smoothed load into a [`Zone`].
#[derive(Debug, Clone)]
pub struct ThresholdPolicy {
    set: ThresholdSet,
}

impl ThresholdPolicy {
    pub fn new(set: ThresholdSet) -> Self {
        Self { set }
    }

    /// The current threshold set.
    pub fn set(&self) -> &ThresholdSet {
        &self.set
    }

    /// Replace the whole threshold set in one assignment.
    pub fn replace(&mut self, set: ThresholdSet) {
        self.set = set;
    }

    /// Classify one tick's smoothed load.
    ///
    /// Pure function of the inputs and the configured set. Evaluation
    /// is top-down; the first matching band wins.
    pub fn classify(&self, averaged_load: u32, online_cores: u32) -> Zone {
        match self.set {
            ThresholdSet::ThreeLevel {
                first,
                second,
                third,
            } => {
                if averaged_load >= first * online_cores {
                    Zone::High
                } else if averaged_load >= second * online_cores {
                    Zone::MediumHigh
                } else if averaged_load <= third * online_cores && online_cores > 1 {
                    Zone::Low
                } else {
                    Zone::Hold
                }
            }
            ThresholdSet::FourLevel {
                first,
                second,
                third,
                fourth,
            } => {
                let eff_third = third * online_cores;
                if averaged_load >= first * online_cores {
                    Zone::High
                } else if averaged_load >= second * online_cores
                    || (averaged_load >= eff_third && online_cores == 1)
                {
                    Zone::MediumHigh
                } else if averaged_load >= eff_third && online_cores == 2 {
                    Zone::MediumLow
                } else if averaged_load <= fourth * online_cores && online_cores > 1 {
                    Zone::Low
                } else {
                    Zone::Hold
                }
            }
        }
    }
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self::new(ThresholdSet::default_four_level())
    }
}
