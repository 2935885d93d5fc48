//! Load sampler — a fixed-size history of load readings.
//!
//! Each tick feeds the instantaneous load into a ring buffer and gets
//! back the arithmetic mean over the whole buffer. The averaging
//! filters out brief load spikes (and dips) so a single busy frame
//! doesn't online a core.

/// Number of samples kept in the history buffer.
pub const HISTORY_SIZE: usize = 10;

/// A ring buffer of the last [`HISTORY_SIZE`] load samples.
///
/// Unwritten slots are zero, so the average reads low during the first
/// `HISTORY_SIZE` ticks after startup. That warm-up bias is deliberate:
/// it keeps the controller from onlining cores off a handful of early
/// samples.
#[derive(Debug, Clone)]
pub struct LoadSampler {
    history: [u32; HISTORY_SIZE],
    cursor: usize,
}

impl LoadSampler {
    pub fn new() -> Self {
        Self {
            history: [0; HISTORY_SIZE],
            cursor: 0,
        }
    }

    /// Record one load sample and return the smoothed average.
    ///
    /// Overwrites the oldest slot, advances the cursor, and averages
    /// over all `HISTORY_SIZE` slots. Never blocks, never fails.
    pub fn record(&mut self, sample: u32) -> u32 {
        self.history[self.cursor] = sample;
        self.cursor = (self.cursor + 1) % HISTORY_SIZE;

        let sum: u64 = self.history.iter().map(|&s| u64::from(s)).sum();
        (sum / HISTORY_SIZE as u64) as u32
    }

    /// The samples currently held, oldest slot first in storage order.
    #[cfg(test)]
    fn slots(&self) -> &[u32; HISTORY_SIZE] {
        &self.history
    }
}

impl Default for LoadSampler {
    fn default() -> Self {
        Self::new()
    }
}
