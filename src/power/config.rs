//! Configuration for the raw power sum engine

use std::collections::BTreeSet;

use crate::subscription::{merge_decay, merge_window, validate_weighting};
use crate::traits::{ConfigError, EngineConfig};

/// What a [`PowerCore`](super::PowerCore) tracks
///
/// Orders are signed: `-1` sums reciprocals and `0` counts.
///
/// # Example
///
/// ```
/// use flowmoments::power::PowerConfig;
/// use flowmoments::traits::EngineConfig;
///
/// let harmonic = PowerConfig::new().with_sums([-1, 0]).with_window(3);
/// let mean = PowerConfig::new().with_sums([0, 1]).with_window(3);
///
/// let merged = harmonic.merge(&mean).unwrap();
/// assert_eq!(merged.sums.len(), 3);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct PowerConfig {
    /// Powers `k` for which `Σ x^k` is maintained
    pub sums: BTreeSet<i32>,
    /// Trailing window size; 0 means unbounded
    pub window: usize,
    /// Exponential decay in (0, 1); `None` weights all observations equally
    pub decay: Option<f64>,
}

impl PowerConfig {
    /// Track nothing but the extremes, unwindowed and undecayed
    pub fn new() -> Self {
        Self::default()
    }

    /// Add powers to track
    pub fn with_sums(mut self, orders: impl IntoIterator<Item = i32>) -> Self {
        self.sums.extend(orders);
        self
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_decay(mut self, decay: f64) -> Self {
        self.decay = Some(decay);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        validate_weighting(self.window, self.decay)
    }
}

impl EngineConfig for PowerConfig {
    fn merge(&self, other: &Self) -> Result<Self, ConfigError> {
        Ok(Self {
            sums: self.sums.union(&other.sums).copied().collect(),
            window: merge_window(self.window, other.window)?,
            decay: merge_decay(self.decay, other.decay)?,
        })
    }
}
