//! Configuration for the univariate engine

use std::collections::BTreeSet;

use crate::math::MAX_ORDER;
use crate::subscription::{merge_decay, merge_window, validate_weighting};
use crate::traits::{ConfigError, EngineConfig};

/// What a [`MomentCore`](super::MomentCore) tracks
///
/// # Example
///
/// ```
/// use flowmoments::moment::MomentConfig;
/// use flowmoments::traits::EngineConfig;
///
/// let variance = MomentConfig::new().with_sums([2]).with_window(10);
/// let fourth = MomentConfig::new().with_sums([4]).with_window(10);
///
/// let merged = variance.merge(&fourth).unwrap();
/// assert_eq!(merged.max_order(), 4);
///
/// let global = MomentConfig::new().with_sums([3]);
/// assert!(merged.merge(&global).is_err());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct MomentConfig {
    /// Centralized power sum orders to maintain
    pub sums: BTreeSet<u32>,
    /// Trailing window size; 0 means unbounded
    pub window: usize,
    /// Exponential decay in (0, 1); `None` weights all observations equally
    pub decay: Option<f64>,
}

impl MomentConfig {
    /// Track nothing but the mean, unwindowed and undecayed
    pub fn new() -> Self {
        Self::default()
    }

    /// Add orders to track
    pub fn with_sums(mut self, orders: impl IntoIterator<Item = u32>) -> Self {
        self.sums.extend(orders);
        self
    }

    /// Restrict to the last `window` observations
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Weight observations geometrically by recency
    pub fn with_decay(mut self, decay: f64) -> Self {
        self.decay = Some(decay);
        self
    }

    /// Highest tracked order, 0 when only the mean is tracked
    pub fn max_order(&self) -> u32 {
        self.sums.last().copied().unwrap_or(0)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        validate_weighting(self.window, self.decay)?;
        if self.sums.contains(&0) {
            return Err(ConfigError::InvalidOrder(0));
        }
        let order = self.max_order();
        if order > MAX_ORDER {
            return Err(ConfigError::OrderTooLarge {
                order,
                max: MAX_ORDER,
            });
        }
        Ok(())
    }
}

impl EngineConfig for MomentConfig {
    fn merge(&self, other: &Self) -> Result<Self, ConfigError> {
        Ok(Self {
            sums: self.sums.union(&other.sums).copied().collect(),
            window: merge_window(self.window, other.window)?,
            decay: merge_decay(self.decay, other.decay)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(MomentConfig::new().validate().is_ok());
        assert!(MomentConfig::new().with_sums([1, 2, 3]).validate().is_ok());
        assert_eq!(
            MomentConfig::new().with_sums([0, 2]).validate(),
            Err(ConfigError::InvalidOrder(0))
        );
        assert!(MomentConfig::new().with_sums([MAX_ORDER]).validate().is_ok());
        assert_eq!(
            MomentConfig::new().with_sums([2, 68]).validate(),
            Err(ConfigError::OrderTooLarge { order: 68, max: MAX_ORDER })
        );
        assert_eq!(
            MomentConfig::new().with_sums([u32::MAX]).validate(),
            Err(ConfigError::OrderTooLarge {
                order: u32::MAX,
                max: MAX_ORDER
            })
        );
        assert_eq!(
            MomentConfig::new().with_decay(1.0).validate(),
            Err(ConfigError::InvalidDecay(1.0))
        );
        assert_eq!(
            MomentConfig::new().with_window(3).with_decay(0.5).validate(),
            Err(ConfigError::DecayWithWindow { window: 3 })
        );
    }

    #[test]
    fn test_merge_unions_sums() {
        let a = MomentConfig::new().with_sums([2, 3]);
        let b = MomentConfig::new().with_sums([3, 4]);
        let merged = a.merge(&b).unwrap();
        assert_eq!(merged.sums.into_iter().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn test_merge_conflicts() {
        let a = MomentConfig::new().with_sums([2]).with_window(3);
        let b = MomentConfig::new().with_sums([2]).with_window(4);
        assert_eq!(a.merge(&b), Err(ConfigError::WindowMismatch(3, 4)));

        let a = MomentConfig::new().with_decay(0.1);
        let b = MomentConfig::new().with_decay(0.2);
        assert_eq!(
            a.merge(&b),
            Err(ConfigError::DecayMismatch(Some(0.1), Some(0.2)))
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize() {
        let config: MomentConfig =
            serde_json::from_str(r#"{"sums": [2, 4], "window": 3}"#).unwrap();
        assert_eq!(config, MomentConfig::new().with_sums([2, 4]).with_window(3));

        // Negative windows cannot be represented
        assert!(serde_json::from_str::<MomentConfig>(r#"{"window": -1}"#).is_err());
    }
}
