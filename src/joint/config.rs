//! Configuration for the joint engine

use crate::math::MAX_ORDER;
use crate::subscription::{merge_decay, merge_window, validate_weighting};
use crate::traits::{ConfigError, EngineConfig};
use crate::tuple::Tuple;

/// What a [`JointCore`](super::JointCore) tracks
///
/// The variable count is inferred from the tuples when not given.
///
/// # Example
///
/// ```
/// use flowmoments::joint::JointConfig;
/// use flowmoments::traits::EngineConfig;
///
/// let covariance = JointConfig::new().with_sums([[1, 1]]);
/// let variances = JointConfig::new().with_sums([[2, 0], [0, 2]]);
///
/// let merged = covariance.merge(&variances).unwrap();
/// assert_eq!(merged.sums.len(), 3);
/// assert_eq!(merged.variables().unwrap(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct JointConfig {
    /// Exponent tuples whose joint centralized sums are requested
    pub sums: Vec<Tuple>,
    /// Number of co-observed variables
    pub vars: Option<usize>,
    /// Trailing window size; 0 means unbounded
    pub window: usize,
    /// Exponential decay in (0, 1); `None` weights all observations equally
    pub decay: Option<f64>,
}

impl JointConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add tuples to track, ignoring ones already present
    pub fn with_sums<T: Into<Tuple>>(mut self, tuples: impl IntoIterator<Item = T>) -> Self {
        for tuple in tuples {
            let tuple = tuple.into();
            if !self.sums.contains(&tuple) {
                self.sums.push(tuple);
            }
        }
        self
    }

    /// Fix the number of variables explicitly
    pub fn with_vars(mut self, vars: usize) -> Self {
        self.vars = Some(vars);
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

    /// Explicit variable count, or the length of the first tuple
    pub fn variables(&self) -> Result<usize, ConfigError> {
        self.vars
            .or_else(|| self.sums.first().map(Tuple::len))
            .ok_or(ConfigError::UnknownVariables)
    }

    pub(crate) fn validate(&self) -> Result<usize, ConfigError> {
        validate_weighting(self.window, self.decay)?;
        let vars = self.variables()?;
        if vars == 0 {
            return Err(ConfigError::EmptyTuple);
        }
        for tuple in &self.sums {
            if tuple.len() != vars {
                return Err(ConfigError::TupleLength {
                    tuple: tuple.clone(),
                    expected: vars,
                    found: tuple.len(),
                });
            }
            if tuple.is_zero() {
                return Err(ConfigError::ZeroTuple(tuple.clone()));
            }
            let order = tuple.magnitude();
            if order > MAX_ORDER {
                return Err(ConfigError::OrderTooLarge {
                    order,
                    max: MAX_ORDER,
                });
            }
        }
        Ok(vars)
    }
}

impl EngineConfig for JointConfig {
    fn merge(&self, other: &Self) -> Result<Self, ConfigError> {
        let vars = match (self.vars, other.vars) {
            (Some(a), Some(b)) if a != b => return Err(ConfigError::VariablesMismatch(a, b)),
            (a, b) => a.or(b),
        };
        Ok(Self {
            sums: Vec::new(),
            vars,
            window: merge_window(self.window, other.window)?,
            decay: merge_decay(self.decay, other.decay)?,
        }
        .with_sums(self.sums.iter().chain(&other.sums).cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variables_inferred() {
        let config = JointConfig::new().with_sums([[1, 1, 0]]);
        assert_eq!(config.variables(), Ok(3));
        assert_eq!(config.with_vars(4).variables(), Ok(4));
        assert_eq!(
            JointConfig::new().variables(),
            Err(ConfigError::UnknownVariables)
        );
    }

    #[test]
    fn test_validate() {
        assert_eq!(JointConfig::new().with_sums([[2, 1]]).validate(), Ok(2));
        assert_eq!(JointConfig::new().with_vars(3).validate(), Ok(3));

        let mismatched = JointConfig::new().with_sums(vec![vec![1, 1], vec![1, 1, 1]]);
        assert!(matches!(
            mismatched.validate(),
            Err(ConfigError::TupleLength {
                expected: 2,
                found: 3,
                ..
            })
        ));

        let zero = JointConfig::new().with_sums([[0, 0]]);
        assert!(matches!(zero.validate(), Err(ConfigError::ZeroTuple(_))));

        let empty = JointConfig::new().with_sums([Tuple::from(Vec::new())]);
        assert_eq!(empty.validate(), Err(ConfigError::EmptyTuple));

        let decayed = JointConfig::new().with_sums([[1, 1]]).with_decay(2.0);
        assert_eq!(decayed.validate(), Err(ConfigError::InvalidDecay(2.0)));
    }

    #[test]
    fn test_validate_order_limit() {
        assert_eq!(JointConfig::new().with_sums([[MAX_ORDER]]).validate(), Ok(1));
        assert_eq!(
            JointConfig::new().with_sums([[70]]).validate(),
            Err(ConfigError::OrderTooLarge { order: 70, max: MAX_ORDER })
        );
        // Each component alone is fine, the total order is not
        assert_eq!(
            JointConfig::new().with_sums([[40, 30]]).validate(),
            Err(ConfigError::OrderTooLarge { order: 70, max: MAX_ORDER })
        );
        assert_eq!(
            JointConfig::new().with_sums([[u32::MAX, 1]]).validate(),
            Err(ConfigError::OrderTooLarge {
                order: u32::MAX,
                max: MAX_ORDER
            })
        );
    }

    #[test]
    fn test_merge() {
        let a = JointConfig::new().with_sums([[1, 1], [2, 0]]).with_window(5);
        let b = JointConfig::new().with_sums([[2, 0], [0, 2]]).with_window(5);
        let merged = a.merge(&b).unwrap();
        assert_eq!(
            merged.sums,
            vec![Tuple::from([1, 1]), Tuple::from([2, 0]), Tuple::from([0, 2])]
        );
        assert_eq!(merged.window, 5);

        let c = JointConfig::new().with_sums([[1, 1]]).with_decay(0.3);
        assert_eq!(
            a.merge(&c),
            Err(ConfigError::WindowMismatch(5, 0))
        );

        let d = JointConfig::new().with_vars(3).with_window(5);
        let e = JointConfig::new().with_vars(2).with_window(5);
        assert_eq!(d.merge(&e), Err(ConfigError::VariablesMismatch(3, 2)));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize() {
        let config: JointConfig =
            serde_json::from_str(r#"{"sums": [[1, 1], [2, 0]], "decay": 0.25}"#).unwrap();
        assert_eq!(config.sums, vec![Tuple::from([1, 1]), Tuple::from([2, 0])]);
        assert_eq!(config.decay, Some(0.25));
        assert_eq!(config.vars, None);
    }
}
