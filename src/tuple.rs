//! Exponent tuples for joint central moments
//!
//! A [`Tuple`] `(t_1, ..., t_k)` names the joint centralized sum
//! `Σ Π_j (x_j - μ_j)^t_j`. The joint engine needs a handful of pure
//! operations on them: magnitude, componentwise subtraction, multinomial
//! coefficients between a tuple and a sub-tuple, enumeration of all
//! sub-tuples, and a collision-free integer key ([`MixedRadix`]).

use core::fmt;

use crate::math;
use crate::traits::{ConfigError, TupleError};

/// Fixed-length vector of non-negative exponents
///
/// # Example
///
/// ```
/// use flowmoments::Tuple;
///
/// let a = Tuple::from([2, 1]);
/// let b = Tuple::from([1, 1]);
///
/// assert_eq!(a.magnitude(), 3);
/// assert_eq!(a.checked_sub(&b).unwrap(), Tuple::from([1, 0]));
/// assert_eq!(a.multinomial(&b).unwrap(), 2.0);
/// assert!(b.checked_sub(&a).is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct Tuple(Box<[u32]>);

impl Tuple {
    /// Create a tuple from its components
    pub fn new(components: impl Into<Box<[u32]>>) -> Self {
        Self(components.into())
    }

    /// The all-zero tuple over `len` variables
    pub fn zero(len: usize) -> Self {
        Self(vec![0; len].into_boxed_slice())
    }

    /// Number of variables
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the tuple has no components
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw exponents
    pub fn components(&self) -> &[u32] {
        &self.0
    }

    /// Total order `|t| = Σ t_i`, saturating at `u32::MAX`
    pub fn magnitude(&self) -> u32 {
        self.0.iter().fold(0u32, |acc, &c| acc.saturating_add(c))
    }

    /// Check if every component is zero
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&c| c == 0)
    }

    /// Check if `other <= self` componentwise
    pub fn dominates(&self, other: &Tuple) -> bool {
        self.len() == other.len() && self.0.iter().zip(other.0.iter()).all(|(a, b)| a >= b)
    }

    /// Componentwise `self - rhs`
    ///
    /// Fails if the lengths differ or any component would go negative.
    pub fn checked_sub(&self, rhs: &Tuple) -> Result<Tuple, TupleError> {
        self.check_len(rhs)?;
        self.0
            .iter()
            .zip(rhs.0.iter())
            .enumerate()
            .map(|(index, (&a, &b))| {
                a.checked_sub(b).ok_or_else(|| TupleError::Negative {
                    lhs: self.clone(),
                    rhs: rhs.clone(),
                    index,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Tuple::from)
    }

    /// Multinomial coefficient `Π_i C(self_i, sub_i)`
    ///
    /// `sub` must be dominated by `self`.
    pub fn multinomial(&self, sub: &Tuple) -> Result<f64, TupleError> {
        self.checked_sub(sub)?;
        self.0
            .iter()
            .zip(sub.0.iter())
            .map(|(&a, &b)| math::binomial(a, b).map(|c| c as f64))
            .product::<Option<f64>>()
            .ok_or_else(|| TupleError::CoefficientOverflow {
                lhs: self.clone(),
                rhs: sub.clone(),
            })
    }

    /// `Π_i delta_i^self_i`
    ///
    /// `delta` must have one entry per variable.
    pub fn power_of(&self, delta: &[f64]) -> f64 {
        debug_assert_eq!(self.len(), delta.len());
        self.0
            .iter()
            .zip(delta)
            .map(|(&e, &d)| math::powu(d, e))
            .product()
    }

    /// Every tuple `b` with `0 <= b <= self`, zero tuple first
    pub fn sub_tuples(&self) -> SubTuples<'_> {
        SubTuples {
            bound: self,
            next: Some(vec![0; self.len()]),
        }
    }

    fn check_len(&self, other: &Tuple) -> Result<(), TupleError> {
        if self.len() != other.len() {
            return Err(TupleError::LengthMismatch {
                left: self.len(),
                right: other.len(),
            });
        }
        Ok(())
    }
}

impl From<Vec<u32>> for Tuple {
    fn from(components: Vec<u32>) -> Self {
        Self(components.into_boxed_slice())
    }
}

impl From<&[u32]> for Tuple {
    fn from(components: &[u32]) -> Self {
        Self(components.into())
    }
}

impl<const N: usize> From<[u32; N]> for Tuple {
    fn from(components: [u32; N]) -> Self {
        Self(Box::new(components))
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", c)?;
        }
        write!(f, ")")
    }
}

impl fmt::Debug for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tuple{}", self)
    }
}

/// Odometer over the box `[0, bound]`
pub struct SubTuples<'a> {
    bound: &'a Tuple,
    next: Option<Vec<u32>>,
}

impl Iterator for SubTuples<'_> {
    type Item = Tuple;

    fn next(&mut self) -> Option<Tuple> {
        let current = self.next.take()?;
        let mut following = current.clone();
        let mut carried = true;
        for (digit, &max) in following.iter_mut().zip(self.bound.0.iter()) {
            if *digit < max {
                *digit += 1;
                carried = false;
                break;
            }
            *digit = 0;
        }
        if !carried {
            self.next = Some(following);
        }
        Some(Tuple::from(current))
    }
}

/// Collision-free integer keys for tuples within fixed bounds
///
/// Component `i` is a digit in base `max_i + 1`, so every tuple dominated by
/// the bounds maps to a distinct `u64`. Tuples outside the bounds have no key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MixedRadix {
    radices: Box<[u64]>,
}

impl MixedRadix {
    /// Smallest radices covering every tuple in `tuples`
    ///
    /// All tuples must share the length `len`.
    pub fn covering<'a>(
        len: usize,
        tuples: impl IntoIterator<Item = &'a Tuple>,
    ) -> Result<Self, ConfigError> {
        let mut radices = vec![1u64; len];
        for tuple in tuples {
            for (radix, &c) in radices.iter_mut().zip(tuple.components()) {
                *radix = (*radix).max(u64::from(c) + 1);
            }
        }
        radices
            .iter()
            .try_fold(1u64, |acc, &r| acc.checked_mul(r))
            .ok_or(ConfigError::KeySpaceOverflow)?;
        Ok(Self {
            radices: radices.into_boxed_slice(),
        })
    }

    /// Key of `tuple`, or `None` if it lies outside the bounds
    pub fn key(&self, tuple: &Tuple) -> Option<u64> {
        if tuple.len() != self.radices.len() {
            return None;
        }
        let mut key = 0u64;
        let mut place = 1u64;
        for (&c, &radix) in tuple.components().iter().zip(self.radices.iter()) {
            let c = u64::from(c);
            if c >= radix {
                return None;
            }
            key += c * place;
            place *= radix;
        }
        Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_magnitude_and_zero() {
        assert_eq!(Tuple::from([2, 0, 3]).magnitude(), 5);
        assert!(Tuple::zero(3).is_zero());
        assert!(!Tuple::from([0, 1]).is_zero());
    }

    #[test]
    fn test_equality_is_componentwise() {
        assert_eq!(Tuple::from([1, 2]), Tuple::from(vec![1, 2]));
        assert_ne!(Tuple::from([1, 2]), Tuple::from([2, 1]));
        assert_ne!(Tuple::from([1, 2]), Tuple::from([1, 2, 0]));
    }

    #[test]
    fn test_checked_sub() {
        let a = Tuple::from([3, 2]);
        assert_eq!(a.checked_sub(&Tuple::from([1, 2])).unwrap(), Tuple::from([2, 0]));

        let err = a.checked_sub(&Tuple::from([1, 3])).unwrap_err();
        assert!(matches!(err, TupleError::Negative { index: 1, .. }));

        let err = a.checked_sub(&Tuple::from([1])).unwrap_err();
        assert_eq!(err, TupleError::LengthMismatch { left: 2, right: 1 });
    }

    #[test]
    fn test_multinomial() {
        // C(4,2) * C(3,1) = 6 * 3
        let a = Tuple::from([4, 3]);
        assert_eq!(a.multinomial(&Tuple::from([2, 1])).unwrap(), 18.0);
        assert_eq!(a.multinomial(&Tuple::zero(2)).unwrap(), 1.0);
        assert_eq!(a.multinomial(&a).unwrap(), 1.0);
        assert!(a.multinomial(&Tuple::from([5, 0])).is_err());

        let wide = Tuple::from([70, 2]);
        assert!(matches!(
            wide.multinomial(&Tuple::from([35, 1])),
            Err(TupleError::CoefficientOverflow { .. })
        ));
        assert_eq!(wide.multinomial(&Tuple::from([1, 1])).unwrap(), 140.0);
    }

    #[test]
    fn test_magnitude_saturates() {
        assert_eq!(Tuple::from([3, 0, 2]).magnitude(), 5);
        assert_eq!(Tuple::from([u32::MAX, 1]).magnitude(), u32::MAX);
    }

    #[test]
    fn test_power_of() {
        let t = Tuple::from([2, 1, 0]);
        assert_eq!(t.power_of(&[3.0, -2.0, 7.0]), -18.0);
    }

    #[test]
    fn test_sub_tuples() {
        let subs: Vec<Tuple> = Tuple::from([1, 2]).sub_tuples().collect();
        assert_eq!(subs.len(), 6);
        assert_eq!(subs[0], Tuple::zero(2));
        assert_eq!(subs[5], Tuple::from([1, 2]));

        let unique: HashSet<_> = subs.iter().cloned().collect();
        assert_eq!(unique.len(), 6);
        assert!(subs.iter().all(|b| Tuple::from([1, 2]).dominates(b)));
    }

    #[test]
    fn test_sub_tuples_of_zero() {
        let subs: Vec<Tuple> = Tuple::zero(2).sub_tuples().collect();
        assert_eq!(subs, vec![Tuple::zero(2)]);
    }

    #[test]
    fn test_mixed_radix_is_collision_free() {
        let bound = Tuple::from([2, 3, 1]);
        let radix = MixedRadix::covering(3, [&bound]).unwrap();

        let keys: HashSet<u64> = bound.sub_tuples().map(|t| radix.key(&t).unwrap()).collect();
        assert_eq!(keys.len(), 3 * 4 * 2);

        assert_eq!(radix.key(&Tuple::from([3, 0, 0])), None);
        assert_eq!(radix.key(&Tuple::from([1, 1])), None);
    }

    #[test]
    fn test_mixed_radix_overflow() {
        let huge = Tuple::from([u32::MAX, u32::MAX, u32::MAX]);
        assert_eq!(
            MixedRadix::covering(3, [&huge]),
            Err(ConfigError::KeySpaceOverflow)
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Tuple::from([1, 0, 2]).to_string(), "(1, 0, 2)");
        assert_eq!(format!("{:?}", Tuple::from([1, 1])), "Tuple(1, 1)");
    }
}
