//! Precomputed recurrence for the joint engine
//!
//! For every tracked tuple `a` the update needs, for each `0 < b < a`, the
//! multinomial coefficient `C(a, b)`, the parity sign of `|b|` and the slot
//! holding `S_{a-b}`. All of that depends only on the configuration, so it is
//! derived once here and the push path does no tuple arithmetic or hashing.

use std::collections::BTreeSet;

use nohash_hasher::IntMap;

use crate::math::parity_sign;
use crate::traits::ConfigError;
use crate::tuple::{MixedRadix, Tuple};

/// One cross term `C(a, b) (-1)^|b| δ^b S_{a-b}` of a slot's update
#[derive(Clone, Debug)]
pub(crate) struct Term {
    pub exponents: Tuple,
    pub order: u32,
    /// `C(a, b) * (-1)^|b|`
    pub weight: f64,
    /// Slot of `a - b`, always of lower magnitude than the owning slot
    pub source: usize,
}

#[derive(Clone, Debug)]
pub(crate) struct Slot {
    pub tuple: Tuple,
    pub order: u32,
    pub terms: Vec<Term>,
}

/// Tracked tuples in increasing magnitude, with their update terms
#[derive(Clone, Debug)]
pub(crate) struct Plan {
    slots: Vec<Slot>,
    radix: MixedRadix,
    index: IntMap<u64, usize>,
}

impl Plan {
    /// Track every non-zero tuple dominated by one of `targets`
    pub fn new(vars: usize, targets: &[Tuple]) -> Result<Self, ConfigError> {
        let radix = MixedRadix::covering(vars, targets)?;

        let tracked: BTreeSet<Tuple> = targets
            .iter()
            .flat_map(Tuple::sub_tuples)
            .filter(|t| !t.is_zero())
            .collect();
        let mut tuples: Vec<Tuple> = tracked.into_iter().collect();
        tuples.sort_by_key(Tuple::magnitude);

        let mut index = IntMap::default();
        for (slot, tuple) in tuples.iter().enumerate() {
            let key = radix
                .key(tuple)
                .ok_or_else(|| ConfigError::UntrackedDependency(tuple.clone()))?;
            index.insert(key, slot);
        }

        let mut plan = Self {
            slots: Vec::with_capacity(tuples.len()),
            radix,
            index,
        };
        for tuple in tuples {
            let terms = plan.terms_for(&tuple)?;
            plan.slots.push(Slot {
                order: tuple.magnitude(),
                tuple,
                terms,
            });
        }
        Ok(plan)
    }

    fn terms_for(&self, a: &Tuple) -> Result<Vec<Term>, ConfigError> {
        let mut terms = Vec::new();
        for b in a.sub_tuples() {
            if b.is_zero() || &b == a {
                continue;
            }
            let diff = a.checked_sub(&b)?;
            // First-order central sums are identically zero
            if diff.magnitude() == 1 {
                continue;
            }
            let source = self
                .slot_of(&diff)
                .ok_or(ConfigError::UntrackedDependency(diff))?;
            let order = b.magnitude();
            terms.push(Term {
                weight: a.multinomial(&b)? * parity_sign(order),
                exponents: b,
                order,
                source,
            });
        }
        Ok(terms)
    }

    /// Slot holding the sum for `tuple`, if tracked
    pub fn slot_of(&self, tuple: &Tuple) -> Option<usize> {
        self.radix
            .key(tuple)
            .and_then(|key| self.index.get(&key).copied())
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
}
