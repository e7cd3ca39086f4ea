//! Joint engine: running means and multivariate centralized sums
//!
//! Generalizes the univariate recurrence to `k` co-observed variables. A
//! push computes every new sum into a scratch table from the committed
//! previous sums and only then commits the table, so no tuple ever reads a
//! partially updated sum of another. Eviction walks the tuples in increasing
//! magnitude and reads the lower-order sums it depends on from the scratch
//! table, where they have already been reverted.

use core::num::NonZeroUsize;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, trace};

use super::config::JointConfig;
use super::plan::Plan;
use crate::math::{decayed_coefficient, insertion_coefficient, powu};
use crate::traits::{ConfigError, Engine, Reader, StatsError};
use crate::tuple::Tuple;
use crate::window::Window;

/// Shared guard for composing several reads atomically
pub type JointReadGuard<'a> = RwLockReadGuard<'a, JointState>;

/// Exclusive guard for composing reads and writes atomically
pub type JointWriteGuard<'a> = RwLockWriteGuard<'a, JointState>;

/// Thread-safe joint moment engine
///
/// # Example
///
/// ```
/// use flowmoments::joint::{JointConfig, JointCore};
///
/// let config = JointConfig::new().with_sums([[1, 1], [2, 0], [0, 2]]);
/// let core = JointCore::new(&config).unwrap();
///
/// core.push(&[1.0, 2.0]).unwrap();
/// core.push(&[2.0, 4.0]).unwrap();
/// core.push(&[3.0, 6.0]).unwrap();
///
/// assert!((core.mean(1).unwrap() - 4.0).abs() < 1e-12);
/// assert!((core.sum([1, 1]).unwrap() - 4.0).abs() < 1e-12);
/// assert!((core.sum([0, 2]).unwrap() - 8.0).abs() < 1e-12);
/// assert!(core.push(&[1.0]).is_err());
/// ```
#[derive(Debug)]
pub struct JointCore {
    state: RwLock<JointState>,
}

impl JointCore {
    /// Validate `config` and create an empty engine
    pub fn new(config: &JointConfig) -> Result<Self, ConfigError> {
        let vars = config.validate()?;
        let plan = Plan::new(vars, &config.sums)?;
        debug!(
            vars,
            requested = config.sums.len(),
            tracked = plan.len(),
            window = config.window,
            decay = ?config.decay,
            "created joint core"
        );
        Ok(Self {
            state: RwLock::new(JointState::new(vars, plan, config)),
        })
    }

    /// Consume one joint observation, one value per variable
    pub fn push(&self, xs: &[f64]) -> Result<(), StatsError> {
        self.state.write().push(xs)
    }

    /// Joint centralized sum for an exponent tuple
    pub fn sum(&self, tuple: impl Into<Tuple>) -> Result<f64, StatsError> {
        self.state.read().sum(&tuple.into())
    }

    /// Running mean of variable `i`
    pub fn mean(&self, i: usize) -> Result<f64, StatsError> {
        self.state.read().mean(i)
    }

    /// Acquire the shared lock for several reads
    pub fn read(&self) -> JointReadGuard<'_> {
        self.state.read()
    }

    /// Acquire the exclusive lock for a read-then-write sequence
    pub fn write(&self) -> JointWriteGuard<'_> {
        self.state.write()
    }
}

impl Engine for JointCore {
    type Config = JointConfig;

    fn from_config(config: &JointConfig) -> Result<Self, ConfigError> {
        Self::new(config)
    }

    fn count(&self) -> u64 {
        self.state.read().count()
    }

    fn window_count(&self) -> u64 {
        self.state.read().window_count()
    }

    fn clear(&self) {
        self.state.write().clear();
    }
}

impl Reader<JointCore> {
    /// Acquire the shared lock for several reads
    pub fn read(&self) -> JointReadGuard<'_> {
        self.engine().read()
    }

    /// Joint centralized sum for an exponent tuple
    pub fn sum(&self, tuple: impl Into<Tuple>) -> Result<f64, StatsError> {
        self.engine().sum(tuple)
    }

    /// Running mean of variable `i`
    pub fn mean(&self, i: usize) -> Result<f64, StatsError> {
        self.engine().mean(i)
    }
}

/// Accumulators behind a [`JointCore`]'s lock
#[derive(Debug)]
pub struct JointState {
    plan: Plan,
    means: Vec<f64>,
    /// Committed sums, one per plan slot
    sums: Vec<f64>,
    /// Next sums, swapped in after a full pass
    scratch: Vec<f64>,
    delta: Vec<f64>,
    count: u64,
    seen: u64,
    window: usize,
    decay: Option<f64>,
    buffer: Option<Window<Box<[f64]>>>,
}

impl JointState {
    fn new(vars: usize, plan: Plan, config: &JointConfig) -> Self {
        let slots = plan.len();
        Self {
            plan,
            means: vec![0.0; vars],
            sums: vec![0.0; slots],
            scratch: vec![0.0; slots],
            delta: vec![0.0; vars],
            count: 0,
            seen: 0,
            window: config.window,
            decay: config.decay,
            buffer: NonZeroUsize::new(config.window).map(Window::new),
        }
    }

    /// Consume one joint observation, evicting the oldest first if the window is full
    ///
    /// Fails without touching any state if `xs` has the wrong length.
    /// Observations with a non-finite component are skipped.
    pub fn push(&mut self, xs: &[f64]) -> Result<(), StatsError> {
        if xs.len() != self.means.len() {
            return Err(StatsError::Arity {
                expected: self.means.len(),
                found: xs.len(),
            });
        }
        if xs.iter().any(|x| !x.is_finite()) {
            trace!(?xs, "skipping non-finite observation");
            return Ok(());
        }

        let evicted = match self.buffer.as_mut() {
            Some(buffer) if buffer.is_full() => Some(buffer.pop()?),
            _ => None,
        };
        if let Some(oldest) = evicted {
            trace!(?oldest, "evicting from window");
            self.remove(&oldest);
        }
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.push(xs.into())?;
        }

        match self.decay {
            None => self.add(xs),
            Some(decay) => self.add_decayed(xs, decay),
        }
        self.seen += 1;
        Ok(())
    }

    /// Reset to the zero state with a fresh window
    pub fn clear(&mut self) {
        debug!(seen = self.seen, "clearing joint core");
        self.reset_accumulators();
        self.seen = 0;
        self.buffer = NonZeroUsize::new(self.window).map(Window::new);
    }

    /// Joint centralized sum over the observations in scope
    pub fn sum(&self, tuple: &Tuple) -> Result<f64, StatsError> {
        if self.count == 0 {
            return Err(StatsError::NoValues);
        }
        self.plan
            .slot_of(tuple)
            .map(|slot| self.sums[slot])
            .ok_or_else(|| StatsError::UntrackedTuple(tuple.clone()))
    }

    /// Running mean of variable `i`
    pub fn mean(&self, i: usize) -> Result<f64, StatsError> {
        if self.count == 0 {
            return Err(StatsError::NoValues);
        }
        self.means
            .get(i)
            .copied()
            .ok_or(StatsError::UntrackedVariable(i))
    }

    /// Observations pushed since construction or the last clear
    pub fn count(&self) -> u64 {
        self.seen
    }

    /// Observations currently contributing, at most the window size
    pub fn window_count(&self) -> u64 {
        self.count
    }

    /// Number of co-observed variables
    pub fn vars(&self) -> usize {
        self.means.len()
    }

    /// Every tracked tuple, requested or derived, in increasing magnitude
    pub fn tuples(&self) -> impl Iterator<Item = &Tuple> {
        self.plan.slots().iter().map(|slot| &slot.tuple)
    }

    fn add(&mut self, xs: &[f64]) {
        self.count += 1;
        let n = self.count as f64;
        for ((mean, delta), &x) in self.means.iter_mut().zip(&mut self.delta).zip(xs) {
            *delta = x - *mean;
            *mean += *delta / n;
        }

        let delta = &self.delta;
        for (s, slot) in self.plan.slots().iter().enumerate() {
            let mut sum =
                self.sums[s] + insertion_coefficient(n, slot.order) * slot.tuple.power_of(delta);
            for term in &slot.terms {
                sum += term.weight / powu(n, term.order)
                    * term.exponents.power_of(delta)
                    * self.sums[term.source];
            }
            self.scratch[s] = sum;
        }
        core::mem::swap(&mut self.sums, &mut self.scratch);
    }

    fn add_decayed(&mut self, xs: &[f64], decay: f64) {
        self.count += 1;
        // The first observation takes full weight so the means start at xs
        let decay = if self.count == 1 { 1.0 } else { decay };
        for ((mean, delta), &x) in self.means.iter_mut().zip(&mut self.delta).zip(xs) {
            *delta = x - *mean;
            *mean += decay * *delta;
        }

        let delta = &self.delta;
        for (s, slot) in self.plan.slots().iter().enumerate() {
            let mut sum = (1.0 - decay) * self.sums[s]
                + decayed_coefficient(decay, slot.order) * slot.tuple.power_of(delta);
            for term in &slot.terms {
                sum += term.weight
                    * powu(decay, term.order)
                    * term.exponents.power_of(delta)
                    * (1.0 - decay)
                    * self.sums[term.source];
            }
            self.scratch[s] = sum;
        }
        core::mem::swap(&mut self.sums, &mut self.scratch);
    }

    fn remove(&mut self, xs: &[f64]) {
        self.count -= 1;
        if self.count == 0 {
            self.reset_accumulators();
            return;
        }

        let m = self.count as f64;
        let n = m + 1.0;
        for ((mean, delta), &x) in self.means.iter_mut().zip(&mut self.delta).zip(xs) {
            *mean -= (x - *mean) / m;
            *delta = x - *mean;
        }

        let delta = &self.delta;
        for (s, slot) in self.plan.slots().iter().enumerate() {
            let mut sum =
                self.sums[s] - insertion_coefficient(n, slot.order) * slot.tuple.power_of(delta);
            for term in &slot.terms {
                // Lower magnitude, so already reverted in this pass
                sum -= term.weight / powu(n, term.order)
                    * term.exponents.power_of(delta)
                    * self.scratch[term.source];
            }
            self.scratch[s] = sum;
        }
        core::mem::swap(&mut self.sums, &mut self.scratch);
    }

    fn reset_accumulators(&mut self) {
        self.means.iter_mut().for_each(|m| *m = 0.0);
        self.sums.iter_mut().for_each(|s| *s = 0.0);
        self.scratch.iter_mut().for_each(|s| *s = 0.0);
        self.count = 0;
    }
}
