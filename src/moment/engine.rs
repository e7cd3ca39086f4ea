//! Univariate engine: running mean and centralized power sums
//!
//! Updates follow the incremental recurrences of P. Pébay, T. B. Terriberry,
//! H. Kolla and J. Bennett, "Numerically stable, scalable formulas for
//! parallel and online computation of higher-order multivariate central
//! moments with arbitrary weights", Computational Statistics 31 (2016).
//! Each push costs O(max_order²) regardless of stream length, and windowed
//! eviction runs the exact inverse of the insertion that added the value.

use core::num::NonZeroUsize;
use std::collections::BTreeSet;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, trace};

use super::config::MomentConfig;
use crate::math::{
    binomial_rows, decayed_coefficient, insertion_coefficient, parity_sign, powu, MAX_ORDER,
};
use crate::traits::{ConfigError, Engine, Reader, StatsError};
use crate::window::Window;

/// Shared guard for composing several reads atomically
pub type MomentReadGuard<'a> = RwLockReadGuard<'a, MomentState>;

/// Exclusive guard for composing reads and writes atomically
pub type MomentWriteGuard<'a> = RwLockWriteGuard<'a, MomentState>;

/// Thread-safe univariate moment engine
///
/// # Example
///
/// ```
/// use flowmoments::moment::{MomentConfig, MomentCore};
///
/// let core = MomentCore::new(&MomentConfig::new().with_sums([2, 3, 4])).unwrap();
/// for x in [1.0, 2.0, 3.0, 4.0] {
///     core.push(x).unwrap();
/// }
///
/// assert!((core.mean().unwrap() - 2.5).abs() < 1e-12);
/// assert!((core.sum(2).unwrap() - 5.0).abs() < 1e-12);
/// assert!(core.sum(3).unwrap().abs() < 1e-12);
/// assert!((core.sum(4).unwrap() - 10.25).abs() < 1e-12);
/// ```
///
/// # Atomic reads
///
/// ```
/// use flowmoments::moment::{MomentConfig, MomentCore};
///
/// let core = MomentCore::new(&MomentConfig::new().with_sums([2, 4])).unwrap();
/// core.push(1.0).unwrap();
/// core.push(3.0).unwrap();
///
/// // Both sums come from the same point in the stream
/// let state = core.read();
/// let ratio = state.sum(4).unwrap() / state.sum(2).unwrap().powi(2);
/// assert!((ratio - 0.5).abs() < 1e-12);
/// ```
#[derive(Debug)]
pub struct MomentCore {
    state: RwLock<MomentState>,
}

impl MomentCore {
    /// Validate `config` and create an empty engine
    pub fn new(config: &MomentConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        debug!(
            sums = ?config.sums,
            window = config.window,
            decay = ?config.decay,
            "created moment core"
        );
        Ok(Self {
            state: RwLock::new(MomentState::new(config)?),
        })
    }

    /// Consume one observation
    pub fn push(&self, x: f64) -> Result<(), StatsError> {
        self.state.write().push(x)
    }

    /// `k`th centralized power sum
    pub fn sum(&self, k: u32) -> Result<f64, StatsError> {
        self.state.read().sum(k)
    }

    /// Running mean
    pub fn mean(&self) -> Result<f64, StatsError> {
        self.state.read().mean()
    }

    /// Acquire the shared lock for several reads
    pub fn read(&self) -> MomentReadGuard<'_> {
        self.state.read()
    }

    /// Acquire the exclusive lock for a read-then-write sequence
    pub fn write(&self) -> MomentWriteGuard<'_> {
        self.state.write()
    }
}

impl Engine for MomentCore {
    type Config = MomentConfig;

    fn from_config(config: &MomentConfig) -> Result<Self, ConfigError> {
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

impl Reader<MomentCore> {
    /// Acquire the shared lock for several reads
    pub fn read(&self) -> MomentReadGuard<'_> {
        self.engine().read()
    }

    /// `k`th centralized power sum
    pub fn sum(&self, k: u32) -> Result<f64, StatsError> {
        self.engine().sum(k)
    }

    /// Running mean
    pub fn mean(&self) -> Result<f64, StatsError> {
        self.engine().mean()
    }
}

/// Accumulators behind a [`MomentCore`]'s lock
#[derive(Debug)]
pub struct MomentState {
    mean: f64,
    /// Indexed by order; entries 0 and 1 stay zero
    sums: Vec<f64>,
    requested: BTreeSet<u32>,
    max_order: u32,
    /// `binomials[k][i] = C(k, i)` up to `max_order`
    binomials: Vec<Vec<f64>>,
    /// Observations currently contributing
    count: u64,
    /// Observations pushed since the last clear
    seen: u64,
    window: usize,
    decay: Option<f64>,
    buffer: Option<Window<f64>>,
}

impl MomentState {
    fn new(config: &MomentConfig) -> Result<Self, ConfigError> {
        let max_order = config.max_order();
        let binomials = binomial_rows(max_order).ok_or(ConfigError::OrderTooLarge {
            order: max_order,
            max: MAX_ORDER,
        })?;
        Ok(Self {
            mean: 0.0,
            sums: vec![0.0; max_order as usize + 1],
            requested: config.sums.clone(),
            max_order,
            binomials,
            count: 0,
            seen: 0,
            window: config.window,
            decay: config.decay,
            buffer: NonZeroUsize::new(config.window).map(Window::new),
        })
    }

    /// Consume one observation, evicting the oldest first if the window is full
    ///
    /// Non-finite values are skipped.
    pub fn push(&mut self, x: f64) -> Result<(), StatsError> {
        if !x.is_finite() {
            trace!(x, "skipping non-finite value");
            return Ok(());
        }

        let evicted = match self.buffer.as_mut() {
            Some(buffer) if buffer.is_full() => Some(buffer.pop()?),
            _ => None,
        };
        if let Some(oldest) = evicted {
            trace!(oldest, "evicting from window");
            self.remove(oldest);
        }
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.push(x)?;
        }

        match self.decay {
            None => self.add(x),
            Some(decay) => self.add_decayed(x, decay),
        }
        self.seen += 1;
        Ok(())
    }

    /// Reset to the zero state with a fresh window
    pub fn clear(&mut self) {
        debug!(seen = self.seen, "clearing moment core");
        self.reset_accumulators();
        self.seen = 0;
        self.buffer = NonZeroUsize::new(self.window).map(Window::new);
    }

    /// `k`th centralized power sum over the observations in scope
    pub fn sum(&self, k: u32) -> Result<f64, StatsError> {
        if self.count == 0 {
            return Err(StatsError::NoValues);
        }
        if !self.requested.contains(&k) {
            return Err(StatsError::UntrackedOrder(k));
        }
        Ok(self.sums[k as usize])
    }

    /// Running mean over the observations in scope
    pub fn mean(&self) -> Result<f64, StatsError> {
        if self.count == 0 {
            return Err(StatsError::NoValues);
        }
        Ok(self.mean)
    }

    /// Observations pushed since construction or the last clear
    pub fn count(&self) -> u64 {
        self.seen
    }

    /// Observations currently contributing, at most the window size
    pub fn window_count(&self) -> u64 {
        self.count
    }

    /// Trailing window size, 0 when unbounded
    pub fn window(&self) -> usize {
        self.window
    }

    /// Configured decay
    pub fn decay(&self) -> Option<f64> {
        self.decay
    }

    fn add(&mut self, x: f64) {
        self.count += 1;
        let n = self.count as f64;
        let delta = x - self.mean;
        self.mean += delta / n;

        // Descending, so every lower order read below is still the old value
        for k in (2..=self.max_order).rev() {
            let mut sum = self.sums[k as usize] + insertion_coefficient(n, k) * powu(delta, k);
            for i in 1..=k - 2 {
                sum += self.binomials[k as usize][i as usize]
                    * parity_sign(i)
                    * powu(delta / n, i)
                    * self.sums[(k - i) as usize];
            }
            self.sums[k as usize] = sum;
        }
    }

    fn add_decayed(&mut self, x: f64, decay: f64) {
        self.count += 1;
        // The first observation takes full weight so the mean starts at x
        let decay = if self.count == 1 { 1.0 } else { decay };
        let delta = x - self.mean;
        self.mean += decay * delta;

        for k in (2..=self.max_order).rev() {
            let mut sum =
                (1.0 - decay) * self.sums[k as usize] + decayed_coefficient(decay, k) * powu(delta, k);
            for i in 1..=k - 2 {
                sum += self.binomials[k as usize][i as usize]
                    * parity_sign(i)
                    * powu(decay * delta, i)
                    * (1.0 - decay)
                    * self.sums[(k - i) as usize];
            }
            self.sums[k as usize] = sum;
        }
    }

    fn remove(&mut self, x: f64) {
        self.count -= 1;
        if self.count == 0 {
            self.reset_accumulators();
            return;
        }

        let m = self.count as f64;
        let n = m + 1.0;
        self.mean -= (x - self.mean) / m;
        let delta = x - self.mean;

        // Ascending, so every lower order read below is already reverted
        for k in 2..=self.max_order {
            let mut sum = self.sums[k as usize] - insertion_coefficient(n, k) * powu(delta, k);
            for i in 1..=k - 2 {
                sum -= self.binomials[k as usize][i as usize]
                    * parity_sign(i)
                    * powu(delta / n, i)
                    * self.sums[(k - i) as usize];
            }
            self.sums[k as usize] = sum;
        }
    }

    fn reset_accumulators(&mut self) {
        self.mean = 0.0;
        self.sums.iter_mut().for_each(|s| *s = 0.0);
        self.count = 0;
    }
}
