//! Raw power sums and extremes of a stream

use core::num::NonZeroUsize;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, trace};

use super::config::PowerConfig;
use crate::traits::{ConfigError, Engine, Reader, StatsError};
use crate::window::Window;

/// Shared guard for composing several reads atomically
pub type PowerReadGuard<'a> = RwLockReadGuard<'a, PowerState>;

/// Exclusive guard for composing reads and writes atomically
pub type PowerWriteGuard<'a> = RwLockWriteGuard<'a, PowerState>;

/// Thread-safe engine for uncentered power sums `Σ x^k`, minimum and maximum
///
/// Sums honor the window and decay. The extremes cover every observation
/// since construction or the last clear.
///
/// # Example
///
/// ```
/// use flowmoments::power::{PowerConfig, PowerCore};
///
/// let core = PowerCore::new(&PowerConfig::new().with_sums([-1, 0, 2]).with_window(3)).unwrap();
/// for x in [1.0, 2.0, 3.0, 4.0, 8.0] {
///     core.push(x).unwrap();
/// }
///
/// // 1/3 + 1/4 + 1/8
/// assert!((core.sum(-1).unwrap() - 17.0 / 24.0).abs() < 1e-12);
/// assert_eq!(core.sum(0).unwrap(), 3.0);
/// assert_eq!(core.sum(2).unwrap(), 89.0);
/// assert_eq!(core.min().unwrap(), 1.0);
/// assert_eq!(core.max().unwrap(), 8.0);
/// ```
#[derive(Debug)]
pub struct PowerCore {
    state: RwLock<PowerState>,
}

impl PowerCore {
    pub fn new(config: &PowerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        debug!(
            sums = ?config.sums,
            window = config.window,
            decay = ?config.decay,
            "created power core"
        );
        Ok(Self {
            state: RwLock::new(PowerState::new(config)),
        })
    }

    /// Consume one observation
    pub fn push(&self, x: f64) -> Result<(), StatsError> {
        self.state.write().push(x)
    }

    /// `Σ x^k` over the observations in scope
    pub fn sum(&self, k: i32) -> Result<f64, StatsError> {
        self.state.read().sum(k)
    }

    pub fn min(&self) -> Result<f64, StatsError> {
        self.state.read().min()
    }

    pub fn max(&self) -> Result<f64, StatsError> {
        self.state.read().max()
    }

    /// Acquire the shared lock for several reads
    pub fn read(&self) -> PowerReadGuard<'_> {
        self.state.read()
    }

    /// Acquire the exclusive lock for a read-then-write sequence
    pub fn write(&self) -> PowerWriteGuard<'_> {
        self.state.write()
    }
}

impl Engine for PowerCore {
    type Config = PowerConfig;

    fn from_config(config: &PowerConfig) -> Result<Self, ConfigError> {
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

impl Reader<PowerCore> {
    /// Acquire the shared lock for several reads
    pub fn read(&self) -> PowerReadGuard<'_> {
        self.engine().read()
    }

    pub fn sum(&self, k: i32) -> Result<f64, StatsError> {
        self.engine().sum(k)
    }

    pub fn min(&self) -> Result<f64, StatsError> {
        self.engine().min()
    }

    pub fn max(&self) -> Result<f64, StatsError> {
        self.engine().max()
    }
}

/// Accumulators behind a [`PowerCore`]'s lock
#[derive(Debug)]
pub struct PowerState {
    /// Tracked powers, ascending
    orders: Vec<i32>,
    /// `sums[i]` belongs to `orders[i]`
    sums: Vec<f64>,
    min: f64,
    max: f64,
    count: u64,
    seen: u64,
    window: usize,
    decay: Option<f64>,
    buffer: Option<Window<f64>>,
}

impl PowerState {
    fn new(config: &PowerConfig) -> Self {
        let orders: Vec<i32> = config.sums.iter().copied().collect();
        Self {
            sums: vec![0.0; orders.len()],
            orders,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            count: 0,
            seen: 0,
            window: config.window,
            decay: config.decay,
            buffer: NonZeroUsize::new(config.window).map(Window::new),
        }
    }

    /// Consume one observation, evicting the oldest first if the window is full
    ///
    /// Non-finite values are skipped. Zero is rejected without touching any
    /// state when a negative power is tracked.
    pub fn push(&mut self, x: f64) -> Result<(), StatsError> {
        if !x.is_finite() {
            trace!(x, "skipping non-finite value");
            return Ok(());
        }
        if x == 0.0 {
            if let Some(&k) = self.orders.first().filter(|&&k| k < 0) {
                return Err(StatsError::ZeroToNegativePower(k));
            }
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

        self.count += 1;
        // The first observation takes full weight
        let weight = match self.decay {
            Some(_) if self.count == 1 => Some(1.0),
            decay => decay,
        };
        for (sum, &k) in self.sums.iter_mut().zip(&self.orders) {
            *sum = match weight {
                None => *sum + x.powi(k),
                Some(w) => (1.0 - w) * *sum + w * x.powi(k),
            };
        }

        self.min = self.min.min(x);
        self.max = self.max.max(x);
        self.seen += 1;
        Ok(())
    }

    /// Reset to the zero state with a fresh window
    pub fn clear(&mut self) {
        debug!(seen = self.seen, "clearing power core");
        self.sums.iter_mut().for_each(|s| *s = 0.0);
        self.count = 0;
        self.seen = 0;
        self.min = f64::INFINITY;
        self.max = f64::NEG_INFINITY;
        self.buffer = NonZeroUsize::new(self.window).map(Window::new);
    }

    /// `Σ x^k` over the observations in scope
    ///
    /// Under decay this is the recency-weighted average of `x^k` instead.
    pub fn sum(&self, k: i32) -> Result<f64, StatsError> {
        if self.count == 0 {
            return Err(StatsError::NoValues);
        }
        self.orders
            .binary_search(&k)
            .map(|i| self.sums[i])
            .map_err(|_| StatsError::UntrackedPower(k))
    }

    /// Smallest value since the last clear
    pub fn min(&self) -> Result<f64, StatsError> {
        if self.seen == 0 {
            return Err(StatsError::NoValues);
        }
        Ok(self.min)
    }

    /// Largest value since the last clear
    pub fn max(&self) -> Result<f64, StatsError> {
        if self.seen == 0 {
            return Err(StatsError::NoValues);
        }
        Ok(self.max)
    }

    /// Observations pushed since construction or the last clear
    pub fn count(&self) -> u64 {
        self.seen
    }

    /// Observations currently contributing, at most the window size
    pub fn window_count(&self) -> u64 {
        self.count
    }

    fn remove(&mut self, x: f64) {
        self.count -= 1;
        if self.count == 0 {
            self.sums.iter_mut().for_each(|s| *s = 0.0);
            return;
        }
        for (sum, &k) in self.sums.iter_mut().zip(&self.orders) {
            *sum -= x.powi(k);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn core(config: PowerConfig) -> PowerCore {
        PowerCore::new(&config).unwrap()
    }

    /// Orders -1..=4 over a window of three, fed 1, 2, 3, 4, 8
    fn windowed() -> PowerCore {
        let c = core(PowerConfig::new().with_sums(-1..=4).with_window(3));
        for x in [1.0, 2.0, 3.0, 4.0, 8.0] {
            c.push(x).unwrap();
        }
        c
    }

    #[test]
    fn test_windowed_sums() {
        let c = windowed();
        let expected = [
            (-1, 17.0 / 24.0),
            (0, 3.0),
            (1, 15.0),
            (2, 89.0),
            (3, 603.0),
            (4, 4433.0),
        ];
        for (k, sum) in expected {
            assert!((c.sum(k).unwrap() - sum).abs() < EPS, "order {}", k);
        }
    }

    #[test]
    fn test_extremes_span_all_values() {
        let c = windowed();
        assert_eq!(c.min().unwrap(), 1.0);
        assert_eq!(c.max().unwrap(), 8.0);
    }

    #[test]
    fn test_counts() {
        let c = windowed();
        assert_eq!(c.count(), 5);
        assert_eq!(c.window_count(), 3);
    }

    #[test]
    fn test_clear() {
        let c = windowed();
        c.clear();
        assert_eq!(c.count(), 0);
        assert_eq!(c.window_count(), 0);
        assert_eq!(c.sum(1), Err(StatsError::NoValues));
        assert_eq!(c.min(), Err(StatsError::NoValues));

        c.push(-2.0).unwrap();
        assert_eq!(c.sum(1).unwrap(), -2.0);
        assert_eq!(c.min().unwrap(), -2.0);
        assert_eq!(c.max().unwrap(), -2.0);
    }

    #[test]
    fn test_errors() {
        let c = core(PowerConfig::new().with_sums([1]));
        assert_eq!(c.sum(1), Err(StatsError::NoValues));
        assert_eq!(c.max(), Err(StatsError::NoValues));

        c.push(1.0).unwrap();
        let err = c.sum(10).unwrap_err();
        assert_eq!(err.to_string(), "10 is not a tracked power sum");
    }

    #[test]
    fn test_zero_with_negative_power() {
        let c = core(PowerConfig::new().with_sums([-2, 1]));
        c.push(2.0).unwrap();
        assert_eq!(c.push(0.0), Err(StatsError::ZeroToNegativePower(-2)));
        assert_eq!(c.count(), 1);
        assert_eq!(c.min().unwrap(), 2.0);
        assert!((c.sum(-2).unwrap() - 0.25).abs() < EPS);

        // Without negative powers zero is an ordinary value
        let c = core(PowerConfig::new().with_sums([0, 1]));
        c.push(0.0).unwrap();
        assert_eq!(c.sum(0).unwrap(), 1.0);
    }

    #[test]
    fn test_non_finite_skipped() {
        let c = core(PowerConfig::new().with_sums([1]).with_window(2));
        c.push(1.0).unwrap();
        c.push(f64::NAN).unwrap();
        c.push(f64::INFINITY).unwrap();
        assert_eq!(c.count(), 1);
        assert_eq!(c.max().unwrap(), 1.0);
    }

    #[test]
    fn test_decayed_average() {
        let c = core(PowerConfig::new().with_sums([0, 1, 2]).with_decay(0.25));
        c.push(4.0).unwrap();
        assert_eq!(c.sum(1).unwrap(), 4.0);

        c.push(8.0).unwrap();
        // 0.75 * 4 + 0.25 * 8
        assert!((c.sum(1).unwrap() - 5.0).abs() < EPS);
        assert!((c.sum(2).unwrap() - 28.0).abs() < EPS);
        assert!((c.sum(0).unwrap() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_window_drains_to_zero() {
        let c = core(PowerConfig::new().with_sums([1, 3]).with_window(1));
        for x in [0.1, 7.0, -3.0] {
            c.push(x).unwrap();
            assert_eq!(c.sum(1).unwrap(), x);
            assert_eq!(c.sum(3).unwrap(), x.powi(3));
        }
    }
}
