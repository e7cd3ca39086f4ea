//! Derived univariate statistics
//!
//! Each metric is a thin formula over sums read from a shared
//! [`MomentCore`]. Metrics that combine several sums read them under one
//! shared lock so all of them describe the same point in the stream.

use core::fmt;

use super::config::MomentConfig;
use super::engine::{MomentCore, MomentState};
use crate::subscription::merge_configs;
use crate::traits::{sample_size, ConfigError, Metric, Reader, StatsError, Subscriber};

fn reader(reader: &Option<Reader<MomentCore>>) -> Result<&Reader<MomentCore>, StatsError> {
    reader.as_ref().ok_or(StatsError::NotSubscribed)
}

/// `k`th sample central moment, `S_k / (n - 1)`
///
/// Fails with [`StatsError::TooFewValues`] while fewer than two observations
/// are in scope.
#[derive(Clone, Debug)]
pub struct Moment {
    k: u32,
    window: usize,
    reader: Option<Reader<MomentCore>>,
}

impl Moment {
    /// Track the `k`th moment over the last `window` values (0 for all)
    pub fn new(k: u32, window: usize) -> Self {
        Self {
            k,
            window,
            reader: None,
        }
    }

    /// Sample variance
    pub fn variance(window: usize) -> Self {
        Self::new(2, window)
    }

    fn value_in(&self, state: &MomentState) -> Result<f64, StatsError> {
        let sum = state.sum(self.k)?;
        let count = sample_size(state.window_count())?;
        Ok(sum / (count - 1.0))
    }
}

impl Subscriber<MomentCore> for Moment {
    fn config(&self) -> MomentConfig {
        MomentConfig::new().with_sums([self.k]).with_window(self.window)
    }

    fn subscribe(&mut self, reader: Reader<MomentCore>) {
        self.reader = Some(reader);
    }
}

impl Metric for Moment {
    fn value(&self) -> Result<f64, StatsError> {
        let state = reader(&self.reader)?.read();
        self.value_in(&state)
    }
}

impl fmt::Display for Moment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "moment.Moment_{{k:{},window:{}}}", self.k, self.window)
    }
}

/// Sample standard deviation
///
/// Needs at least two observations in scope, like [`Moment`].
#[derive(Clone, Debug)]
pub struct Std {
    variance: Moment,
}

impl Std {
    /// Standard deviation over the last `window` values (0 for all)
    pub fn new(window: usize) -> Self {
        Self {
            variance: Moment::variance(window),
        }
    }
}

impl Subscriber<MomentCore> for Std {
    fn config(&self) -> MomentConfig {
        self.variance.config()
    }

    fn subscribe(&mut self, reader: Reader<MomentCore>) {
        self.variance.subscribe(reader);
    }
}

impl Metric for Std {
    fn value(&self) -> Result<f64, StatsError> {
        Ok(self.variance.value()?.sqrt())
    }
}

impl fmt::Display for Std {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "moment.Std_{{window:{}}}", self.variance.window)
    }
}

/// Population skewness, `(S3 / n) / (S2 / n)^1.5`
#[derive(Clone, Debug)]
pub struct Skewness {
    window: usize,
    reader: Option<Reader<MomentCore>>,
}

impl Skewness {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            reader: None,
        }
    }
}

impl Subscriber<MomentCore> for Skewness {
    fn config(&self) -> MomentConfig {
        MomentConfig::new().with_sums([2, 3]).with_window(self.window)
    }

    fn subscribe(&mut self, reader: Reader<MomentCore>) {
        self.reader = Some(reader);
    }
}

impl Metric for Skewness {
    fn value(&self) -> Result<f64, StatsError> {
        let state = reader(&self.reader)?.read();
        let count = state.window_count() as f64;
        let m2 = state.sum(2)? / count;
        let m3 = state.sum(3)? / count;
        Ok(m3 / m2.powf(1.5))
    }
}

impl fmt::Display for Skewness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "moment.Skewness_{{window:{}}}", self.window)
    }
}

/// Excess kurtosis, `n * S4 / S2^2 - 3`
///
/// Built from a second and a fourth [`Moment`]; their configs are merged so
/// the kurtosis asks its core for exactly what the two moments would.
#[derive(Clone, Debug)]
pub struct Kurtosis {
    variance: Moment,
    moment4: Moment,
    config: MomentConfig,
}

impl Kurtosis {
    pub fn new(window: usize) -> Result<Self, ConfigError> {
        let variance = Moment::variance(window);
        let moment4 = Moment::new(4, window);
        let config = merge_configs([variance.config(), moment4.config()])?;
        Ok(Self {
            variance,
            moment4,
            config,
        })
    }
}

impl Subscriber<MomentCore> for Kurtosis {
    fn config(&self) -> MomentConfig {
        self.config.clone()
    }

    fn subscribe(&mut self, reader: Reader<MomentCore>) {
        self.variance.subscribe(reader.clone());
        self.moment4.subscribe(reader);
    }
}

impl Metric for Kurtosis {
    fn value(&self) -> Result<f64, StatsError> {
        let state = reader(&self.variance.reader)?.read();
        let count = state.window_count() as f64;
        // Sample moments back to population moments
        let correction = (count - 1.0) / count;
        let variance = self.variance.value_in(&state)? * correction;
        let moment4 = self.moment4.value_in(&state)? * correction;
        Ok(moment4 / variance.powi(2) - 3.0)
    }
}

impl fmt::Display for Kurtosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "moment.Kurtosis_{{window:{}}}", self.variance.window)
    }
}
